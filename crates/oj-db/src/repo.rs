//! Object-safe boundaries over the Submission Store and Problem Store
//! (§4.B/§4.C), so the worker pipeline can be driven against in-memory
//! fakes in hermetic scenario tests instead of a live Postgres.
//!
//! [`SubmissionStore`] and [`ProblemStore`] implement these by delegating
//! to their own inherent methods of the same name — Rust's method
//! resolution prefers the inherent method on `self.foo(...)` calls, so the
//! delegation below can't recurse.

use async_trait::async_trait;
use uuid::Uuid;

use oj_schemas::{Problem, Submission, SubmissionJudgeDetail, SubmissionResult, SubmissionStatus, TestCase};

use crate::{AcquireError, ProblemStore, SubmissionStore};

#[async_trait]
pub trait SubmissionRepo: Send + Sync {
    async fn acquire_pending(&self, submission_id: i64) -> Result<Submission, AcquireError>;

    async fn save_result(
        &self,
        result: &SubmissionResult,
        final_status: SubmissionStatus,
    ) -> anyhow::Result<()>;

    async fn increment_retry(&self, submission_id: i64) -> anyhow::Result<i32>;

    async fn mark_status(&self, submission_id: i64, status: SubmissionStatus) -> anyhow::Result<()>;

    async fn get_submission(&self, submission_id: i64) -> anyhow::Result<Option<Submission>>;

    async fn list_judge_details(&self, submission_id: i64) -> anyhow::Result<Vec<SubmissionJudgeDetail>>;
}

#[async_trait]
pub trait ProblemRepo: Send + Sync {
    async fn find_detail(&self, problem_id: Uuid) -> anyhow::Result<Option<Problem>>;

    async fn list_testcases(&self, problem_id: Uuid) -> anyhow::Result<Vec<TestCase>>;
}

#[async_trait]
impl SubmissionRepo for SubmissionStore {
    async fn acquire_pending(&self, submission_id: i64) -> Result<Submission, AcquireError> {
        self.acquire_pending(submission_id).await
    }

    async fn save_result(
        &self,
        result: &SubmissionResult,
        final_status: SubmissionStatus,
    ) -> anyhow::Result<()> {
        self.save_result(result, final_status).await
    }

    async fn increment_retry(&self, submission_id: i64) -> anyhow::Result<i32> {
        self.increment_retry(submission_id).await
    }

    async fn mark_status(&self, submission_id: i64, status: SubmissionStatus) -> anyhow::Result<()> {
        self.mark_status(submission_id, status).await
    }

    async fn get_submission(&self, submission_id: i64) -> anyhow::Result<Option<Submission>> {
        self.get_submission(submission_id).await
    }

    async fn list_judge_details(&self, submission_id: i64) -> anyhow::Result<Vec<SubmissionJudgeDetail>> {
        self.list_judge_details(submission_id).await
    }
}

#[async_trait]
impl ProblemRepo for ProblemStore {
    async fn find_detail(&self, problem_id: Uuid) -> anyhow::Result<Option<Problem>> {
        self.find_detail(problem_id).await
    }

    async fn list_testcases(&self, problem_id: Uuid) -> anyhow::Result<Vec<TestCase>> {
        self.list_testcases(problem_id).await
    }
}
