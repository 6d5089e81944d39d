//! In-memory stand-ins for [`oj_db::SubmissionStore`] and
//! [`oj_db::ProblemStore`], implementing the same [`SubmissionRepo`] /
//! [`ProblemRepo`] traits the worker pipeline is generic over. Lets the
//! §8 end-to-end scenarios run against `Processor` without a live
//! Postgres, the same way [`crate::FakeSandboxClient`] stands in for the
//! sandbox and [`crate::FakeQueueBroker`] for Redis.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use oj_db::{AcquireError, ProblemRepo, SubmissionRepo};
use oj_schemas::{Problem, Submission, SubmissionJudgeDetail, SubmissionResult, SubmissionStatus, TestCase};

struct StoredSubmission {
    submission: Submission,
    result: Option<SubmissionResult>,
}

/// Row-lock semantics are approximated with a single process-wide mutex:
/// `acquire_pending` holds the lock for its whole read-check-write, which
/// is enough to exercise invariant I-1 (at-most-once) in a single-process
/// scenario test even though it isn't a real multi-connection row lock.
#[derive(Default)]
pub struct FakeSubmissionStore {
    rows: Mutex<HashMap<i64, StoredSubmission>>,
    next_id: Mutex<i64>,
}

impl FakeSubmissionStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }

    /// Intake helper mirroring `SubmissionStore::insert_pending`.
    pub fn insert_pending(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        language: &str,
        source_path: &str,
    ) -> i64 {
        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;
        let now = Utc::now();
        self.rows.lock().unwrap().insert(
            id,
            StoredSubmission {
                submission: Submission {
                    submission_id: id,
                    user_id,
                    problem_id,
                    language: language.to_string(),
                    source_path: source_path.to_string(),
                    status: SubmissionStatus::Pending,
                    retry_count: 0,
                    created_at: now,
                    updated_at: now,
                },
                result: None,
            },
        );
        id
    }

    pub fn result_of(&self, submission_id: i64) -> Option<SubmissionResult> {
        self.rows
            .lock()
            .unwrap()
            .get(&submission_id)
            .and_then(|row| row.result.clone())
    }
}

#[async_trait]
impl SubmissionRepo for FakeSubmissionStore {
    async fn acquire_pending(&self, submission_id: i64) -> Result<Submission, AcquireError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(&submission_id).ok_or(AcquireError::NotPending)?;
        if row.submission.status != SubmissionStatus::Pending {
            return Err(AcquireError::NotPending);
        }
        row.submission.status = SubmissionStatus::Running;
        row.submission.updated_at = Utc::now();
        Ok(row.submission.clone())
    }

    async fn save_result(
        &self,
        result: &SubmissionResult,
        final_status: SubmissionStatus,
    ) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&result.submission_id)
            .ok_or_else(|| anyhow::anyhow!("unknown submission {}", result.submission_id))?;
        row.submission.status = final_status;
        row.submission.updated_at = Utc::now();
        row.result = Some(result.clone());
        Ok(())
    }

    async fn increment_retry(&self, submission_id: i64) -> anyhow::Result<i32> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&submission_id)
            .ok_or_else(|| anyhow::anyhow!("unknown submission {submission_id}"))?;
        row.submission.retry_count += 1;
        Ok(row.submission.retry_count)
    }

    async fn mark_status(&self, submission_id: i64, status: SubmissionStatus) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&submission_id)
            .ok_or_else(|| anyhow::anyhow!("unknown submission {submission_id}"))?;
        row.submission.status = status;
        row.submission.updated_at = Utc::now();
        Ok(())
    }

    async fn get_submission(&self, submission_id: i64) -> anyhow::Result<Option<Submission>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&submission_id)
            .map(|row| row.submission.clone()))
    }

    async fn list_judge_details(&self, submission_id: i64) -> anyhow::Result<Vec<SubmissionJudgeDetail>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&submission_id)
            .and_then(|row| row.result.as_ref())
            .map(|result| result.details.clone())
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeProblemStore {
    problems: Mutex<HashMap<Uuid, (Problem, Vec<TestCase>)>>,
}

impl FakeProblemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, problem: Problem, testcases: Vec<TestCase>) {
        self.problems.lock().unwrap().insert(problem.id, (problem, testcases));
    }
}

#[async_trait]
impl ProblemRepo for FakeProblemStore {
    async fn find_detail(&self, problem_id: Uuid) -> anyhow::Result<Option<Problem>> {
        Ok(self
            .problems
            .lock()
            .unwrap()
            .get(&problem_id)
            .map(|(problem, _)| problem.clone()))
    }

    async fn list_testcases(&self, problem_id: Uuid) -> anyhow::Result<Vec<TestCase>> {
        Ok(self
            .problems
            .lock()
            .unwrap()
            .get(&problem_id)
            .map(|(_, testcases)| testcases.clone())
            .unwrap_or_default())
    }
}
