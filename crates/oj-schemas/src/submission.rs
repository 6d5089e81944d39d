use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Verdict;

/// `status` as stored on the submission row. The pair `(status, retry_count)`
/// is the sole authoritative job state — the queue is a hint, not the
/// source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Running => "running",
            SubmissionStatus::Succeeded => "succeeded",
            SubmissionStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => SubmissionStatus::Pending,
            "running" => SubmissionStatus::Running,
            "succeeded" => SubmissionStatus::Succeeded,
            "failed" => SubmissionStatus::Failed,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: i64,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub language: String,
    pub source_path: String,
    pub status: SubmissionStatus,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `SubmissionResult::details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionJudgeDetail {
    pub testcase_name: String,
    pub status: Verdict,
    pub time_ms: Option<i64>,
    pub memory_kb: Option<i64>,
}

/// 1:1 with [`Submission`]. Aggregate verdict plus the ordered per-case
/// detail list recorded while judging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub submission_id: i64,
    pub verdict: Verdict,
    pub time_ms: Option<i64>,
    pub memory_kb: Option<i64>,
    pub stdout_path: Option<String>,
    pub stderr_path: Option<String>,
    pub exit_code: Option<i32>,
    pub error_message: Option<String>,
    pub details: Vec<SubmissionJudgeDetail>,
}

impl SubmissionResult {
    /// Invariant I-4 (verdict monotonicity): `AC` iff every detail is `AC`.
    pub fn is_consistent(&self) -> bool {
        if self.details.is_empty() {
            return true;
        }
        let all_ac = self.details.iter().all(|d| d.status.is_accepted());
        self.verdict.is_accepted() == all_ac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(v: Verdict) -> SubmissionJudgeDetail {
        SubmissionJudgeDetail {
            testcase_name: "1".to_string(),
            status: v,
            time_ms: Some(1),
            memory_kb: Some(1),
        }
    }

    #[test]
    fn status_roundtrips() {
        for s in [
            SubmissionStatus::Pending,
            SubmissionStatus::Running,
            SubmissionStatus::Succeeded,
            SubmissionStatus::Failed,
        ] {
            assert_eq!(SubmissionStatus::from_str(s.as_str()), Some(s));
        }
    }

    #[test]
    fn consistent_when_all_ac_matches_ac_verdict() {
        let r = SubmissionResult {
            submission_id: 1,
            verdict: Verdict::Accepted,
            time_ms: Some(10),
            memory_kb: Some(100),
            stdout_path: None,
            stderr_path: None,
            exit_code: None,
            error_message: None,
            details: vec![detail(Verdict::Accepted), detail(Verdict::Accepted)],
        };
        assert!(r.is_consistent());
    }

    #[test]
    fn inconsistent_when_ac_verdict_has_failing_detail() {
        let r = SubmissionResult {
            submission_id: 1,
            verdict: Verdict::Accepted,
            time_ms: Some(10),
            memory_kb: Some(100),
            stdout_path: None,
            stderr_path: None,
            exit_code: None,
            error_message: None,
            details: vec![detail(Verdict::Accepted), detail(Verdict::WrongAnswer)],
        };
        assert!(!r.is_consistent());
    }
}
