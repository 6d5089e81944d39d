use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Starting,
    Idle,
    Busy,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Starting => "starting",
            WorkerStatus::Idle => "idle",
            WorkerStatus::Busy => "busy",
        }
    }
}

/// Written every 5 s with a 45 s TTL to `worker:heartbeat:<worker_id>`.
/// Consumers treat absence of the key as "worker gone."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHeartbeat {
    /// `hostname:pid:random`.
    pub worker_id: String,
    pub host: String,
    pub pid: u32,
    pub concurrency: usize,
    pub status: WorkerStatus,
    pub running_count: usize,
    /// Up to three current job ids (submission ids), for operator visibility.
    pub running_jobs: Vec<i64>,
    pub processed_total: u64,
    pub failed_total: u64,
    pub last_error: Option<String>,
    pub rss_bytes: u64,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkerHeartbeat {
    pub fn running_jobs_capped(jobs: &[i64]) -> Vec<i64> {
        jobs.iter().take(3).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_jobs_caps_at_three() {
        let jobs = vec![1, 2, 3, 4, 5];
        assert_eq!(WorkerHeartbeat::running_jobs_capped(&jobs), vec![1, 2, 3]);
    }
}
