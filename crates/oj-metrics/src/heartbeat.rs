use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use deadpool_redis::{Config, Runtime};
use oj_schemas::{WorkerHeartbeat, WorkerStatus};
use redis::AsyncCommands;
use tokio_util::sync::CancellationToken;

/// Redis key prefix from §6: `worker:heartbeat:<worker_id>`.
fn heartbeat_key(worker_id: &str) -> String {
    format!("worker:heartbeat:{worker_id}")
}

struct MutableState {
    status: WorkerStatus,
    running_jobs: Vec<i64>,
    processed_total: u64,
    failed_total: u64,
    last_error: Option<String>,
}

/// Single writer per worker process (§5). Workers call [`job_started`] and
/// [`job_finished`] around each job; a background task calls [`flush`] on a
/// fixed interval to refresh the Redis key before its TTL expires.
pub struct HeartbeatWriter {
    pool: deadpool_redis::Pool,
    worker_id: String,
    host: String,
    pid: u32,
    concurrency: usize,
    started_at: chrono::DateTime<Utc>,
    state: Mutex<MutableState>,
}

impl HeartbeatWriter {
    pub fn new(redis_url: &str, worker_id: impl Into<String>, concurrency: usize) -> anyhow::Result<Self> {
        let pool = Config::from_url(redis_url).create_pool(Some(Runtime::Tokio1))?;
        let host = hostname();
        Ok(Self {
            pool,
            worker_id: worker_id.into(),
            host,
            pid: std::process::id(),
            concurrency,
            started_at: Utc::now(),
            state: Mutex::new(MutableState {
                status: WorkerStatus::Starting,
                running_jobs: Vec::new(),
                processed_total: 0,
                failed_total: 0,
                last_error: None,
            }),
        })
    }

    pub fn job_started(&self, submission_id: i64) {
        let mut state = self.state.lock().unwrap();
        state.running_jobs.push(submission_id);
        state.status = WorkerStatus::Busy;
    }

    pub fn job_finished(&self, submission_id: i64, error: Option<String>) {
        let mut state = self.state.lock().unwrap();
        state.running_jobs.retain(|id| *id != submission_id);
        if error.is_some() {
            state.failed_total += 1;
            state.last_error = error;
        } else {
            state.processed_total += 1;
        }
        if state.running_jobs.is_empty() {
            state.status = WorkerStatus::Idle;
        }
    }

    /// Runs until `cancel` fires, refreshing the heartbeat key every
    /// `interval` with a TTL of `ttl` (§4.G: 5 s / 45 s by default).
    pub async fn run(&self, interval: Duration, ttl: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.flush(ttl).await {
                        tracing::warn!(error = %e, worker_id = %self.worker_id, "heartbeat flush failed");
                    }
                }
                _ = cancel.cancelled() => {
                    break;
                }
            }
        }
    }

    pub async fn flush(&self, ttl: Duration) -> anyhow::Result<()> {
        let snapshot = {
            let state = self.state.lock().unwrap();
            WorkerHeartbeat {
                worker_id: self.worker_id.clone(),
                host: self.host.clone(),
                pid: self.pid,
                concurrency: self.concurrency,
                status: state.status,
                running_count: state.running_jobs.len(),
                running_jobs: WorkerHeartbeat::running_jobs_capped(&state.running_jobs),
                processed_total: state.processed_total,
                failed_total: state.failed_total,
                last_error: state.last_error.clone(),
                rss_bytes: read_rss_bytes(),
                started_at: self.started_at,
                updated_at: Utc::now(),
            }
        };

        let payload = serde_json::to_string(&snapshot)?;
        let mut conn = self.pool.get().await?;
        let _: () = conn
            .set_ex(heartbeat_key(&self.worker_id), payload, ttl.as_secs())
            .await?;
        Ok(())
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-host".to_string())
}

/// Best-effort resident set size from `/proc/self/status`; `0` if
/// unavailable (non-Linux, or sandboxed without `/proc`).
fn read_rss_bytes() -> u64 {
    let Ok(contents) = std::fs::read_to_string("/proc/self/status") else {
        return 0;
    };
    for line in contents.lines() {
        if let Some(kb) = line.strip_prefix("VmRSS:") {
            if let Some(digits) = kb.trim().split_whitespace().next() {
                if let Ok(kb) = digits.parse::<u64>() {
                    return kb * 1024;
                }
            }
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_key_uses_worker_id() {
        assert_eq!(heartbeat_key("w-1"), "worker:heartbeat:w-1");
    }
}
