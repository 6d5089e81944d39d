use std::sync::Arc;
use std::time::Duration;

use oj_db::SubmissionRepo;
use oj_metrics::HeartbeatWriter;
use oj_queue::QueueRunner;
use oj_schemas::{SubmissionResult, SubmissionStatus, Verdict};
use oj_worker::{classify, ProcessError, Processor, RetryDecision};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::reclaimer;

/// Empty-queue backoff between reserve attempts (§4.F state diagram).
const EMPTY_QUEUE_BACKOFF: Duration = Duration::from_millis(100);

/// N cooperating workers plus a reclaimer, all driven by one cancellation
/// token (§4.F, §5). `Arc<WorkerPool>` is cloned into each spawned task
/// rather than each task owning a signal handler of its own.
pub struct WorkerPool {
    processor: Processor,
    broker: Arc<dyn QueueRunner>,
    submissions: Arc<dyn SubmissionRepo>,
    heartbeat: Arc<HeartbeatWriter>,
    config: PoolConfig,
}

impl WorkerPool {
    pub fn new(
        processor: Processor,
        broker: Arc<dyn QueueRunner>,
        submissions: Arc<dyn SubmissionRepo>,
        heartbeat: Arc<HeartbeatWriter>,
        config: PoolConfig,
    ) -> Self {
        Self {
            processor,
            broker,
            submissions,
            heartbeat,
            config,
        }
    }

    /// Spawns `config.concurrency` worker tasks and one reclaimer task,
    /// all cooperating through the cancellation token in `cancel`.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(self.config.concurrency + 1);

        for idx in 0..self.config.concurrency {
            let pool = Arc::clone(&self);
            let token = cancel.clone();
            handles.push(tokio::spawn(async move { pool.run_worker(idx, token).await }));
        }

        let reclaimer_handle = tokio::spawn(reclaimer::run(
            self.broker.clone(),
            self.submissions.clone(),
            self.config.clone(),
            cancel,
        ));
        handles.push(reclaimer_handle);

        handles
    }

    async fn run_worker(&self, idx: usize, cancel: CancellationToken) {
        tracing::info!(worker_idx = idx, "worker starting");
        loop {
            let reserved = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                res = self.broker.reserve(
                    &self.config.pending_key,
                    &self.config.in_flight_key,
                    self.config.visibility_timeout.as_millis() as u64,
                ) => res,
            };

            match reserved {
                Ok(Some(job)) => self.handle_job(job).await,
                Ok(None) => {
                    if self.sleep_or_cancel(&cancel).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(worker_idx = idx, error = %e, "reserve failed; backing off");
                    if self.sleep_or_cancel(&cancel).await {
                        break;
                    }
                }
            }
        }
        tracing::info!(worker_idx = idx, "worker stopped");
    }

    /// Returns `true` if cancellation won the race (caller should break).
    async fn sleep_or_cancel(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(EMPTY_QUEUE_BACKOFF) => false,
            _ = cancel.cancelled() => true,
        }
    }

    async fn handle_job(&self, job: String) {
        let submission_id: i64 = match job.parse() {
            Ok(id) => id,
            Err(_) => {
                tracing::warn!(job = %job, "malformed job payload; dropping");
                self.ack(&job).await;
                return;
            }
        };

        self.heartbeat.job_started(submission_id);
        let outcome = self.processor.process(submission_id).await;

        match outcome {
            Ok(verdict) => {
                tracing::info!(submission_id, verdict = %verdict, "submission judged");
                self.heartbeat.job_finished(submission_id, None);
                self.ack(&job).await;
            }
            Err(err) => {
                self.heartbeat.job_finished(submission_id, Some(err.to_string()));
                self.handle_failure(submission_id, &job, err).await;
            }
        }
    }

    /// Retry policy from §4.F / §9's `classify` design note.
    async fn handle_failure(&self, submission_id: i64, job: &str, err: ProcessError) {
        match classify(&err) {
            RetryDecision::Ack => {
                tracing::info!(submission_id, "duplicate delivery; dropping");
                self.ack(job).await;
            }
            RetryDecision::Retry => {
                let new_count = match self.submissions.increment_retry(submission_id).await {
                    Ok(n) => n,
                    Err(e) => {
                        // Leave the lease to expire; the reclaimer will pick
                        // this job back up and bump the counter itself.
                        tracing::error!(submission_id, error = %e, "failed to increment retry count");
                        return;
                    }
                };

                if new_count <= self.config.max_retries {
                    if let Err(e) = self
                        .submissions
                        .mark_status(submission_id, SubmissionStatus::Pending)
                        .await
                    {
                        tracing::error!(submission_id, error = %e, "failed to mark pending for retry");
                    }
                    if let Err(e) = self
                        .broker
                        .enqueue(&self.config.pending_key, &submission_id.to_string())
                        .await
                    {
                        tracing::error!(submission_id, error = %e, "failed to re-enqueue retry");
                    }
                } else {
                    self.poison_pill(submission_id, &err).await;
                }
                self.ack(job).await;
            }
            // classify() never directly returns PoisonPill — it's reached
            // only by exceeding max_retries above.
            RetryDecision::PoisonPill => unreachable!(),
        }
    }

    async fn poison_pill(&self, submission_id: i64, err: &ProcessError) {
        tracing::error!(submission_id, error = %err, "retry budget exhausted; persisting SE");
        let result = SubmissionResult {
            submission_id,
            verdict: Verdict::SystemError,
            time_ms: None,
            memory_kb: None,
            stdout_path: None,
            stderr_path: None,
            exit_code: None,
            error_message: Some(err.to_string()),
            details: Vec::new(),
        };
        if let Err(e) = self
            .submissions
            .save_result(&result, SubmissionStatus::Failed)
            .await
        {
            tracing::error!(submission_id, error = %e, "failed to persist poison-pill verdict");
        }
    }

    async fn ack(&self, job: &str) {
        if let Err(e) = self.broker.ack(&self.config.in_flight_key, job).await {
            tracing::warn!(job = %job, error = %e, "ack failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use oj_db::ProblemRepo;
    use oj_storage::SubmissionStorage;
    use oj_testkit::{FakeProblemStore, FakeQueueBroker, FakeSandboxClient, FakeSubmissionStore};
    use uuid::Uuid;

    use super::*;

    fn test_config() -> PoolConfig {
        PoolConfig {
            concurrency: 1,
            pending_key: "pending_submissions".to_string(),
            in_flight_key: "processing_submissions".to_string(),
            visibility_timeout: Duration::from_secs(30),
            reclaimer_interval: Duration::from_secs(15),
            max_retries: 2,
        }
    }

    /// Builds a `WorkerPool` over in-memory fakes. The `Processor` is never
    /// exercised by `handle_failure` itself, but `WorkerPool::new` requires
    /// one.
    fn test_pool(submissions: Arc<dyn SubmissionRepo>, max_retries: i32) -> (Arc<WorkerPool>, Arc<FakeQueueBroker>) {
        let problems: Arc<dyn ProblemRepo> = Arc::new(FakeProblemStore::new());
        let sandbox = Arc::new(FakeSandboxClient::new());
        let storage = SubmissionStorage::new(std::env::temp_dir());
        let processor = Processor::new(
            submissions.clone(),
            problems,
            storage,
            sandbox as Arc<dyn oj_sandbox::SandboxRunner>,
            2000,
        );

        let broker = Arc::new(FakeQueueBroker::new());
        let heartbeat = Arc::new(
            HeartbeatWriter::new("redis://127.0.0.1:1/0", "test-worker", 1).expect("lazy pool construction"),
        );
        let mut config = test_config();
        config.max_retries = max_retries;

        let pool = Arc::new(WorkerPool::new(
            processor,
            broker.clone() as Arc<dyn QueueRunner>,
            submissions,
            heartbeat,
            config,
        ));
        (pool, broker)
    }

    /// Drives `handle_failure` through `max_retries` retryable failures:
    /// each of the first `max_retries` should requeue the job and leave the
    /// submission `pending`; the one past the budget should persist a
    /// `SystemError` poison pill and leave it `failed`, never re-enqueued.
    #[tokio::test]
    async fn handle_failure_escalates_to_poison_pill_after_max_retries() {
        let submissions = Arc::new(FakeSubmissionStore::new());
        let submission_id = submissions.insert_pending(Uuid::new_v4(), Uuid::new_v4(), "c", "unused");
        let submissions_dyn: Arc<dyn SubmissionRepo> = submissions.clone();
        let (pool, broker) = test_pool(submissions_dyn, 2);

        let job = submission_id.to_string();
        for attempt in 1..=2 {
            pool.handle_failure(
                submission_id,
                &job,
                ProcessError::Transport("sandbox unreachable".to_string()),
            )
            .await;

            let row = submissions.get_submission(submission_id).await.unwrap().unwrap();
            assert_eq!(row.status, SubmissionStatus::Pending, "attempt {attempt}");
            assert_eq!(row.retry_count, attempt, "attempt {attempt}");
            assert!(submissions.result_of(submission_id).is_none(), "attempt {attempt}");
        }
        assert_eq!(broker.pending_depth(), 2, "each retry should re-enqueue the job");

        pool.handle_failure(
            submission_id,
            &job,
            ProcessError::Transport("sandbox unreachable".to_string()),
        )
        .await;

        let row = submissions.get_submission(submission_id).await.unwrap().unwrap();
        assert_eq!(row.status, SubmissionStatus::Failed);
        let result = submissions.result_of(submission_id).expect("poison pill result persisted");
        assert_eq!(result.verdict, Verdict::SystemError);
        // The exhausted attempt is acked, not re-enqueued.
        assert_eq!(broker.pending_depth(), 2);
    }

    /// `NotPending` (a duplicate delivery) never touches the retry counter
    /// or the submission store at all — just an ack.
    #[tokio::test]
    async fn handle_failure_acks_not_pending_without_retry() {
        let submissions = Arc::new(FakeSubmissionStore::new());
        let submission_id = submissions.insert_pending(Uuid::new_v4(), Uuid::new_v4(), "c", "unused");
        let submissions_dyn: Arc<dyn SubmissionRepo> = submissions.clone();
        let (pool, _broker) = test_pool(submissions_dyn, 2);

        pool.handle_failure(submission_id, &submission_id.to_string(), ProcessError::NotPending)
            .await;

        let row = submissions.get_submission(submission_id).await.unwrap().unwrap();
        assert_eq!(row.status, SubmissionStatus::Pending);
        assert_eq!(row.retry_count, 0);
    }
}
