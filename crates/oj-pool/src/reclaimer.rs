use std::sync::Arc;

use chrono::Utc;
use oj_db::SubmissionRepo;
use oj_queue::QueueRunner;
use oj_schemas::SubmissionStatus;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;

/// Runs on `config.reclaimer_interval` until `cancel` fires. Moves every
/// in-flight job whose lease has expired back onto the head of pending,
/// resets its submission row to `pending`, and bumps its retry counter —
/// the same counter the worker's own retry policy uses, so a job that
/// keeps crashing workers still eventually hits `max_retries` (§7, "Lease
/// expiry").
pub async fn run(
    broker: Arc<dyn QueueRunner>,
    submissions: Arc<dyn SubmissionRepo>,
    config: PoolConfig,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.reclaimer_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                reclaim_once(broker.as_ref(), submissions.as_ref(), &config).await;
            }
            _ = cancel.cancelled() => break,
        }
    }
}

async fn reclaim_once(broker: &dyn QueueRunner, submissions: &dyn SubmissionRepo, config: &PoolConfig) {
    let now_ms = Utc::now().timestamp_millis();
    let requeued = match broker
        .requeue_expired(&config.in_flight_key, &config.pending_key, now_ms)
        .await
    {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "reclaimer: requeue_expired failed");
            return;
        }
    };

    for value in requeued {
        let Ok(submission_id) = value.parse::<i64>() else {
            tracing::warn!(job = %value, "reclaimer: malformed job payload in in-flight set");
            continue;
        };
        tracing::info!(submission_id, "reclaiming expired lease");

        if let Err(e) = submissions.mark_status(submission_id, SubmissionStatus::Pending).await {
            tracing::error!(submission_id, error = %e, "reclaimer: failed to mark pending");
        }
        if let Err(e) = submissions.increment_retry(submission_id).await {
            tracing::error!(submission_id, error = %e, "reclaimer: failed to bump retry count");
        }
    }
}
