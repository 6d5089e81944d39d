use chrono::Utc;
use oj_queue::{QueueBroker, QueueDepth, QueueError};

/// Point-in-time queue metrics for operator dashboards (§4.G), using
/// wall-clock "now" rather than Redis's own clock — depth reporting
/// doesn't need the sub-millisecond precision `reserve` does.
pub async fn read_queue_depth(
    broker: &QueueBroker,
    pending_key: &str,
    in_flight_key: &str,
) -> Result<QueueDepth, QueueError> {
    let now_ms = Utc::now().timestamp_millis();
    broker.depth(pending_key, in_flight_key, now_ms).await
}
