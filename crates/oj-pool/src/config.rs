use std::time::Duration;

/// Everything the pool needs beyond its collaborators — queue key names and
/// the timing constants from §4.F / §6.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub concurrency: usize,
    pub pending_key: String,
    pub in_flight_key: String,
    pub visibility_timeout: Duration,
    pub reclaimer_interval: Duration,
    pub max_retries: i32,
}
