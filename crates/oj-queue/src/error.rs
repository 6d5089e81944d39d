/// Errors surfaced by [`crate::QueueBroker`]. The broker does not retry
/// internally — transport failures propagate to the caller (worker pool
/// or reclaimer), which decides whether to back off and retry.
#[derive(Debug)]
pub enum QueueError {
    /// Connection pool exhaustion, network failure, or a Redis-reported
    /// error talking to the server.
    Transport(String),
    /// The server replied with something the scripts above don't expect.
    Protocol(String),
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Transport(msg) => write!(f, "queue transport error: {msg}"),
            QueueError::Protocol(msg) => write!(f, "queue protocol error: {msg}"),
        }
    }
}

impl std::error::Error for QueueError {}

impl QueueError {
    pub(crate) fn from_redis(e: redis::RedisError) -> Self {
        QueueError::Transport(e.to_string())
    }
}
