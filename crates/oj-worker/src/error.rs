/// Errors that can abort [`crate::Processor::process`] partway through a
/// job. Distinguishing `NotPending` from everything else is what lets
/// [`crate::classify`] tell a duplicate delivery apart from a failure worth
/// retrying.
#[derive(Debug)]
pub enum ProcessError {
    /// §4.E step 2: the row was not `pending` when acquired — a duplicate
    /// queue delivery. Ack and drop; never retried.
    NotPending,
    /// §4.E step 4: missing problem, empty test set, or missing source
    /// file. Treated as transient infra per §7 (may be a deploy race).
    MissingData(String),
    /// Sandbox or database transport failure.
    Transport(String),
    /// Any other I/O or database error not covered above.
    Other(anyhow::Error),
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessError::NotPending => write!(f, "submission was not pending"),
            ProcessError::MissingData(what) => write!(f, "missing data: {what}"),
            ProcessError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProcessError::Other(e) => write!(f, "processing error: {e}"),
        }
    }
}

impl std::error::Error for ProcessError {}

impl From<oj_db::AcquireError> for ProcessError {
    fn from(e: oj_db::AcquireError) -> Self {
        match e {
            oj_db::AcquireError::NotPending => ProcessError::NotPending,
            oj_db::AcquireError::Db(err) => ProcessError::Transport(err.to_string()),
        }
    }
}

impl From<oj_sandbox::SandboxError> for ProcessError {
    fn from(e: oj_sandbox::SandboxError) -> Self {
        ProcessError::Transport(e.to_string())
    }
}

impl From<anyhow::Error> for ProcessError {
    fn from(e: anyhow::Error) -> Self {
        ProcessError::Other(e)
    }
}

/// What the worker pool should do about a failed job (§4.F, §7, §9).
///
/// [`classify`] only ever produces `Ack` or `Retry` from the error alone —
/// escalating a `Retry` into a `PoisonPill` additionally requires the
/// current retry count, which only the pool's retry loop has. The variant
/// lives in this enum anyway so both decisions share one vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Ack,
    Retry,
    PoisonPill,
}

/// Single mapping function from processor error to retry decision — no
/// string matching scattered across call sites.
pub fn classify(err: &ProcessError) -> RetryDecision {
    match err {
        ProcessError::NotPending => RetryDecision::Ack,
        ProcessError::MissingData(_) | ProcessError::Transport(_) | ProcessError::Other(_) => {
            RetryDecision::Retry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_pending_classifies_as_ack() {
        assert_eq!(classify(&ProcessError::NotPending), RetryDecision::Ack);
    }

    #[test]
    fn missing_data_and_transport_classify_as_retry() {
        assert_eq!(
            classify(&ProcessError::MissingData("problem".into())),
            RetryDecision::Retry
        );
        assert_eq!(
            classify(&ProcessError::Transport("timeout".into())),
            RetryDecision::Retry
        );
    }
}
