/// Errors surfaced by [`crate::SandboxClient`]. A non-zero exit status or a
/// non-`Accepted` sandbox status is not an error — those are legitimate
/// [`crate::RunResult`] values the processor interprets into a verdict.
/// This type exists for failures *talking to* the sandbox.
#[derive(Debug)]
pub enum SandboxError {
    /// Connect refused, timeout, or any `reqwest` transport failure.
    Transport(String),
    /// The sandbox replied 2xx but the body didn't match the contract, or
    /// replied with an unexpected status code.
    Protocol(String),
}

impl std::fmt::Display for SandboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxError::Transport(msg) => write!(f, "sandbox transport error: {msg}"),
            SandboxError::Protocol(msg) => write!(f, "sandbox protocol error: {msg}"),
        }
    }
}

impl std::error::Error for SandboxError {}

impl From<reqwest::Error> for SandboxError {
    fn from(e: reqwest::Error) -> Self {
        SandboxError::Transport(e.to_string())
    }
}
