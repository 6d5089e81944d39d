//! Scriptable double for [`oj_sandbox::SandboxRunner`], for driving the
//! worker pipeline's compile/run outcomes without a live sandbox process.
//! Responses are consumed in call order (FIFO); an empty script on either
//! queue simulates "sandbox unavailable" (S6's poison pill).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use oj_sandbox::{CompileOutcome, Language, RunResult, SandboxError, SandboxRunner};

#[derive(Default)]
pub struct FakeSandboxClient {
    compile_responses: Mutex<VecDeque<Result<CompileOutcome, SandboxError>>>,
    run_responses: Mutex<VecDeque<Result<RunResult, SandboxError>>>,
    removed_files: Mutex<Vec<String>>,
}

impl FakeSandboxClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_compile(&self, outcome: Result<CompileOutcome, SandboxError>) {
        self.compile_responses.lock().unwrap().push_back(outcome);
    }

    pub fn push_run(&self, outcome: Result<RunResult, SandboxError>) {
        self.run_responses.lock().unwrap().push_back(outcome);
    }

    /// Artifact ids passed to `remove_files`, in call order — lets a test
    /// assert the compiled artifact was cleaned up after judging.
    pub fn removed_files(&self) -> Vec<String> {
        self.removed_files.lock().unwrap().clone()
    }
}

#[async_trait]
impl SandboxRunner for FakeSandboxClient {
    async fn compile(
        &self,
        _lang: Language,
        _source: &[u8],
        _compile_ms: u64,
        _mem_mb: u64,
    ) -> Result<CompileOutcome, SandboxError> {
        self.compile_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SandboxError::Transport("sandbox unreachable".to_string())))
    }

    async fn run_with_artifact(
        &self,
        _lang: Language,
        _artifact_id: &str,
        _stdin: &[u8],
        _run_ms: u64,
        _mem_mb: u64,
    ) -> Result<RunResult, SandboxError> {
        self.run_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SandboxError::Transport("sandbox unreachable".to_string())))
    }

    async fn remove_files(&self, ids: &[String]) {
        self.removed_files.lock().unwrap().extend(ids.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oj_sandbox::SandboxStatus;

    fn ok_result() -> RunResult {
        RunResult {
            status: SandboxStatus::Accepted,
            wall_ns: 1_000_000,
            mem_bytes: 1024,
            exit_code: 0,
            error: None,
            stdout: "42\n".to_string(),
            stderr: String::new(),
        }
    }

    #[tokio::test]
    async fn run_responses_are_consumed_fifo() {
        let fake = FakeSandboxClient::new();
        let mut first = ok_result();
        first.stdout = "first\n".to_string();
        let mut second = ok_result();
        second.stdout = "second\n".to_string();
        fake.push_run(Ok(first));
        fake.push_run(Ok(second));

        let r1 = fake.run_with_artifact(Language::C, "artifact", b"", 1000, 256).await.unwrap();
        let r2 = fake.run_with_artifact(Language::C, "artifact", b"", 1000, 256).await.unwrap();
        assert_eq!(r1.stdout, "first\n");
        assert_eq!(r2.stdout, "second\n");
    }

    #[tokio::test]
    async fn exhausted_script_reports_transport_error() {
        let fake = FakeSandboxClient::new();
        let err = fake
            .run_with_artifact(Language::C, "artifact", b"", 1000, 256)
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::Transport(_)));
    }

    #[tokio::test]
    async fn remove_files_records_ids() {
        let fake = FakeSandboxClient::new();
        fake.remove_files(&["main".to_string()]).await;
        assert_eq!(fake.removed_files(), vec!["main".to_string()]);
    }
}
