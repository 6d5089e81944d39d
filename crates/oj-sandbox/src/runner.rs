use async_trait::async_trait;

use crate::client::{CompileOutcome, RunResult, SandboxClient};
use crate::error::SandboxError;
use crate::language::Language;

/// Object-safe boundary over the sandbox's compile/run/cleanup operations
/// (§4.D). [`SandboxClient`] is the production implementation; test code
/// substitutes a scriptable fake so the worker pipeline can be driven
/// hermetically, without a live sandbox process.
#[async_trait]
pub trait SandboxRunner: Send + Sync {
    async fn compile(
        &self,
        lang: Language,
        source: &[u8],
        compile_ms: u64,
        mem_mb: u64,
    ) -> Result<CompileOutcome, SandboxError>;

    async fn run_with_artifact(
        &self,
        lang: Language,
        artifact_id: &str,
        stdin: &[u8],
        run_ms: u64,
        mem_mb: u64,
    ) -> Result<RunResult, SandboxError>;

    async fn remove_files(&self, ids: &[String]);
}

#[async_trait]
impl SandboxRunner for SandboxClient {
    async fn compile(
        &self,
        lang: Language,
        source: &[u8],
        compile_ms: u64,
        mem_mb: u64,
    ) -> Result<CompileOutcome, SandboxError> {
        SandboxClient::compile(self, lang, source, compile_ms, mem_mb).await
    }

    async fn run_with_artifact(
        &self,
        lang: Language,
        artifact_id: &str,
        stdin: &[u8],
        run_ms: u64,
        mem_mb: u64,
    ) -> Result<RunResult, SandboxError> {
        SandboxClient::run_with_artifact(self, lang, artifact_id, stdin, run_ms, mem_mb).await
    }

    async fn remove_files(&self, ids: &[String]) {
        SandboxClient::remove_files(self, ids).await
    }
}
