use std::collections::HashMap;
use std::time::Duration;

use crate::error::SandboxError;
use crate::language::Language;
use crate::wire::{CmdSpec, FileSpec, RunRequest, RunResultWire};

/// `stdout`/`stderr` capture cap (§4.D), applied to both the compile and
/// run phases.
const STDOUT_CAP_BYTES: u64 = 10 * 1024 * 1024;
/// Sandboxes don't need more than a handful of processes for these
/// single-binary submissions; generous enough for the JVM's helper threads.
const PROC_LIMIT: u64 = 64;
/// Overall client timeout — the sandbox itself enforces the CPU limit; this
/// is a safety net against a sandbox that never replies at all (§5).
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxStatus {
    Accepted,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    OutputLimitExceeded,
    RuntimeError,
    /// Any other status string the sandbox reports (e.g. an internal
    /// error); the processor treats this the same as `RuntimeError` per
    /// the "anything else -> RE" mapping rule in §4.E.
    Other(String),
}

impl SandboxStatus {
    fn from_wire(s: &str) -> Self {
        match s {
            "Accepted" => SandboxStatus::Accepted,
            "Time Limit Exceeded" => SandboxStatus::TimeLimitExceeded,
            "Memory Limit Exceeded" => SandboxStatus::MemoryLimitExceeded,
            "Output Limit Exceeded" => SandboxStatus::OutputLimitExceeded,
            "Runtime Error" => SandboxStatus::RuntimeError,
            other => SandboxStatus::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: SandboxStatus,
    pub wall_ns: u64,
    pub mem_bytes: u64,
    pub exit_code: i32,
    pub error: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    fn from_wire(wire: RunResultWire) -> Self {
        Self {
            status: SandboxStatus::from_wire(&wire.status),
            wall_ns: wire.time,
            mem_bytes: wire.memory,
            exit_code: wire.exit_status,
            error: wire.error,
            stdout: wire.files.get("stdout").cloned().unwrap_or_default(),
            stderr: wire.files.get("stderr").cloned().unwrap_or_default(),
        }
    }

    fn succeeded(&self) -> bool {
        matches!(self.status, SandboxStatus::Accepted) && self.exit_code == 0
    }
}

#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub result: RunResult,
    pub artifact_key: String,
    /// Empty on failure (§4.D).
    pub artifact_id: String,
}

/// The single choke point through which every sandbox HTTP call flows; no
/// other module constructs a `reqwest::Client` against the sandbox.
#[derive(Clone)]
pub struct SandboxClient {
    http: reqwest::Client,
    base_url: String,
}

impl SandboxClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SandboxError> {
        let http = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(SandboxError::from)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn compile(
        &self,
        lang: Language,
        source: &[u8],
        compile_ms: u64,
        mem_mb: u64,
    ) -> Result<CompileOutcome, SandboxError> {
        let mut copy_in = HashMap::new();
        copy_in.insert(
            lang.source_filename().to_string(),
            FileSpec::Content {
                content: String::from_utf8_lossy(source).into_owned(),
            },
        );

        let cmd = CmdSpec {
            args: lang.compile_argv(),
            env: default_env(),
            files: stdio_specs(""),
            cpu_limit: ms_to_ns(compile_ms),
            memory_limit: mb_to_bytes(mem_mb),
            proc_limit: PROC_LIMIT,
            copy_in,
            copy_out_cached: vec![lang.artifact_filename().to_string()],
        };

        let wire = self.run_one(cmd).await?;
        let mut result = RunResult::from_wire(wire.0);
        let artifact_key = lang.artifact_filename().to_string();
        let artifact_id = if result.succeeded() {
            wire.1.get(&artifact_key).cloned().unwrap_or_default()
        } else {
            String::new()
        };
        if artifact_id.is_empty() {
            result.error = result.error.or_else(|| Some("compile produced no artifact".to_string()));
        }

        Ok(CompileOutcome {
            result,
            artifact_key,
            artifact_id,
        })
    }

    pub async fn run_with_artifact(
        &self,
        lang: Language,
        artifact_id: &str,
        stdin: &[u8],
        run_ms: u64,
        mem_mb: u64,
    ) -> Result<RunResult, SandboxError> {
        let mut copy_in = HashMap::new();
        copy_in.insert(
            lang.artifact_filename().to_string(),
            FileSpec::Cached {
                file_id: artifact_id.to_string(),
            },
        );

        let cmd = CmdSpec {
            args: lang.run_argv(),
            env: default_env(),
            files: stdio_specs(&String::from_utf8_lossy(stdin)),
            cpu_limit: ms_to_ns(run_ms),
            memory_limit: mb_to_bytes(mem_mb),
            proc_limit: PROC_LIMIT,
            copy_in,
            copy_out_cached: Vec::new(),
        };

        let (wire, _) = self.run_one(cmd).await?;
        Ok(RunResult::from_wire(wire))
    }

    /// Best-effort artifact cleanup; a 404 means it's already gone, which
    /// is the desired end state, not a failure.
    pub async fn remove_files(&self, ids: &[String]) {
        for id in ids {
            if id.is_empty() {
                continue;
            }
            let url = format!("{}/file/{id}", self.base_url);
            match self.http.delete(&url).send().await {
                Ok(resp) if resp.status().is_success() || resp.status().as_u16() == 404 => {}
                Ok(resp) => tracing::warn!(artifact_id = %id, status = %resp.status(), "sandbox file cleanup returned unexpected status"),
                Err(e) => tracing::warn!(artifact_id = %id, error = %e, "sandbox file cleanup failed"),
            }
        }
    }

    async fn run_one(
        &self,
        cmd: CmdSpec,
    ) -> Result<(RunResultWire, HashMap<String, String>), SandboxError> {
        let url = format!("{}/run", self.base_url);
        let body = RunRequest { cmd: vec![cmd] };

        let resp = self.http.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(SandboxError::Protocol(format!(
                "sandbox returned status {}",
                resp.status()
            )));
        }

        let mut results: Vec<RunResultWire> = resp.json().await?;
        let wire = results
            .pop()
            .ok_or_else(|| SandboxError::Protocol("sandbox returned an empty result array".into()))?;
        let file_ids = wire.file_ids.clone();
        Ok((wire, file_ids))
    }
}

fn default_env() -> Vec<String> {
    vec!["PATH=/usr/bin:/bin".to_string()]
}

fn stdio_specs(stdin: &str) -> Vec<FileSpec> {
    vec![
        FileSpec::Content {
            content: stdin.to_string(),
        },
        FileSpec::Collector {
            name: "stdout".to_string(),
            max: STDOUT_CAP_BYTES,
        },
        FileSpec::Collector {
            name: "stderr".to_string(),
            max: STDOUT_CAP_BYTES,
        },
    ]
}

fn ms_to_ns(ms: u64) -> u64 {
    ms * 1_000_000
}

fn mb_to_bytes(mb: u64) -> u64 {
    mb * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_with_zero_exit_is_success() {
        let r = RunResult {
            status: SandboxStatus::Accepted,
            wall_ns: 0,
            mem_bytes: 0,
            exit_code: 0,
            error: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(r.succeeded());
    }

    #[test]
    fn accepted_with_nonzero_exit_is_not_success() {
        let r = RunResult {
            status: SandboxStatus::Accepted,
            wall_ns: 0,
            mem_bytes: 0,
            exit_code: 1,
            error: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!r.succeeded());
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(ms_to_ns(5000), 5_000_000_000);
        assert_eq!(mb_to_bytes(256), 268_435_456);
    }
}
