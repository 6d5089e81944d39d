//! Per-submission file layout under `SUBMISSION_DIR`.
//!
//! ```text
//! <submission_dir>/<submission_id>/source
//! <submission_dir>/<submission_id>/compile_stdout.txt
//! <submission_dir>/<submission_id>/compile_stderr.txt
//! <submission_dir>/<submission_id>/run_stdout.txt
//! <submission_dir>/<submission_id>/run_stderr.txt
//! ```
//!
//! The source file is written once at intake and is read-only from here on.
//! The four capture files are overwritten on every (re)try — a retried
//! submission's new first-failing-case snapshot replaces the old one, by
//! design (see DESIGN.md Open Question on retry snapshot overwrite).

use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct SubmissionStorage {
    root: PathBuf,
}

impl SubmissionStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn submission_dir(&self, submission_id: i64) -> PathBuf {
        self.root.join(submission_id.to_string())
    }

    pub fn source_path(&self, submission_id: i64) -> PathBuf {
        self.submission_dir(submission_id).join("source")
    }

    pub fn compile_stdout_path(&self, submission_id: i64) -> PathBuf {
        self.submission_dir(submission_id).join("compile_stdout.txt")
    }

    pub fn compile_stderr_path(&self, submission_id: i64) -> PathBuf {
        self.submission_dir(submission_id).join("compile_stderr.txt")
    }

    pub fn run_stdout_path(&self, submission_id: i64) -> PathBuf {
        self.submission_dir(submission_id).join("run_stdout.txt")
    }

    pub fn run_stderr_path(&self, submission_id: i64) -> PathBuf {
        self.submission_dir(submission_id).join("run_stderr.txt")
    }

    /// Intake path: persist the submitted source. Not on the judging hot
    /// path (the HTTP submission surface is out of core) but the worker's
    /// own tests need a way to seed a submission's source file.
    pub async fn write_source(&self, submission_id: i64, bytes: &[u8]) -> Result<()> {
        let dir = self.submission_dir(submission_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create submission dir {}", dir.display()))?;
        let path = self.source_path(submission_id);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("write source {}", path.display()))
    }

    pub async fn read_source(&self, submission_id: i64) -> Result<Vec<u8>> {
        let path = self.source_path(submission_id);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("read source {}", path.display()))
    }

    /// Snapshot the compile failure's stdout/stderr next to the source.
    /// Overwrites any prior snapshot for this submission id.
    pub async fn write_compile_failure(
        &self,
        submission_id: i64,
        stdout: &[u8],
        stderr: &[u8],
    ) -> Result<(PathBuf, PathBuf)> {
        let dir = self.submission_dir(submission_id);
        tokio::fs::create_dir_all(&dir).await?;
        let out = self.compile_stdout_path(submission_id);
        let err = self.compile_stderr_path(submission_id);
        tokio::fs::write(&out, stdout).await?;
        tokio::fs::write(&err, stderr).await?;
        Ok((out, err))
    }

    /// Snapshot the first-failing run case's stdout/stderr. Overwrites any
    /// prior snapshot for this submission id.
    pub async fn write_run_failure(
        &self,
        submission_id: i64,
        stdout: &[u8],
        stderr: &[u8],
    ) -> Result<(PathBuf, PathBuf)> {
        let dir = self.submission_dir(submission_id);
        tokio::fs::create_dir_all(&dir).await?;
        let out = self.run_stdout_path(submission_id);
        let err = self.run_stderr_path(submission_id);
        tokio::fs::write(&out, stdout).await?;
        tokio::fs::write(&err, stderr).await?;
        Ok((out, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_source_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SubmissionStorage::new(dir.path());
        storage.write_source(42, b"int main(){}").await.unwrap();
        let bytes = storage.read_source(42).await.unwrap();
        assert_eq!(bytes, b"int main(){}");
    }

    #[tokio::test]
    async fn retry_overwrites_prior_failure_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SubmissionStorage::new(dir.path());
        storage
            .write_run_failure(7, b"first attempt", b"err1")
            .await
            .unwrap();
        storage
            .write_run_failure(7, b"second attempt", b"err2")
            .await
            .unwrap();
        let stdout = tokio::fs::read(storage.run_stdout_path(7)).await.unwrap();
        assert_eq!(stdout, b"second attempt");
    }
}
