use std::sync::Arc;

use oj_db::{ProblemRepo, SubmissionRepo};
use oj_sandbox::{Language, SandboxRunner, SandboxStatus};
use oj_schemas::{SubmissionJudgeDetail, SubmissionResult, SubmissionStatus, Verdict};
use oj_storage::SubmissionStorage;

use crate::error::ProcessError;

/// Owns the verdict pipeline for one job (§4.E). Stateless beyond its
/// collaborators — safe to share across workers via `Clone`. Generic over
/// the repository/sandbox traits rather than the concrete Postgres/HTTP
/// types so scenario tests can substitute the `oj-testkit` fakes.
#[derive(Clone)]
pub struct Processor {
    submissions: Arc<dyn SubmissionRepo>,
    problems: Arc<dyn ProblemRepo>,
    storage: SubmissionStorage,
    sandbox: Arc<dyn SandboxRunner>,
    compile_time_limit_ms: u64,
}

impl Processor {
    pub fn new(
        submissions: Arc<dyn SubmissionRepo>,
        problems: Arc<dyn ProblemRepo>,
        storage: SubmissionStorage,
        sandbox: Arc<dyn SandboxRunner>,
        compile_time_limit_ms: u64,
    ) -> Self {
        Self {
            submissions,
            problems,
            storage,
            sandbox,
            compile_time_limit_ms,
        }
    }

    /// Runs steps 2-8 of the algorithm for `submission_id` (step 1, parsing
    /// the raw queue payload, is the pool's job — it never reaches here).
    /// Returns the final verdict on success; `Err(ProcessError::NotPending)`
    /// signals a duplicate delivery the caller should ack and drop.
    #[tracing::instrument(name = "process_submission", skip(self), fields(submission_id))]
    pub async fn process(&self, submission_id: i64) -> Result<Verdict, ProcessError> {
        let submission = self.submissions.acquire_pending(submission_id).await?;

        let source = self
            .storage
            .read_source(submission_id)
            .await
            .map_err(|e| ProcessError::MissingData(format!("source file: {e}")))?;

        let lang = Language::parse(&submission.language)
            .ok_or_else(|| ProcessError::MissingData(format!("unknown language: {}", submission.language)))?;

        let problem = self
            .problems
            .find_detail(submission.problem_id)
            .await
            .map_err(|e| ProcessError::Transport(e.to_string()))?
            .ok_or_else(|| ProcessError::MissingData("problem not found".to_string()))?;

        let testcases = self
            .problems
            .list_testcases(submission.problem_id)
            .await
            .map_err(|e| ProcessError::Transport(e.to_string()))?;
        if testcases.is_empty() {
            return Err(ProcessError::MissingData("problem has no test cases".to_string()));
        }

        let mem_mb = (problem.memory_limit_kb / 1024).max(1) as u64;

        let compiled = self
            .sandbox
            .compile(lang, &source, self.compile_time_limit_ms, mem_mb)
            .await?;

        let artifact_id = if !compiled.result.succeeded_compile() {
            let (stdout_path, stderr_path) = self
                .storage
                .write_compile_failure(
                    submission_id,
                    compiled.result.stdout.as_bytes(),
                    compiled.result.stderr.as_bytes(),
                )
                .await
                .map_err(ProcessError::from)?;

            let result = SubmissionResult {
                submission_id,
                verdict: Verdict::CompileError,
                time_ms: None,
                memory_kb: None,
                stdout_path: Some(stdout_path.display().to_string()),
                stderr_path: Some(stderr_path.display().to_string()),
                exit_code: Some(compiled.result.exit_code),
                error_message: compiled.result.error.clone(),
                details: Vec::new(),
            };
            self.submissions
                .save_result(&result, SubmissionStatus::Failed)
                .await
                .map_err(ProcessError::from)?;
            return Ok(Verdict::CompileError);
        } else {
            compiled.artifact_id
        };

        let outcome = self
            .run_all_cases(submission_id, lang, &artifact_id, &testcases, &problem)
            .await;

        self.sandbox.remove_files(&[artifact_id]).await;

        let (result, final_status) = outcome?;
        let verdict = result.verdict;
        self.submissions
            .save_result(&result, final_status)
            .await
            .map_err(ProcessError::from)?;

        Ok(verdict)
    }

    async fn run_all_cases(
        &self,
        submission_id: i64,
        lang: Language,
        artifact_id: &str,
        testcases: &[oj_schemas::TestCase],
        problem: &oj_schemas::Problem,
    ) -> Result<(SubmissionResult, SubmissionStatus), ProcessError> {
        let mem_mb = (problem.memory_limit_kb / 1024).max(1) as u64;
        let mut details = Vec::with_capacity(testcases.len());
        let mut max_time_ms: Option<i64> = None;
        let mut max_memory_kb: Option<i64> = None;
        let mut failing: Option<(Verdict, i32, Option<String>)> = None;

        for case in testcases {
            let run = self
                .sandbox
                .run_with_artifact(
                    lang,
                    artifact_id,
                    case.input_text.as_bytes(),
                    problem.time_limit_ms as u64,
                    mem_mb,
                )
                .await?;

            let time_ms = (run.wall_ns / 1_000_000) as i64;
            let memory_kb = (run.mem_bytes / 1024) as i64;
            max_time_ms = Some(max_time_ms.map_or(time_ms, |m| m.max(time_ms)));
            max_memory_kb = Some(max_memory_kb.map_or(memory_kb, |m| m.max(memory_kb)));

            let mut verdict = map_sandbox_status(&run.status, run.exit_code);
            if verdict == Verdict::Accepted
                && !checker_ok(problem, &run.stdout, &case.expected_output_text)
            {
                verdict = Verdict::WrongAnswer;
            }

            details.push(SubmissionJudgeDetail {
                testcase_name: case.name.clone(),
                status: verdict,
                time_ms: Some(time_ms),
                memory_kb: Some(memory_kb),
            });

            if verdict != Verdict::Accepted {
                self.storage
                    .write_run_failure(submission_id, run.stdout.as_bytes(), run.stderr.as_bytes())
                    .await
                    .map_err(ProcessError::from)?;
                failing = Some((verdict, run.exit_code, run.error.clone()));
                break;
            }
        }

        let (final_verdict, exit_code, error_message, stdout_path, stderr_path) = match failing {
            Some((verdict, exit_code, error_message)) => (
                verdict,
                Some(exit_code),
                error_message,
                Some(self.storage.run_stdout_path(submission_id).display().to_string()),
                Some(self.storage.run_stderr_path(submission_id).display().to_string()),
            ),
            None => (Verdict::Accepted, Some(0), None, None, None),
        };

        let final_status = if final_verdict.is_accepted() {
            SubmissionStatus::Succeeded
        } else {
            SubmissionStatus::Failed
        };

        let result = SubmissionResult {
            submission_id,
            verdict: final_verdict,
            time_ms: max_time_ms,
            memory_kb: max_memory_kb,
            stdout_path,
            stderr_path,
            exit_code,
            error_message,
            details,
        };

        Ok((result, final_status))
    }
}

fn map_sandbox_status(status: &SandboxStatus, exit_code: i32) -> Verdict {
    match status {
        SandboxStatus::Accepted if exit_code == 0 => Verdict::Accepted,
        SandboxStatus::Accepted => Verdict::RuntimeError,
        SandboxStatus::TimeLimitExceeded => Verdict::TimeLimitExceeded,
        SandboxStatus::MemoryLimitExceeded => Verdict::MemoryLimitExceeded,
        SandboxStatus::OutputLimitExceeded => Verdict::OutputLimitExceeded,
        SandboxStatus::RuntimeError => Verdict::RuntimeError,
        SandboxStatus::Other(_) => Verdict::RuntimeError,
    }
}

fn checker_ok(problem: &oj_schemas::Problem, actual: &str, expected: &str) -> bool {
    crate::checker::check(problem.checker_type, problem.checker_eps, actual, expected)
}

trait CompileSuccess {
    fn succeeded_compile(&self) -> bool;
}

impl CompileSuccess for oj_sandbox::RunResult {
    fn succeeded_compile(&self) -> bool {
        matches!(self.status, SandboxStatus::Accepted) && self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_nonzero_exit_maps_to_runtime_error() {
        assert_eq!(map_sandbox_status(&SandboxStatus::Accepted, 1), Verdict::RuntimeError);
    }

    #[test]
    fn accepted_zero_exit_maps_to_accepted() {
        assert_eq!(map_sandbox_status(&SandboxStatus::Accepted, 0), Verdict::Accepted);
    }

    #[test]
    fn each_limit_status_maps_to_its_own_verdict() {
        assert_eq!(map_sandbox_status(&SandboxStatus::TimeLimitExceeded, 0), Verdict::TimeLimitExceeded);
        assert_eq!(map_sandbox_status(&SandboxStatus::MemoryLimitExceeded, 0), Verdict::MemoryLimitExceeded);
        assert_eq!(map_sandbox_status(&SandboxStatus::OutputLimitExceeded, 0), Verdict::OutputLimitExceeded);
    }

    #[test]
    fn unrecognized_status_falls_back_to_runtime_error() {
        assert_eq!(
            map_sandbox_status(&SandboxStatus::Other("Nonzero Exit Status".to_string()), 0),
            Verdict::RuntimeError
        );
    }
}
