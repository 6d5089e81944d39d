//! End-to-end judging scenarios (§8) driven against `Processor` with the
//! in-memory `oj-testkit` fakes standing in for Postgres and the sandbox.
//! No live database, Redis, or sandbox process required.

use std::sync::Arc;

use oj_sandbox::{CompileOutcome, RunResult, SandboxStatus};
use oj_schemas::{SubmissionStatus, Verdict};
use oj_storage::SubmissionStorage;
use oj_testkit::{
    a_plus_b_problem, a_plus_b_testcase, tight_time_limit_problem, FakeProblemStore,
    FakeSandboxClient, FakeSubmissionStore, AC_SOURCE_C, CE_SOURCE_CPP, TLE_SOURCE_C, WA_SOURCE_C,
};
use oj_worker::Processor;
use uuid::Uuid;

fn ok_compile() -> CompileOutcome {
    CompileOutcome {
        result: RunResult {
            status: SandboxStatus::Accepted,
            wall_ns: 50_000_000,
            mem_bytes: 4 * 1024 * 1024,
            exit_code: 0,
            error: None,
            stdout: String::new(),
            stderr: String::new(),
        },
        artifact_key: "main".to_string(),
        artifact_id: "artifact-1".to_string(),
    }
}

fn failed_compile() -> CompileOutcome {
    CompileOutcome {
        result: RunResult {
            status: SandboxStatus::Accepted,
            wall_ns: 10_000_000,
            mem_bytes: 1024,
            exit_code: 1,
            error: Some("compilation terminated.".to_string()),
            stdout: String::new(),
            stderr: "main.cpp:1:20: error: expected '}'".to_string(),
        },
        artifact_key: "main".to_string(),
        artifact_id: String::new(),
    }
}

fn run_with(status: SandboxStatus, exit_code: i32, stdout: &str, wall_ns: u64) -> RunResult {
    RunResult {
        status,
        wall_ns,
        mem_bytes: 2 * 1024 * 1024,
        exit_code,
        error: None,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// Wires one `Processor` against fresh in-memory fakes plus a scratch
/// submission directory, seeded with the A+B problem/testcase and one
/// pending submission whose language/source are already written to disk.
async fn harness(
    language: &str,
    source: &str,
) -> (
    Processor,
    Arc<FakeSubmissionStore>,
    Arc<FakeSandboxClient>,
    i64,
    tempfile::TempDir,
) {
    let problem = a_plus_b_problem();
    let testcase = a_plus_b_testcase(problem.id);

    let problems = Arc::new(FakeProblemStore::new());
    problems.insert(problem.clone(), vec![testcase]);

    let submissions = Arc::new(FakeSubmissionStore::new());
    let submission_id = submissions.insert_pending(Uuid::new_v4(), problem.id, language, "unused");

    let dir = tempfile::tempdir().unwrap();
    let storage = SubmissionStorage::new(dir.path());
    storage.write_source(submission_id, source.as_bytes()).await.unwrap();

    let sandbox = Arc::new(FakeSandboxClient::new());

    let processor = Processor::new(
        submissions.clone() as Arc<dyn oj_db::SubmissionRepo>,
        problems as Arc<dyn oj_db::ProblemRepo>,
        storage,
        sandbox.clone() as Arc<dyn oj_sandbox::SandboxRunner>,
        2000,
    );

    (processor, submissions, sandbox, submission_id, dir)
}

/// S1: a correct A+B solution is judged Accepted and the submission row
/// ends up `succeeded`.
#[tokio::test]
async fn s1_happy_path_is_accepted() {
    let (processor, submissions, sandbox, id, _dir) = harness("c", AC_SOURCE_C).await;
    sandbox.push_compile(Ok(ok_compile()));
    sandbox.push_run(Ok(run_with(SandboxStatus::Accepted, 0, "42\n", 5_000_000)));

    let verdict = processor.process(id).await.unwrap();

    assert_eq!(verdict, Verdict::Accepted);
    let row = submissions.get_submission(id).await.unwrap().unwrap();
    assert_eq!(row.status, SubmissionStatus::Succeeded);
    assert_eq!(sandbox.removed_files(), vec!["artifact-1".to_string()]);
}

/// S2: output differs from expected -> Wrong Answer, submission `failed`.
#[tokio::test]
async fn s2_wrong_output_is_wrong_answer() {
    let (processor, submissions, sandbox, id, _dir) = harness("c", WA_SOURCE_C).await;
    sandbox.push_compile(Ok(ok_compile()));
    sandbox.push_run(Ok(run_with(SandboxStatus::Accepted, 0, "41\n", 5_000_000)));

    let verdict = processor.process(id).await.unwrap();

    assert_eq!(verdict, Verdict::WrongAnswer);
    let row = submissions.get_submission(id).await.unwrap().unwrap();
    assert_eq!(row.status, SubmissionStatus::Failed);
}

/// S3: a compile failure short-circuits before any case runs and is
/// recorded with an empty detail list.
#[tokio::test]
async fn s3_compile_failure_is_compile_error() {
    let (processor, submissions, sandbox, id, _dir) = harness("cpp", CE_SOURCE_CPP).await;
    sandbox.push_compile(Ok(failed_compile()));

    let verdict = processor.process(id).await.unwrap();

    assert_eq!(verdict, Verdict::CompileError);
    let row = submissions.get_submission(id).await.unwrap().unwrap();
    assert_eq!(row.status, SubmissionStatus::Failed);
    assert!(submissions.list_judge_details(id).await.unwrap().is_empty());
    // A compile failure never produces an artifact worth cleaning up.
    assert!(sandbox.removed_files().is_empty());
}

/// S4: the sandbox reports a time limit breach on the tight-limit problem.
#[tokio::test]
async fn s4_time_limit_exceeded() {
    let problem = tight_time_limit_problem();
    let testcase = a_plus_b_testcase(problem.id);
    let problems = Arc::new(FakeProblemStore::new());
    problems.insert(problem.clone(), vec![testcase]);

    let submissions = Arc::new(FakeSubmissionStore::new());
    let submission_id =
        submissions.insert_pending(Uuid::new_v4(), problem.id, "c", "unused");

    let dir = tempfile::tempdir().unwrap();
    let storage = SubmissionStorage::new(dir.path());
    storage.write_source(submission_id, TLE_SOURCE_C.as_bytes()).await.unwrap();

    let sandbox = Arc::new(FakeSandboxClient::new());
    sandbox.push_compile(Ok(ok_compile()));
    sandbox.push_run(Ok(run_with(SandboxStatus::TimeLimitExceeded, 0, "", 1_000_000_000)));

    let processor = Processor::new(
        submissions.clone() as Arc<dyn oj_db::SubmissionRepo>,
        problems as Arc<dyn oj_db::ProblemRepo>,
        storage,
        sandbox as Arc<dyn oj_sandbox::SandboxRunner>,
        2000,
    );

    let verdict = processor.process(submission_id).await.unwrap();
    assert_eq!(verdict, Verdict::TimeLimitExceeded);
}

/// S5: a duplicate queue delivery for a submission already judged (no
/// longer `pending`) is rejected with `NotPending`, which the pool's
/// `classify` maps to an ack-and-drop rather than a retry.
#[tokio::test]
async fn s5_duplicate_delivery_is_not_pending() {
    let (processor, submissions, sandbox, id, _dir) = harness("c", AC_SOURCE_C).await;
    sandbox.push_compile(Ok(ok_compile()));
    sandbox.push_run(Ok(run_with(SandboxStatus::Accepted, 0, "42\n", 5_000_000)));
    processor.process(id).await.unwrap();

    let err = processor.process(id).await.unwrap_err();
    assert_eq!(oj_worker::classify(&err), oj_worker::RetryDecision::Ack);
}

/// S6: the sandbox is unreachable for every call on this submission (no
/// scripted responses at all) — processing aborts with a transport error
/// that the pool's retry policy treats as retryable, eventually escalating
/// to a poison-pill SystemError once retries are exhausted (covered at the
/// pool layer; this test only asserts the processor-level classification).
#[tokio::test]
async fn s6_sandbox_unavailable_is_retryable_transport_error() {
    let (processor, _submissions, _sandbox, id, _dir) = harness("c", AC_SOURCE_C).await;
    // No responses pushed: FakeSandboxClient reports transport errors.

    let err = processor.process(id).await.unwrap_err();
    assert_eq!(oj_worker::classify(&err), oj_worker::RetryDecision::Retry);
    assert!(matches!(err, oj_worker::ProcessError::Transport(_)));
}

#[tokio::test]
async fn unknown_language_is_missing_data_and_retryable() {
    let (processor, _submissions, _sandbox, id, _dir) = harness("cobol", AC_SOURCE_C).await;
    let err = processor.process(id).await.unwrap_err();
    assert!(matches!(err, oj_worker::ProcessError::MissingData(_)));
    assert_eq!(oj_worker::classify(&err), oj_worker::RetryDecision::Retry);
}
