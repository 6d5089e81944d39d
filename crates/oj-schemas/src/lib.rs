//! Shared data types for the submission execution core.
//!
//! Every crate in the workspace that crosses a module boundary (queue,
//! storage, sandbox, worker) speaks these types. Keeping them in one leaf
//! crate with no internal dependencies means the dependency graph between
//! `oj-queue`, `oj-db`, `oj-sandbox`, and `oj-worker` stays a tree.

mod heartbeat;
mod problem;
mod submission;
mod verdict;

pub use heartbeat::{WorkerHeartbeat, WorkerStatus};
pub use problem::{CheckerType, Problem, TestCase};
pub use submission::{
    Submission, SubmissionJudgeDetail, SubmissionResult, SubmissionStatus,
};
pub use verdict::Verdict;
