//! In-memory test doubles and scenario fixtures (§8) shared across the
//! workspace's test suites. Kept as a small, dependency-light dev-only
//! crate — nothing here is wired into production binaries.

mod fake_queue;
mod fake_sandbox;
mod fake_store;
mod fixtures;

pub use fake_queue::FakeQueueBroker;
pub use fake_sandbox::FakeSandboxClient;
pub use fake_store::{FakeProblemStore, FakeSubmissionStore};
pub use fixtures::{
    a_plus_b_problem, a_plus_b_testcase, tight_time_limit_problem, AC_SOURCE_C, CE_SOURCE_CPP,
    TLE_SOURCE_C, WA_SOURCE_C,
};
