//! Shared runtime state for oj-daemon.
//!
//! All types here are cheaply `Clone`-able (via `Arc`). Handlers receive
//! `State<Arc<AppState>>` from Axum; this module owns nothing async itself.

use std::sync::Arc;
use std::time::Instant;

use oj_config::Config;
use oj_db::SubmissionStore;
use oj_queue::QueueBroker;

/// Cloneable (Arc) handle shared across all Axum handlers. This is the
/// operator-facing surface only — the submission API itself is out of
/// core (§1).
pub struct AppState {
    pub config: Arc<Config>,
    pub broker: QueueBroker,
    pub submissions: SubmissionStore,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, broker: QueueBroker, submissions: SubmissionStore) -> Self {
        Self {
            config,
            broker,
            submissions,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
