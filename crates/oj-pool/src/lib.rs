//! Worker Pool (§4.F) — N cooperating workers plus a reclaimer task, all
//! driven by a single cancellation token.

mod config;
mod pool;
mod reclaimer;

pub use config::PoolConfig;
pub use pool::WorkerPool;
