//! Submission Store and Problem Store — the transactional heart of the
//! judge core (§4.B / §4.C).
//!
//! The submission row's `(status, retry_count)` pair is the sole
//! authoritative job state; the queue is a hint. Every write path that
//! would move a row into `running` goes through [`SubmissionStore::acquire_pending`],
//! which row-locks and checks `status = pending` inside one transaction —
//! no other function may set `status = 'running'`.

mod problem_store;
mod repo;
mod submission_store;

pub use problem_store::ProblemStore;
pub use repo::{ProblemRepo, SubmissionRepo};
pub use submission_store::{AcquireError, SubmissionStore};

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect to Postgres. Callers supply the URL from [`oj_config::Config`]
/// — this crate never reads the environment itself.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct DbStatus {
    pub ok: bool,
    pub has_submissions_table: bool,
}

/// Connectivity + schema-presence check for operator tooling (`oj db status`).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema = 'public' and table_name = 'submissions'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_submissions_table: exists,
    })
}
