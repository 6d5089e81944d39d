//! Queue Broker (§4.A) — a durable FIFO with reservation and visibility
//! leases over Redis.
//!
//! Four operations, each a single atomic server-side script so that a
//! crash between a pop and the corresponding in-flight insert can never
//! lose a job:
//!
//! - [`QueueBroker::enqueue`] — `RPUSH` onto the pending list.
//! - [`QueueBroker::reserve`] — pop the head of pending, insert into the
//!   in-flight sorted set scored by lease-expiry, atomically.
//! - [`QueueBroker::ack`] — remove from the in-flight set.
//! - [`QueueBroker::requeue_expired`] — atomically move every in-flight
//!   member whose score has passed back onto the head of pending.
//!
//! Values are opaque strings (decimal submission ids, per §6). All four
//! operations are idempotent from the caller's perspective: a repeated
//! `ack` is harmless, a repeated `enqueue` creates a tolerated duplicate.

mod error;
mod runner;

pub use error::QueueError;
pub use runner::QueueRunner;

use deadpool_redis::{Config, Pool, Runtime};
use redis::{AsyncCommands, Script};
use serde::Serialize;

/// Key names from §6. The pending list and in-flight sorted set are a
/// single global pair, not per-problem or per-language, so every component
/// that touches the queue shares these constants rather than each naming
/// its own string.
pub const PENDING_KEY: &str = "pending_submissions";
pub const IN_FLIGHT_KEY: &str = "processing_submissions";

/// Point-in-time queue metrics (§4.G / §3 `QueueJob`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueDepth {
    pub pending_depth: u64,
    pub in_flight_depth: u64,
    /// In-flight members whose lease has already expired — reclaimer lag.
    pub expired_candidates: u64,
}

/// `KEYS[1]` = pending list, `KEYS[2]` = in-flight sorted set,
/// `ARGV[1]` = visibility timeout in milliseconds.
///
/// Uses Redis's own clock (`TIME`) for the lease deadline so reservation
/// is correct even if workers' wall clocks drift relative to each other.
const RESERVE_SCRIPT: &str = r#"
local v = redis.call('LPOP', KEYS[1])
if not v then
  return false
end
local t = redis.call('TIME')
local now_ms = (tonumber(t[1]) * 1000) + math.floor(tonumber(t[2]) / 1000)
local deadline = now_ms + tonumber(ARGV[1])
redis.call('ZADD', KEYS[2], deadline, v)
return v
"#;

/// `KEYS[1]` = in-flight sorted set, `KEYS[2]` = pending list,
/// `ARGV[1]` = now in milliseconds. Returns the list of requeued values.
const REQUEUE_EXPIRED_SCRIPT: &str = r#"
local expired = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
for i = 1, #expired do
  redis.call('ZREM', KEYS[1], expired[i])
  redis.call('LPUSH', KEYS[2], expired[i])
end
return expired
"#;

#[derive(Clone)]
pub struct QueueBroker {
    pool: Pool,
}

impl QueueBroker {
    pub fn connect(redis_url: &str) -> Result<Self, QueueError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Append `value` to the tail of `pending_key`.
    pub async fn enqueue(&self, pending_key: &str, value: &str) -> Result<(), QueueError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn
            .rpush(pending_key, value)
            .await
            .map_err(QueueError::from_redis)?;
        Ok(())
    }

    /// Atomically pop the head of `pending_key` and, if present, insert it
    /// into `in_flight_key` with a lease expiring `visibility_ms` from now.
    /// Returns `None` if the pending list was empty.
    pub async fn reserve(
        &self,
        pending_key: &str,
        in_flight_key: &str,
        visibility_ms: u64,
    ) -> Result<Option<String>, QueueError> {
        let mut conn = self.conn().await?;
        let result: redis::Value = Script::new(RESERVE_SCRIPT)
            .key(pending_key)
            .key(in_flight_key)
            .arg(visibility_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(QueueError::from_redis)?;

        match result {
            redis::Value::Nil => Ok(None),
            redis::Value::BulkString(bytes) => {
                Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
            }
            redis::Value::Boolean(false) => Ok(None),
            other => Err(QueueError::Protocol(format!(
                "unexpected RESERVE reply: {other:?}"
            ))),
        }
    }

    /// Remove `value` from `in_flight_key`. Idempotent: removing an
    /// already-absent value is not an error.
    pub async fn ack(&self, in_flight_key: &str, value: &str) -> Result<(), QueueError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn
            .zrem(in_flight_key, value)
            .await
            .map_err(QueueError::from_redis)?;
        Ok(())
    }

    /// Atomically move every member of `in_flight_key` scored `<= now_ms`
    /// back onto the head of `pending_key`. Returns the requeued values.
    pub async fn requeue_expired(
        &self,
        in_flight_key: &str,
        pending_key: &str,
        now_ms: i64,
    ) -> Result<Vec<String>, QueueError> {
        let mut conn = self.conn().await?;
        let values: Vec<String> = Script::new(REQUEUE_EXPIRED_SCRIPT)
            .key(in_flight_key)
            .key(pending_key)
            .arg(now_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(QueueError::from_redis)?;
        Ok(values)
    }

    /// Snapshot of queue depth for operator dashboards (§4.G).
    pub async fn depth(
        &self,
        pending_key: &str,
        in_flight_key: &str,
        now_ms: i64,
    ) -> Result<QueueDepth, QueueError> {
        let mut conn = self.conn().await?;
        let pending_depth: u64 = conn.llen(pending_key).await.map_err(QueueError::from_redis)?;
        let in_flight_depth: u64 = conn
            .zcard(in_flight_key)
            .await
            .map_err(QueueError::from_redis)?;
        let expired_candidates: u64 = conn
            .zcount(in_flight_key, i64::MIN, now_ms)
            .await
            .map_err(QueueError::from_redis)?;
        Ok(QueueDepth {
            pending_depth,
            in_flight_depth,
            expired_candidates,
        })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, QueueError> {
        self.pool
            .get()
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))
    }
}
