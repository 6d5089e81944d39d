//! Object-safe boundary over the Queue Broker's four operations (§4.A),
//! mirroring `oj_sandbox::SandboxRunner` and `oj_db`'s repo traits — lets
//! the worker pool's retry/poison-pill state machine and the reclaimer run
//! against an in-memory fake in hermetic tests instead of a live Redis.

use async_trait::async_trait;

use crate::error::QueueError;
use crate::QueueBroker;

#[async_trait]
pub trait QueueRunner: Send + Sync {
    async fn enqueue(&self, pending_key: &str, value: &str) -> Result<(), QueueError>;

    async fn reserve(
        &self,
        pending_key: &str,
        in_flight_key: &str,
        visibility_ms: u64,
    ) -> Result<Option<String>, QueueError>;

    async fn ack(&self, in_flight_key: &str, value: &str) -> Result<(), QueueError>;

    async fn requeue_expired(
        &self,
        in_flight_key: &str,
        pending_key: &str,
        now_ms: i64,
    ) -> Result<Vec<String>, QueueError>;
}

#[async_trait]
impl QueueRunner for QueueBroker {
    async fn enqueue(&self, pending_key: &str, value: &str) -> Result<(), QueueError> {
        QueueBroker::enqueue(self, pending_key, value).await
    }

    async fn reserve(
        &self,
        pending_key: &str,
        in_flight_key: &str,
        visibility_ms: u64,
    ) -> Result<Option<String>, QueueError> {
        QueueBroker::reserve(self, pending_key, in_flight_key, visibility_ms).await
    }

    async fn ack(&self, in_flight_key: &str, value: &str) -> Result<(), QueueError> {
        QueueBroker::ack(self, in_flight_key, value).await
    }

    async fn requeue_expired(
        &self,
        in_flight_key: &str,
        pending_key: &str,
        now_ms: i64,
    ) -> Result<Vec<String>, QueueError> {
        QueueBroker::requeue_expired(self, in_flight_key, pending_key, now_ms).await
    }
}
