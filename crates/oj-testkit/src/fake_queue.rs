//! In-memory stand-in for [`oj_queue::QueueBroker`]'s four operations.
//!
//! Mirrors the real broker's contract (atomic pop+lease on `reserve`,
//! idempotent `ack`, score-ordered `requeue_expired`) without touching
//! Redis, for unit-testing pool/reclaimer logic in isolation. Implements
//! [`oj_queue::QueueRunner`] so `oj-pool`'s worker loop and reclaimer can
//! be driven against it directly in hermetic tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use oj_queue::{QueueError, QueueRunner};

#[derive(Debug, Default)]
pub struct FakeQueueBroker {
    pending: Mutex<VecDeque<String>>,
    /// (value, lease_deadline_ms)
    in_flight: Mutex<Vec<(String, i64)>>,
}

impl FakeQueueBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, value: &str) {
        self.pending.lock().unwrap().push_back(value.to_string());
    }

    pub fn reserve(&self, now_ms: i64, visibility_ms: i64) -> Option<String> {
        let value = self.pending.lock().unwrap().pop_front()?;
        self.in_flight
            .lock()
            .unwrap()
            .push((value.clone(), now_ms + visibility_ms));
        Some(value)
    }

    pub fn ack(&self, value: &str) {
        self.in_flight.lock().unwrap().retain(|(v, _)| v != value);
    }

    pub fn requeue_expired(&self, now_ms: i64) -> Vec<String> {
        let mut in_flight = self.in_flight.lock().unwrap();
        let (expired, still_leased): (Vec<_>, Vec<_>) =
            in_flight.drain(..).partition(|(_, deadline)| *deadline <= now_ms);
        *in_flight = still_leased;
        drop(in_flight);

        let mut pending = self.pending.lock().unwrap();
        for (value, _) in &expired {
            pending.push_front(value.clone());
        }
        expired.into_iter().map(|(v, _)| v).collect()
    }

    pub fn pending_depth(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn in_flight_depth(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }
}

/// Key names are ignored — this fake holds a single pending/in-flight
/// pair, matching the real broker's one global queue. `now_ms` is sourced
/// from the wall clock since the trait contract, unlike this fake's own
/// inherent methods, doesn't thread a clock through the call.
#[async_trait]
impl QueueRunner for FakeQueueBroker {
    async fn enqueue(&self, _pending_key: &str, value: &str) -> Result<(), QueueError> {
        self.enqueue(value);
        Ok(())
    }

    async fn reserve(
        &self,
        _pending_key: &str,
        _in_flight_key: &str,
        visibility_ms: u64,
    ) -> Result<Option<String>, QueueError> {
        let now_ms = Utc::now().timestamp_millis();
        Ok(self.reserve(now_ms, visibility_ms as i64))
    }

    async fn ack(&self, _in_flight_key: &str, value: &str) -> Result<(), QueueError> {
        self.ack(value);
        Ok(())
    }

    async fn requeue_expired(
        &self,
        _in_flight_key: &str,
        _pending_key: &str,
        now_ms: i64,
    ) -> Result<Vec<String>, QueueError> {
        Ok(self.requeue_expired(now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_pops_fifo_and_leases() {
        let broker = FakeQueueBroker::new();
        broker.enqueue("1");
        broker.enqueue("2");

        assert_eq!(broker.reserve(0, 1000), Some("1".to_string()));
        assert_eq!(broker.pending_depth(), 1);
        assert_eq!(broker.in_flight_depth(), 1);
    }

    #[test]
    fn expired_lease_is_requeued_to_head() {
        let broker = FakeQueueBroker::new();
        broker.enqueue("1");
        broker.reserve(0, 1000);

        assert!(broker.requeue_expired(500).is_empty());
        let requeued = broker.requeue_expired(1500);
        assert_eq!(requeued, vec!["1".to_string()]);
        assert_eq!(broker.pending_depth(), 1);
        assert_eq!(broker.in_flight_depth(), 0);
    }

    #[test]
    fn ack_is_idempotent() {
        let broker = FakeQueueBroker::new();
        broker.enqueue("1");
        broker.reserve(0, 1000);
        broker.ack("1");
        broker.ack("1");
        assert_eq!(broker.in_flight_depth(), 0);
    }
}
