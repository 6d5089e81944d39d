//! Invariant I-2 (visibility lease): a reserved job is invisible to other
//! reservers until its lease expires, after which the reclaimer can move it
//! back onto pending.
//!
//! Requires a live Redis; skipped unless `OJ_REDIS_URL` is set.

use oj_queue::QueueBroker;

fn unique_keys() -> (String, String) {
    let suffix = std::process::id();
    (
        format!("oj-queue-test:pending:{suffix}"),
        format!("oj-queue-test:inflight:{suffix}"),
    )
}

async fn make_broker() -> anyhow::Result<QueueBroker> {
    let url = std::env::var("OJ_REDIS_URL")?;
    Ok(QueueBroker::connect(&url)?)
}

#[tokio::test]
#[ignore = "requires OJ_REDIS_URL; run: OJ_REDIS_URL=redis://localhost cargo test -p oj-queue -- --include-ignored"]
async fn reserved_job_is_invisible_until_lease_expires() -> anyhow::Result<()> {
    let broker = make_broker().await?;
    let (pending, in_flight) = unique_keys();

    broker.enqueue(&pending, "101").await?;

    let reserved = broker.reserve(&pending, &in_flight, 60_000).await?;
    assert_eq!(reserved.as_deref(), Some("101"));

    let second = broker.reserve(&pending, &in_flight, 60_000).await?;
    assert_eq!(second, None, "a leased job must not be reservable again");

    let depth = broker.depth(&pending, &in_flight, 0).await?;
    assert_eq!(depth.pending_depth, 0);
    assert_eq!(depth.in_flight_depth, 1);

    broker.ack(&in_flight, "101").await?;
    let depth = broker.depth(&pending, &in_flight, i64::MAX).await?;
    assert_eq!(depth.in_flight_depth, 0);

    Ok(())
}

#[tokio::test]
#[ignore = "requires OJ_REDIS_URL; run: OJ_REDIS_URL=redis://localhost cargo test -p oj-queue -- --include-ignored"]
async fn expired_lease_is_requeued_and_reservable_again() -> anyhow::Result<()> {
    let broker = make_broker().await?;
    let (pending, in_flight) = unique_keys();

    broker.enqueue(&pending, "202").await?;
    broker.reserve(&pending, &in_flight, 1).await?;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let now_ms = chrono::Utc::now().timestamp_millis();
    let requeued = broker.requeue_expired(&in_flight, &pending, now_ms).await?;
    assert_eq!(requeued, vec!["202".to_string()]);

    let reserved_again = broker.reserve(&pending, &in_flight, 60_000).await?;
    assert_eq!(reserved_again.as_deref(), Some("202"));

    Ok(())
}
