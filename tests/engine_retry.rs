//! Retry and timeout behavior over real UDP.

mod common;

use common::{Results, TARGET, TestAgent, engine_for, record, sys_descr};
use snmp_engine::{Error, RequestKind, RequestOptions, Retry, VarBind, Version};
use std::time::{Duration, Instant};

/// A dropped request is retransmitted and the retry's response completes it.
#[tokio::test]
async fn retry_recovers_dropped_request() {
    let agent = TestAgent::new().await;
    agent.drop_next(1);
    let mut engine = engine_for(
        agent.addr(),
        Version::V2c,
        Duration::from_millis(100),
        Retry::immediate(2),
    )
    .await;

    let results = Results::default();
    engine.get(TARGET, &[sys_descr()], record(&results)).unwrap();
    engine.run_until_complete().await;

    let results = results.borrow();
    assert_eq!(results.len(), 1);
    assert!(results[0].1.is_success());
    assert_eq!(agent.requests(), 2);
}

/// With a silent agent the callback sees a timeout after every attempt.
#[tokio::test]
async fn fails_after_max_retries() {
    let agent = TestAgent::new().await;
    agent.set_silent(true);
    let mut engine = engine_for(
        agent.addr(),
        Version::V2c,
        Duration::from_millis(50),
        Retry::immediate(2),
    )
    .await;

    let start = Instant::now();
    let results = Results::default();
    engine.get(TARGET, &[sys_descr()], record(&results)).unwrap();
    engine.run_until_complete().await;

    let results = results.borrow();
    assert_eq!(results.len(), 1);
    let outcome = &results[0].1;
    assert!(matches!(
        outcome.error_indication.as_deref(),
        Some(Error::Timeout { retries: 2, .. })
    ));
    assert!(outcome.varbinds.is_empty());
    assert!(outcome.error_status.is_none());
    assert_eq!(agent.requests(), 3);

    // ~150ms (3 attempts * 50ms timeout)
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(150));
    assert!(elapsed < Duration::from_secs(2));
}

/// Zero retries means single attempt.
#[tokio::test]
async fn zero_retries_single_attempt() {
    let agent = TestAgent::new().await;
    agent.set_silent(true);
    let mut engine = engine_for(
        agent.addr(),
        Version::V1,
        Duration::from_millis(50),
        Retry::none(),
    )
    .await;

    let results = Results::default();
    engine.get(TARGET, &[sys_descr()], record(&results)).unwrap();
    engine.run_until_complete().await;

    assert!(results.borrow()[0].1.error_indication.is_some());
    assert_eq!(agent.requests(), 1);
}

/// Per-request options win over the engine defaults.
#[tokio::test]
async fn request_options_override_defaults() {
    let agent = TestAgent::new().await;
    agent.set_silent(true);
    let mut engine = engine_for(
        agent.addr(),
        Version::V2c,
        Duration::from_secs(30),
        Retry::none(),
    )
    .await;

    let results = Results::default();
    engine
        .send_request(
            TARGET,
            RequestKind::Get,
            vec![VarBind::null(sys_descr())],
            RequestOptions::default()
                .timeout(Duration::from_millis(50))
                .retry(Retry::fixed(1, Duration::from_millis(20))),
            record(&results),
        )
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), engine.run_until_complete())
        .await
        .expect("request options were ignored");

    assert!(matches!(
        results.borrow()[0].1.error_indication.as_deref(),
        Some(Error::Timeout { retries: 1, .. })
    ));
    assert_eq!(agent.requests(), 2);
}

/// A reply to a cancelled request is discarded.
#[tokio::test]
async fn reply_to_cancelled_request_is_ignored() {
    let agent = TestAgent::new().await;
    let mut engine = engine_for(
        agent.addr(),
        Version::V2c,
        Duration::from_secs(2),
        Retry::none(),
    )
    .await;

    // sent and answered, but cancelled before the loop reads the reply
    let results = Results::default();
    let handle = engine.get(TARGET, &[sys_descr()], record(&results)).unwrap();
    assert!(engine.cancel(handle));

    let follow_up = engine.get(TARGET, &[sys_descr()], record(&results)).unwrap();
    engine.run_until_complete().await;

    let results = results.borrow();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, follow_up);
    assert!(results[0].1.is_success());
}
