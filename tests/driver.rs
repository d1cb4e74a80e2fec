// tests/driver.rs

mod common;
use crate::common::{FakeProcess, init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use procker::driver::{ShutdownFlag, drive};

#[tokio::test]
async fn first_interrupt_stops_later_ones_kill() {
    init_tracing();

    let target = Arc::new(FakeProcess::new("group"));
    let log = target.call_log();
    let flag = ShutdownFlag::default();
    let (tx, rx) = mpsc::channel(4);

    let driver = tokio::spawn(drive(
        target,
        Duration::from_millis(250),
        rx,
        flag.clone(),
    ));

    tx.send(()).await.unwrap();
    tx.send(()).await.unwrap();
    drop(tx);
    with_timeout(driver).await.unwrap();

    assert!(flag.is_requested());
    let calls = log.lock().unwrap().clone();
    assert_eq!(calls.len(), 2, "calls: {calls:?}");
    assert!(calls.contains(&"stop:250ms".to_string()));
    assert!(calls.contains(&"signal:SIGKILL".to_string()));
}

#[tokio::test]
async fn no_interrupt_means_no_shutdown() {
    init_tracing();

    let target = Arc::new(FakeProcess::new("group"));
    let log = target.call_log();
    let flag = ShutdownFlag::default();
    let (tx, rx) = mpsc::channel::<()>(1);
    drop(tx);

    with_timeout(drive(target, Duration::from_secs(1), rx, flag.clone())).await;

    assert!(!flag.is_requested());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stop_failure_does_not_end_the_driver() {
    init_tracing();

    let target = Arc::new(FakeProcess::new("group").failing_on(&["stop", "signal"]));
    let log = target.call_log();
    let flag = ShutdownFlag::default();
    let (tx, rx) = mpsc::channel(4);

    let driver = tokio::spawn(drive(target, Duration::ZERO, rx, flag.clone()));
    for _ in 0..3 {
        tx.send(()).await.unwrap();
    }
    drop(tx);
    with_timeout(driver).await.unwrap();

    let calls = log.lock().unwrap().clone();
    let kills = calls.iter().filter(|c| *c == "signal:SIGKILL").count();
    assert_eq!(kills, 2);
}
