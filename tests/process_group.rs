// tests/process_group.rs

mod common;
use crate::common::{FakeProcess, fixture, init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use procker::errors::ProckerError;
use procker::process::{ManagedProcess, Process, ProcessGroup};
use procker::types::Signal;

type TestResult = Result<(), Box<dyn Error>>;

fn lazy(name: &str) -> Arc<ManagedProcess> {
    Arc::new(ManagedProcess::new(
        name,
        format!("sh {} {name}", fixture("lazyecho.sh")),
    ))
}

#[tokio::test]
async fn start_then_stop_leaves_nothing_running() -> TestResult {
    init_tracing();

    let web = lazy("web");
    let worker = lazy("worker");
    let group = ProcessGroup::new(vec![web.clone(), worker.clone()]);

    group.start().await?;
    assert!(group.is_running());
    assert!(web.is_running());
    assert!(worker.is_running());

    with_timeout(group.stop(Duration::from_secs(5))).await?;
    assert!(!web.is_running());
    assert!(!worker.is_running());

    // The group flag is sticky: it never goes back to "not started".
    assert!(group.is_running());
    Ok(())
}

#[tokio::test]
async fn wait_reports_each_failing_member() -> TestResult {
    init_tracing();

    let ok: Arc<dyn Process> = Arc::new(ManagedProcess::new("ok", "true"));
    let bad1: Arc<dyn Process> = Arc::new(ManagedProcess::new("bad1", "false"));
    let bad2: Arc<dyn Process> = Arc::new(ManagedProcess::new("bad2", "false"));
    let group = ProcessGroup::new(vec![ok, bad1, bad2]);

    group.start().await?;
    let err = with_timeout(group.wait()).await.unwrap_err();

    let errors = match err {
        ProckerError::Multiple(errors) => errors,
        other => panic!("expected aggregated failure, got {other}"),
    };
    let names: Vec<_> = errors
        .iter()
        .map(|e| match e {
            ProckerError::Exited { name, .. } => name.as_str(),
            other => panic!("unexpected member error {other}"),
        })
        .collect();
    assert_eq!(names, vec!["bad1", "bad2"]);
    Ok(())
}

#[tokio::test]
async fn unstarted_group_rejects_calls_without_touching_members() {
    init_tracing();

    let member = Arc::new(FakeProcess::new("web"));
    let log = member.call_log();
    let group = ProcessGroup::new(vec![member]);

    assert!(!group.is_running());
    assert!(matches!(
        group.stop(Duration::from_secs(1)).await,
        Err(ProckerError::NotStarted)
    ));
    assert!(matches!(
        group.signal(Signal::Interrupt).await,
        Err(ProckerError::NotStarted)
    ));
    assert!(matches!(group.wait().await, Err(ProckerError::NotStarted)));

    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn second_start_is_rejected() -> TestResult {
    init_tracing();

    let member = Arc::new(FakeProcess::new("web"));
    let log = member.call_log();
    let group = ProcessGroup::new(vec![member]);

    group.start().await?;
    assert!(matches!(group.start().await, Err(ProckerError::AlreadyStarted)));

    // Stopping does not make the group startable again.
    group.stop(Duration::from_millis(10)).await?;
    assert!(matches!(group.start().await, Err(ProckerError::AlreadyStarted)));

    assert_eq!(*log.lock().unwrap(), vec!["start", "stop:10ms"]);
    Ok(())
}

#[tokio::test]
async fn every_member_is_called_even_when_one_fails() {
    init_tracing();

    let failing = Arc::new(FakeProcess::new("db").failing_on(&["signal"]));
    let healthy = Arc::new(FakeProcess::new("web"));
    let healthy_log = healthy.call_log();
    let group = ProcessGroup::new(vec![failing, healthy]);

    group.start().await.unwrap();
    let err = group.signal(Signal::Hangup).await.unwrap_err();

    // A single failure comes back as-is, not wrapped.
    assert!(matches!(err, ProckerError::ExitLost { ref name, .. } if name == "db"));
    assert_eq!(*healthy_log.lock().unwrap(), vec!["start", "signal:SIGHUP"]);
}

#[tokio::test]
async fn nested_groups_fan_out_and_flatten() {
    init_tracing();

    let inner = ProcessGroup::named(
        "inner",
        vec![
            Arc::new(FakeProcess::new("a").failing_on(&["wait"])),
            Arc::new(FakeProcess::new("b").failing_on(&["wait"])),
        ],
    );
    let leaf = Arc::new(FakeProcess::new("c").failing_on(&["wait"]));
    let outer = ProcessGroup::named("outer", vec![Arc::new(inner), leaf]);

    outer.start().await.unwrap();
    let err = outer.wait().await.unwrap_err();
    assert!(matches!(err, ProckerError::Multiple(ref errors) if errors.len() == 2));

    let leaves = err.into_leaves();
    assert_eq!(leaves.len(), 3);
}

#[tokio::test]
async fn empty_group_is_trivially_fine() {
    init_tracing();

    let group = ProcessGroup::new(Vec::new());
    group.start().await.unwrap();
    group.wait().await.unwrap();
    group.stop(Duration::ZERO).await.unwrap();
}
