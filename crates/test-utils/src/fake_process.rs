use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use procker::errors::{ProckerError, Result};
use procker::process::{BoxFuture, Process};
use procker::types::Signal;

/// A fake process that:
/// - records every lifecycle call it receives ("start", "stop", "wait",
///   "signal:SIGKILL", ...)
/// - fails the operations it was told to fail, succeeds otherwise
/// - never touches the OS.
#[derive(Debug)]
pub struct FakeProcess {
    name: String,
    calls: Arc<Mutex<Vec<String>>>,
    failing: HashSet<&'static str>,
    running: AtomicBool,
}

impl FakeProcess {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: HashSet::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Make `ops` (`"start"`, `"stop"`, `"signal"`, `"wait"`) fail.
    pub fn failing_on(mut self, ops: &[&'static str]) -> Self {
        self.failing.extend(ops.iter().copied());
        self
    }

    /// Shared handle to the call log, usable after the fake moved into a group.
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, entry: String) -> Result<()> {
        self.calls.lock().unwrap().push(entry);
        if self.failing.contains(op) {
            Err(ProckerError::ExitLost {
                name: self.name.clone(),
                reason: format!("fake {op} failure"),
            })
        } else {
            Ok(())
        }
    }
}

impl Process for FakeProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.record("start", "start".to_string())?;
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn stop(&self, timeout: Duration) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.running.store(false, Ordering::SeqCst);
            self.record("stop", format!("stop:{}ms", timeout.as_millis()))
        })
    }

    fn signal(&self, signal: Signal) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move { self.record("signal", format!("signal:{signal}")) })
    }

    fn wait(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.running.store(false, Ordering::SeqCst);
            self.record("wait", "wait".to_string())
        })
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
