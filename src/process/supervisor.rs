// src/process/supervisor.rs

//! Background task that owns a running child.
//!
//! One supervisor is spawned per successful start. It is the only place
//! that touches the `tokio::process::Child`:
//! - it waits for the child to exit and publishes the outcome on a
//!   single-slot `watch` channel: first that the child was reaped, then the
//!   final report once its output has been drained,
//! - it delivers signals on request, so a pid is never signalled after it
//!   has been reaped,
//! - it kills the child if every handle to the run has been dropped.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{ProckerError, Result};
use crate::types::Signal;

/// How long output pumps may keep running once the child has exited.
///
/// A grandchild that inherited the pipes can keep them open indefinitely;
/// after this grace period its remaining output is dropped.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Capacity of the per-run signal request channel.
const CONTROL_QUEUE_CAPACITY: usize = 8;

/// Final state of one run of a child process.
#[derive(Debug, Clone)]
pub(crate) enum ExitReport {
    Exited(ExitStatus),
    /// Waiting on the child failed, so its real status is unknown.
    Lost(String),
}

impl ExitReport {
    pub(crate) fn into_result(self, name: &str) -> Result<()> {
        match self {
            ExitReport::Exited(status) if status.success() => Ok(()),
            ExitReport::Exited(status) => Err(ProckerError::Exited {
                name: name.to_string(),
                status,
            }),
            ExitReport::Lost(reason) => Err(ProckerError::ExitLost {
                name: name.to_string(),
                reason,
            }),
        }
    }

    /// Whether the child died from one of `signals`.
    pub(crate) fn killed_by_any(&self, signals: &[Signal]) -> bool {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            match self {
                ExitReport::Exited(status) => status
                    .signal()
                    .is_some_and(|raw| signals.iter().any(|s| s.number() == raw)),
                ExitReport::Lost(_) => false,
            }
        }

        #[cfg(not(unix))]
        {
            let _ = signals;
            false
        }
    }
}

/// Lifecycle of one run as seen through the `watch` channel.
#[derive(Debug, Clone)]
enum RunState {
    Running,
    /// The child has been reaped; its output may still be draining.
    Reaped,
    Finished(ExitReport),
}

struct SignalRequest {
    signal: Signal,
    reply: oneshot::Sender<std::result::Result<(), String>>,
}

/// Caller-side handle to one run.
///
/// Cloning is cheap; all clones talk to the same supervisor task.
#[derive(Debug, Clone)]
pub(crate) struct RunHandle {
    pid: Option<u32>,
    control: mpsc::Sender<SignalRequest>,
    state: watch::Receiver<RunState>,
}

impl RunHandle {
    pub(crate) fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// True until the child has been reaped.
    pub(crate) fn is_running(&self) -> bool {
        matches!(*self.state.borrow(), RunState::Running)
    }

    /// Ask the supervisor to deliver `signal`.
    ///
    /// Fails with `NotStarted` when the supervisor no longer accepts requests
    /// because the child is already gone.
    pub(crate) async fn send_signal(&self, name: &str, signal: Signal) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.control
            .send(SignalRequest { signal, reply })
            .await
            .map_err(|_| ProckerError::NotStarted)?;

        match reply_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(ProckerError::Signal {
                name: name.to_string(),
                signal,
                reason,
            }),
            Err(_) => Err(ProckerError::NotStarted),
        }
    }

    /// Suspend until the child has been reaped.
    pub(crate) async fn wait_reaped(&self) {
        let mut state = self.state.clone();
        let _ = state
            .wait_for(|s| !matches!(s, RunState::Running))
            .await;
    }

    /// Suspend until the run's exit has been published, output included.
    pub(crate) async fn wait_exit(&self) -> ExitReport {
        let mut state = self.state.clone();
        let finished = match state
            .wait_for(|s| matches!(s, RunState::Finished(_)))
            .await
        {
            Ok(current) => match &*current {
                RunState::Finished(report) => Some(report.clone()),
                _ => None,
            },
            Err(_) => None,
        };
        finished.unwrap_or_else(|| {
            ExitReport::Lost("supervisor ended before the exit was observed".to_string())
        })
    }
}

/// Spawn the supervisor for a freshly started child.
pub(crate) fn spawn_supervisor(
    name: String,
    child: Child,
    pumps: Vec<JoinHandle<()>>,
) -> RunHandle {
    let pid = child.id();
    let (control, control_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);
    let (state_tx, state) = watch::channel(RunState::Running);

    tokio::spawn(supervise(name, child, control_rx, state_tx, pumps));

    RunHandle {
        pid,
        control,
        state,
    }
}

async fn supervise(
    name: String,
    mut child: Child,
    mut control_rx: mpsc::Receiver<SignalRequest>,
    state_tx: watch::Sender<RunState>,
    pumps: Vec<JoinHandle<()>>,
) {
    let mut orphaned = false;

    let report = loop {
        tokio::select! {
            status = child.wait() => {
                break match status {
                    Ok(status) => ExitReport::Exited(status),
                    Err(e) => ExitReport::Lost(e.to_string()),
                };
            }

            request = control_rx.recv(), if !orphaned => {
                match request {
                    Some(SignalRequest { signal, reply }) => {
                        let delivered = deliver(&mut child, signal);
                        match &delivered {
                            Ok(()) => debug!(process = %name, %signal, "signal delivered"),
                            Err(e) => {
                                warn!(process = %name, %signal, error = %e, "signal delivery failed")
                            }
                        }
                        let _ = reply.send(delivered);
                    }
                    None => {
                        orphaned = true;
                        warn!(
                            process = %name,
                            "all handles dropped while running; killing process"
                        );
                        if let Err(e) = deliver(&mut child, Signal::Kill) {
                            warn!(process = %name, error = %e, "failed to kill orphaned process");
                        }
                    }
                }
            }
        }
    };

    // Pending and future signal requests fail fast from here on.
    drop(control_rx);
    state_tx.send_replace(RunState::Reaped);

    match &report {
        ExitReport::Exited(status) => info!(
            process = %name,
            success = status.success(),
            %status,
            "process exited"
        ),
        ExitReport::Lost(reason) => {
            warn!(process = %name, %reason, "failed waiting for process")
        }
    }

    drain_output(&name, pumps).await;
    state_tx.send_replace(RunState::Finished(report));
}

async fn drain_output(name: &str, pumps: Vec<JoinHandle<()>>) {
    let aborts: Vec<_> = pumps.iter().map(|p| p.abort_handle()).collect();
    let all_done = async {
        for pump in pumps {
            let _ = pump.await;
        }
    };

    if tokio::time::timeout(OUTPUT_DRAIN_GRACE, all_done).await.is_err() {
        debug!(process = %name, "output still open after exit; dropping the rest");
        for abort in aborts {
            abort.abort();
        }
    }
}

/// Deliver `signal` to the child's process group.
fn deliver(child: &mut Child, signal: Signal) -> std::result::Result<(), String> {
    #[cfg(unix)]
    {
        use nix::sys::signal::killpg;
        use nix::unistd::Pid;

        let pid = child
            .id()
            .ok_or_else(|| "process already exited".to_string())?;
        killpg(Pid::from_raw(pid as i32), signal.to_nix()).map_err(|e| e.to_string())
    }

    #[cfg(not(unix))]
    {
        match signal {
            Signal::Kill | Signal::Terminate => child.start_kill().map_err(|e| e.to_string()),
            other => Err(format!("{other} is not supported on this platform")),
        }
    }
}
