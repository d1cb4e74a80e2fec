// src/driver.rs

//! Host signal driver.
//!
//! The first interrupt stops the supervised process gracefully in the
//! background; every later one force-kills it. Interrupts arrive on a
//! channel so tests can feed them without touching real signals.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::process::Process;
use crate::types::Signal;

/// Set once the user has asked for a shutdown.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark the shutdown as requested; returns whether it already was.
    fn request(&self) -> bool {
        self.0.swap(true, Ordering::AcqRel)
    }
}

/// Forward Ctrl-C (and SIGTERM on unix) into a channel.
pub fn spawn_interrupt_listener() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!(error = %e, "failed to listen for SIGTERM");
                    None
                }
            };

            loop {
                let received = tokio::select! {
                    res = tokio::signal::ctrl_c() => res.is_ok(),
                    Some(()) = async {
                        match sigterm.as_mut() {
                            Some(s) => s.recv().await,
                            None => std::future::pending().await,
                        }
                    } => true,
                };
                if !received || tx.send(()).await.is_err() {
                    break;
                }
            }
        }

        #[cfg(not(unix))]
        {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        }
    });

    rx
}

/// React to interrupts until the channel closes.
pub async fn drive(
    target: Arc<dyn Process>,
    stop_timeout: Duration,
    mut interrupts: mpsc::Receiver<()>,
    flag: ShutdownFlag,
) {
    let mut stopper: Option<JoinHandle<()>> = None;

    while interrupts.recv().await.is_some() {
        if !flag.request() {
            info!(
                timeout = ?stop_timeout,
                "interrupt received; stopping processes (press Ctrl-C again to kill)"
            );
            let target = Arc::clone(&target);
            stopper = Some(tokio::spawn(async move {
                if let Err(e) = target.stop(stop_timeout).await {
                    debug!(error = %e, "stop finished with errors");
                }
            }));
        } else {
            info!("interrupt received again; killing processes");
            if let Err(e) = target.signal(Signal::Kill).await {
                debug!(error = %e, "kill finished with errors");
            }
        }
    }

    if let Some(stopper) = stopper {
        let _ = stopper.await;
    }
}
