// src/process/group.rs

//! Composite process: every lifecycle call is fanned out to all members.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::{ProckerError, Result};
use crate::process::{BoxFuture, Process};
use crate::types::Signal;

/// The lifecycle call being fanned out.
#[derive(Debug, Clone, Copy)]
enum GroupOp {
    Start,
    Stop(Duration),
    Signal(Signal),
    Wait,
}

impl GroupOp {
    fn apply(self, member: &dyn Process) -> BoxFuture<'_, Result<()>> {
        match self {
            GroupOp::Start => member.start(),
            GroupOp::Stop(timeout) => member.stop(timeout),
            GroupOp::Signal(signal) => member.signal(signal),
            GroupOp::Wait => member.wait(),
        }
    }
}

/// Ordered, fixed set of processes driven as one.
///
/// Each call spawns one task per member, joins them all and reports every
/// member failure (not just one). A failing member never cuts its siblings'
/// calls short.
///
/// A group can be started once. The `started` flag is never cleared, even
/// after all members have exited.
pub struct ProcessGroup {
    name: String,
    members: Vec<Arc<dyn Process>>,
    started: AtomicBool,
}

impl ProcessGroup {
    pub fn new(members: Vec<Arc<dyn Process>>) -> Self {
        Self::named("group", members)
    }

    pub fn named(name: impl Into<String>, members: Vec<Arc<dyn Process>>) -> Self {
        Self {
            name: name.into(),
            members,
            started: AtomicBool::new(false),
        }
    }

    fn ensure_started(&self) -> Result<()> {
        if self.started.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ProckerError::NotStarted)
        }
    }

    async fn start_inner(&self) -> Result<()> {
        // Flag first, so a stop issued right after `start` returns sees it.
        self.started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ProckerError::AlreadyStarted)?;

        info!(group = %self.name, members = self.members.len(), "starting process group");
        self.fan_out(GroupOp::Start).await
    }

    async fn checked_fan_out(&self, op: GroupOp) -> Result<()> {
        self.ensure_started()?;
        self.fan_out(op).await
    }

    async fn fan_out(&self, op: GroupOp) -> Result<()> {
        let handles: Vec<_> = self
            .members
            .iter()
            .map(|member| {
                let member = Arc::clone(member);
                tokio::spawn(async move { op.apply(&*member).await })
            })
            .collect();

        // One slot per member, filled in member order.
        let mut failures = Vec::new();
        for (member, handle) in self.members.iter().zip(handles) {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(
                        group = %self.name,
                        member = member.name(),
                        ?op,
                        error = %e,
                        "member call failed"
                    );
                    failures.push(e);
                }
                Err(join_err) => {
                    debug!(
                        group = %self.name,
                        member = member.name(),
                        error = %join_err,
                        "member task failed"
                    );
                    failures.push(ProckerError::MemberPanicked {
                        name: member.name().to_string(),
                    });
                }
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(ProckerError::Multiple(failures)),
        }
    }
}

impl Process for ProcessGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.start_inner())
    }

    fn stop(&self, timeout: Duration) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.checked_fan_out(GroupOp::Stop(timeout)))
    }

    fn signal(&self, signal: Signal) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.checked_fan_out(GroupOp::Signal(signal)))
    }

    fn wait(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.checked_fan_out(GroupOp::Wait))
    }

    /// Reports whether the group was started, not whether members still run.
    fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ProcessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.members.iter().map(|m| m.name()).collect();
        f.debug_struct("ProcessGroup")
            .field("name", &self.name)
            .field("members", &names)
            .field("started", &self.started.load(Ordering::Relaxed))
            .finish()
    }
}
