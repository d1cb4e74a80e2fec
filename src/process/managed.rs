// src/process/managed.rs

//! A single supervised OS process.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{ProckerError, Result};
use crate::manifest::expand::{expand_with_env, split_command};
use crate::process::output::{OutputSink, spawn_pump};
use crate::process::supervisor::{RunHandle, spawn_supervisor};
use crate::process::{BoxFuture, Process};
use crate::types::Signal;

/// Owns one child process and drives it through
/// `NotStarted -> Running -> Exited`, any number of times.
///
/// The command template is expanded against the process's own environment
/// list at every start, then split on whitespace into program and
/// arguments. With an empty environment list the child inherits the
/// supervisor's environment; otherwise it receives exactly that list.
pub struct ManagedProcess {
    name: String,
    command: String,
    dir: Option<PathBuf>,
    env: Vec<String>,
    stdout: OutputSink,
    stderr: OutputSink,
    /// Handle of the most recent run. Running until its child is reaped.
    run: Mutex<Option<RunHandle>>,
}

impl ManagedProcess {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            dir: None,
            env: Vec::new(),
            stdout: OutputSink::null(),
            stderr: OutputSink::null(),
            run: Mutex::new(None),
        }
    }

    /// Working directory for the child, made absolute right away so a later
    /// change of the supervisor's own directory has no effect.
    pub fn with_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let resolved = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        self.dir = Some(resolved);
        self
    }

    pub fn with_env(mut self, env: Vec<String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_stdout(mut self, sink: OutputSink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn with_stderr(mut self, sink: OutputSink) -> Self {
        self.stderr = sink;
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// OS pid of the current run, if it is still running.
    pub fn pid(&self) -> Option<u32> {
        self.running_run().and_then(|run| run.pid())
    }

    fn current_run(&self) -> Option<RunHandle> {
        self.run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn running_run(&self) -> Option<RunHandle> {
        self.current_run().filter(RunHandle::is_running)
    }

    fn start_inner(&self) -> Result<()> {
        // Held across spawn so concurrent starts cannot both succeed.
        let mut slot = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(RunHandle::is_running) {
            return Err(ProckerError::AlreadyStarted);
        }

        let expanded = expand_with_env(&self.command, &self.env);
        let argv = split_command(&expanded);
        let (program, args) = argv.split_first().ok_or_else(|| ProckerError::EmptyCommand {
            name: self.name.clone(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }

        if !self.env.is_empty() {
            cmd.env_clear();
            for (key, value) in self.env.iter().filter_map(|e| e.split_once('=')) {
                cmd.env(key, value);
            }
        }

        // Own process group: terminal interrupts reach only the supervisor,
        // and signals reach helper children of shell wrappers too.
        #[cfg(unix)]
        cmd.process_group(0);

        // Outside the terminal's process group the child would survive a
        // SIGKILLed supervisor. The kernel ties it to the spawning thread;
        // runtime worker threads live as long as the runtime.
        #[cfg(target_os = "linux")]
        // SAFETY: the hook only calls prctl(2), which is async-signal-safe
        // and touches no state shared with the parent.
        unsafe {
            cmd.pre_exec(|| {
                nix::sys::prctl::set_pdeathsig(nix::sys::signal::Signal::SIGKILL)
                    .map_err(std::io::Error::from)
            });
        }

        let mut child = cmd.spawn().map_err(|source| ProckerError::Spawn {
            name: self.name.clone(),
            source,
        })?;

        info!(process = %self.name, pid = ?child.id(), cmd = %expanded, "process started");

        let mut pumps = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            pumps.push(spawn_pump(self.name.clone(), "stdout", out, self.stdout.clone()));
        }
        if let Some(err) = child.stderr.take() {
            pumps.push(spawn_pump(self.name.clone(), "stderr", err, self.stderr.clone()));
        }

        *slot = Some(spawn_supervisor(self.name.clone(), child, pumps));
        Ok(())
    }

    async fn wait_inner(&self) -> Result<()> {
        let run = self.current_run().ok_or(ProckerError::NotStarted)?;
        run.wait_exit().await.into_result(&self.name)
    }

    async fn signal_inner(&self, signal: Signal) -> Result<()> {
        let run = self.running_run().ok_or(ProckerError::NotStarted)?;
        run.send_signal(&self.name, signal).await
    }

    /// SIGTERM, race the exit against `timeout`, SIGKILL if the timer wins.
    async fn stop_inner(&self, timeout: Duration) -> Result<()> {
        let run = self.running_run().ok_or(ProckerError::NotStarted)?;

        debug!(process = %self.name, ?timeout, "stopping process");
        if let Err(e) = run.send_signal(&self.name, Signal::Terminate).await {
            debug!(process = %self.name, error = %e, "termination signal not delivered");
        }

        let exited = tokio::select! {
            biased;
            _ = run.wait_reaped() => true,
            _ = tokio::time::sleep(timeout) => false,
        };

        let sent: &[Signal] = if exited {
            &[Signal::Terminate]
        } else {
            warn!(
                process = %self.name,
                ?timeout,
                "process did not exit in time; killing it"
            );
            if let Err(e) = run.send_signal(&self.name, Signal::Kill).await {
                debug!(process = %self.name, error = %e, "kill signal not delivered");
            }
            &[Signal::Terminate, Signal::Kill]
        };

        let report = run.wait_exit().await;

        // Dying from our own signal is what a stop asks for.
        if report.killed_by_any(sent) {
            return Ok(());
        }
        report.into_result(&self.name)
    }
}

impl Process for ManagedProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move { self.start_inner() })
    }

    fn stop(&self, timeout: Duration) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.stop_inner(timeout))
    }

    fn signal(&self, signal: Signal) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.signal_inner(signal))
    }

    fn wait(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.wait_inner())
    }

    fn is_running(&self) -> bool {
        self.running_run().is_some()
    }
}

impl fmt::Debug for ManagedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedProcess")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("dir", &self.dir)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ManagedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
