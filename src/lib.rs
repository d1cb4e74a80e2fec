// src/lib.rs

pub mod cli;
pub mod config;
pub mod driver;
pub mod errors;
pub mod launch;
pub mod logging;
pub mod manifest;
pub mod process;
pub mod types;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, RunArgs, StartArgs};
use crate::config::{Settings, load_settings};
use crate::driver::{ShutdownFlag, drive, spawn_interrupt_listener};
use crate::launch::{ProcessPlan, label_width, plan_processes, procfile_dir};
use crate::manifest::{load_env, load_procfile};
use crate::process::{ManagedProcess, OutputSink, Process, ProcessGroup};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading (CLI > `Procker.toml` > defaults)
/// - Procfile + env file parsing
/// - the process group and its output labels
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Start(start_args) => start(start_args).await,
        Command::Run(run_args) => run_command(run_args).await,
    }
}

async fn start(args: StartArgs) -> Result<()> {
    let settings = load_settings(args.env.config.as_deref(), args.overrides())
        .context("loading settings")?;

    let procfile = load_procfile(&settings.procfile)
        .with_context(|| format!("reading Procfile {}", settings.procfile.display()))?;
    let env = app_environment(&settings)?;
    let plans = plan_processes(&procfile, &args.names, &env, settings.base_port)?;

    if args.dry_run {
        print_dry_run(&settings, &plans);
        return Ok(());
    }

    let dir = procfile_dir(&settings.procfile);
    let width = label_width(&plans);
    let members: Vec<Arc<dyn Process>> = plans
        .into_iter()
        .map(|plan| {
            info!("starting {} on port {}", plan.name, plan.port);
            Arc::new(plan.into_managed(&dir, width)) as Arc<dyn Process>
        })
        .collect();

    let group: Arc<dyn Process> = Arc::new(ProcessGroup::new(members));
    supervise(group, settings.stop_timeout).await
}

async fn run_command(args: RunArgs) -> Result<()> {
    let settings = load_settings(args.env.config.as_deref(), args.overrides())
        .context("loading settings")?;
    let env = app_environment(&settings)?;

    let process: Arc<dyn Process> = Arc::new(
        ManagedProcess::new("run", args.command.join(" "))
            .with_env(env)
            .with_stdout(OutputSink::stdout())
            .with_stderr(OutputSink::stderr()),
    );
    supervise(process, settings.stop_timeout).await
}

/// Start `target`, hand interrupts to the driver and wait for the exit.
///
/// Failures after a requested shutdown are expected and only logged.
async fn supervise(target: Arc<dyn Process>, stop_timeout: Duration) -> Result<()> {
    let flag = ShutdownFlag::default();

    if let Err(e) = target.start().await {
        // Members that did start must not outlive us.
        if let Err(stop_err) = target.stop(stop_timeout).await {
            debug!(error = %stop_err, "cleanup after failed start reported errors");
        }
        return Err(e).context("starting processes");
    }

    let driver = tokio::spawn(drive(
        Arc::clone(&target),
        stop_timeout,
        spawn_interrupt_listener(),
        flag.clone(),
    ));

    let outcome = target.wait().await;
    driver.abort();

    match outcome {
        Ok(()) => Ok(()),
        Err(e) if flag.is_requested() => {
            for leaf in e.into_leaves() {
                warn!(error = %leaf, "process did not exit cleanly");
            }
            Ok(())
        }
        Err(e) => Err(e).context("process failed"),
    }
}

/// Inherited environment, then the env file, in that order.
///
/// A missing default env file is skipped; a missing explicit one is not.
fn app_environment(settings: &Settings) -> Result<Vec<String>> {
    let mut env: Vec<String> = std::env::vars().map(|(k, v)| format!("{k}={v}")).collect();

    if settings.envfile_required || settings.envfile.is_file() {
        let from_file = load_env(&settings.envfile)
            .with_context(|| format!("reading env file {}", settings.envfile.display()))?;
        env.extend(from_file);
    } else {
        debug!(path = %settings.envfile.display(), "no env file; using inherited environment");
    }

    Ok(env)
}

/// Simple dry-run output: print settings and the processes `start` would run.
fn print_dry_run(settings: &Settings, plans: &[ProcessPlan]) {
    println!("procker dry-run");
    println!("  procfile = {}", settings.procfile.display());
    println!("  envfile = {}", settings.envfile.display());
    println!("  base_port = {}", settings.base_port);
    println!("  stop_timeout = {:?}", settings.stop_timeout);
    println!("  dir = {}", display_dir(&procfile_dir(&settings.procfile)));
    println!();

    println!("processes ({}):", plans.len());
    for plan in plans {
        println!("  - {}", plan.name);
        println!("      cmd: {}", plan.command);
        println!("      port: {}", plan.port);
    }

    debug!("dry-run complete (nothing started)");
}

fn display_dir(dir: &Path) -> String {
    std::path::absolute(dir)
        .unwrap_or_else(|_| dir.to_path_buf())
        .display()
        .to_string()
}
