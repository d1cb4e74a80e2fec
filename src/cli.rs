// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::ConfigSection;

/// Command-line arguments for `procker`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procker",
    version,
    about = "Run your application's processes together, as declared in a Procfile.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCKER_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the processes declared in a Procfile.
    Start(StartArgs),
    /// Run a single command using the application's environment.
    Run(RunArgs),
}

/// Options shared by every subcommand that reads the env file.
#[derive(Debug, Clone, Args)]
pub struct EnvArgs {
    /// Settings file (TOML). Default: `Procker.toml` if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// File containing environment variables to be used.
    #[arg(short = 'e', long, value_name = "PATH")]
    pub envfile: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct StartArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Procfile declaring commands to run.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub procfile: Option<PathBuf>,

    /// Base port to be used by processes.
    #[arg(short = 'p', long, value_name = "PORT")]
    pub base_port: Option<u32>,

    /// Time for graceful stop of processes (`5`, `5s`, `500ms`).
    #[arg(short = 't', long, value_name = "DURATION")]
    pub stop_timeout: Option<String>,

    /// Parse and validate, print the processes, but don't start anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Only start these processes (default: all of them).
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,
}

impl StartArgs {
    /// Flags that override the settings file.
    pub fn overrides(&self) -> ConfigSection {
        ConfigSection {
            procfile: self.procfile.clone(),
            envfile: self.env.envfile.clone(),
            base_port: self.base_port,
            stop_timeout: self.stop_timeout.as_deref().map(seconds_if_bare),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Command to run, with its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl RunArgs {
    pub fn overrides(&self) -> ConfigSection {
        ConfigSection {
            envfile: self.env.envfile.clone(),
            ..ConfigSection::default()
        }
    }
}

/// `-t 5` keeps meaning five seconds.
fn seconds_if_bare(value: &str) -> String {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{trimmed}s")
    } else {
        trimmed.to_string()
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
