// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::process::ExitStatus;

use thiserror::Error;

use crate::types::Signal;

#[derive(Error, Debug)]
pub enum ProckerError {
    #[error("already started")]
    AlreadyStarted,

    #[error("not started")]
    NotStarted,

    #[error("process '{name}' has an empty command")]
    EmptyCommand { name: String },

    #[error("failed to start '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process '{name}' exited with {status}")]
    Exited { name: String, status: ExitStatus },

    #[error("lost track of process '{name}': {reason}")]
    ExitLost { name: String, reason: String },

    #[error("failed to send {signal} to '{name}': {reason}")]
    Signal {
        name: String,
        signal: Signal,
        reason: String,
    },

    #[error("{} processes failed: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<ProckerError>),

    #[error("task driving '{name}' panicked")]
    MemberPanicked { name: String },

    #[error("parse error: invalid line {line_no} found: '{line}'")]
    ManifestParse { line_no: usize, line: String },

    #[error("env parse error: invalid line {line_no} found: '{line}'")]
    EnvParse { line_no: usize, line: String },

    #[error("no process to run")]
    NoProcesses,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProckerError {
    /// Flatten nested `Multiple` errors into a list of leaf errors.
    pub fn into_leaves(self) -> Vec<ProckerError> {
        match self {
            ProckerError::Multiple(errors) => {
                errors.into_iter().flat_map(|e| e.into_leaves()).collect()
            }
            other => vec![other],
        }
    }
}

fn join_errors(errors: &[ProckerError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ProckerError>;
