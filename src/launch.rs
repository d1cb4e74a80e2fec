// src/launch.rs

//! Turn a parsed Procfile plus settings into concrete processes.
//!
//! Port numbers follow the Procfile's name order (not the selection order),
//! so `procker start web` gives `web` the same `PORT` as a full start.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::{ProckerError, Result};
use crate::process::{ManagedProcess, OutputSink, PrefixedWriter, line_label};

/// One process to be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessPlan {
    pub name: String,
    pub command: String,
    pub port: u16,
    /// Full `KEY=VALUE` environment, `PORT` last.
    pub env: Vec<String>,
}

impl ProcessPlan {
    /// Build the managed process, labelling both output streams.
    pub fn into_managed(self, dir: &Path, width: usize) -> ManagedProcess {
        let label = line_label(&self.name, width);
        ManagedProcess::new(self.name, self.command)
            .with_dir(dir)
            .with_env(self.env)
            .with_stdout(OutputSink::new(PrefixedWriter::new(std::io::stdout(), label.clone())))
            .with_stderr(OutputSink::new(PrefixedWriter::new(std::io::stderr(), label)))
    }
}

/// Plan every selected Procfile entry.
///
/// An empty `selected` means all entries. Unknown names are skipped with a
/// warning. Fails with [`ProckerError::NoProcesses`] when nothing is left.
pub fn plan_processes(
    procfile: &BTreeMap<String, String>,
    selected: &[String],
    base_env: &[String],
    base_port: u16,
) -> Result<Vec<ProcessPlan>> {
    for name in selected {
        if !procfile.contains_key(name) {
            warn!(process = %name, "no such process in Procfile; ignoring");
        }
    }

    let mut plans = Vec::new();
    for (index, (name, command)) in procfile.iter().enumerate() {
        if !selected.is_empty() && !selected.contains(name) {
            continue;
        }

        let port = u16::try_from(index)
            .ok()
            .and_then(|offset| base_port.checked_add(offset))
            .ok_or_else(|| {
                ProckerError::ConfigError(format!(
                    "no port left for process `{name}` above base port {base_port}"
                ))
            })?;

        let mut env = base_env.to_vec();
        env.push(format!("PORT={port}"));

        plans.push(ProcessPlan {
            name: name.clone(),
            command: command.clone(),
            port,
            env,
        });
    }

    if plans.is_empty() {
        return Err(ProckerError::NoProcesses);
    }
    Ok(plans)
}

/// Width of the output label column: the longest selected name.
pub fn label_width(plans: &[ProcessPlan]) -> usize {
    plans.iter().map(|p| p.name.len()).max().unwrap_or(0)
}

/// Directory the processes run in: the one holding the Procfile.
///
/// A bare file name (parent = "") means the current directory.
pub fn procfile_dir(procfile: &Path) -> PathBuf {
    match procfile.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procfile() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("web".to_string(), "bin/web".to_string()),
            ("db".to_string(), "postgres".to_string()),
            ("worker".to_string(), "bin/worker".to_string()),
        ])
    }

    #[test]
    fn ports_follow_name_order() {
        let plans = plan_processes(&procfile(), &[], &[], 5000).unwrap();
        let got: Vec<_> = plans.iter().map(|p| (p.name.as_str(), p.port)).collect();
        assert_eq!(got, vec![("db", 5000), ("web", 5001), ("worker", 5002)]);
    }

    #[test]
    fn selection_keeps_full_start_ports() {
        let selected = vec!["worker".to_string(), "nope".to_string()];
        let plans = plan_processes(&procfile(), &selected, &[], 5000).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].name, "worker");
        assert_eq!(plans[0].port, 5002);
    }

    #[test]
    fn port_is_appended_after_base_env() {
        let base = vec!["PORT=1".to_string(), "A=b".to_string()];
        let plans = plan_processes(&procfile(), &["db".to_string()], &base, 7000).unwrap();
        assert_eq!(plans[0].env, vec!["PORT=1", "A=b", "PORT=7000"]);
    }

    #[test]
    fn empty_selection_result_is_an_error() {
        let err = plan_processes(&procfile(), &["ghost".to_string()], &[], 5000).unwrap_err();
        assert!(matches!(err, ProckerError::NoProcesses));

        let err = plan_processes(&BTreeMap::new(), &[], &[], 5000).unwrap_err();
        assert!(matches!(err, ProckerError::NoProcesses));
    }

    #[test]
    fn port_overflow_is_reported() {
        let err = plan_processes(&procfile(), &[], &[], u16::MAX).unwrap_err();
        assert!(matches!(err, ProckerError::ConfigError(msg) if msg.contains("`web`")));
    }

    #[test]
    fn label_width_fits_longest_selected_name() {
        let plans = plan_processes(&procfile(), &["db".to_string()], &[], 5000).unwrap();
        assert_eq!(label_width(&plans), "db".len());

        let plans = plan_processes(&procfile(), &[], &[], 5000).unwrap();
        assert_eq!(label_width(&plans), "worker".len());

        let mut long = procfile();
        long.insert("background-jobs".to_string(), "x".to_string());
        let plans = plan_processes(&long, &[], &[], 5000).unwrap();
        assert_eq!(label_width(&plans), "background-jobs".len());
    }

    #[test]
    fn procfile_dir_defaults_to_current() {
        assert_eq!(procfile_dir(Path::new("Procfile")), PathBuf::from("."));
        assert_eq!(procfile_dir(Path::new("app/Procfile")), PathBuf::from("app"));
    }
}
