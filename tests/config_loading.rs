// tests/config_loading.rs

mod common;
use crate::common::init_tracing;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::tempdir;

use procker::config::{ConfigSection, load_settings};
use procker::errors::ProckerError;

#[test]
fn defaults_apply_without_settings_file() {
    init_tracing();

    let settings = load_settings(None, ConfigSection::default()).unwrap();
    assert_eq!(settings.procfile, PathBuf::from("Procfile"));
    assert_eq!(settings.envfile, PathBuf::from(".env"));
    assert!(!settings.envfile_required);
    assert_eq!(settings.base_port, 5000);
    assert_eq!(settings.stop_timeout, Duration::from_secs(5));
}

#[test]
fn settings_file_overrides_defaults_relative_to_itself() {
    init_tracing();

    let dir = tempdir().unwrap();
    let path = dir.path().join("Procker.toml");
    fs::write(
        &path,
        r#"
[config]
procfile = "Procfile.dev"
envfile = "dev.env"
base_port = 8000
stop_timeout = "1500ms"
"#,
    )
    .unwrap();

    let settings = load_settings(Some(&path), ConfigSection::default()).unwrap();
    assert_eq!(settings.procfile, dir.path().join("Procfile.dev"));
    assert_eq!(settings.envfile, dir.path().join("dev.env"));
    assert!(settings.envfile_required);
    assert_eq!(settings.base_port, 8000);
    assert_eq!(settings.stop_timeout, Duration::from_millis(1500));
}

#[test]
fn cli_flags_win_over_settings_file() {
    init_tracing();

    let dir = tempdir().unwrap();
    let path = dir.path().join("Procker.toml");
    fs::write(&path, "[config]\nbase_port = 8000\nstop_timeout = \"1m\"\n").unwrap();

    let overrides = ConfigSection {
        procfile: Some(PathBuf::from("other/Procfile")),
        base_port: Some(9000),
        ..ConfigSection::default()
    };
    let settings = load_settings(Some(&path), overrides).unwrap();
    assert_eq!(settings.procfile, PathBuf::from("other/Procfile"));
    assert_eq!(settings.base_port, 9000);
    assert_eq!(settings.stop_timeout, Duration::from_secs(60));
    assert!(!settings.envfile_required);
}

#[test]
fn invalid_values_are_rejected() {
    init_tracing();

    let dir = tempdir().unwrap();
    let path = dir.path().join("Procker.toml");

    fs::write(&path, "[config]\nstop_timeout = \"soon\"\n").unwrap();
    let err = load_settings(Some(&path), ConfigSection::default()).unwrap_err();
    assert!(
        matches!(err, ProckerError::ConfigError(ref msg) if msg.contains("stop_timeout")),
        "unexpected error: {err}"
    );

    fs::write(&path, "[config]\nbase_port = 70000\n").unwrap();
    let err = load_settings(Some(&path), ConfigSection::default()).unwrap_err();
    assert!(matches!(err, ProckerError::ConfigError(ref msg) if msg.contains("base_port")));

    fs::write(&path, "[config]\nport = 1\n").unwrap();
    let err = load_settings(Some(&path), ConfigSection::default()).unwrap_err();
    assert!(matches!(err, ProckerError::TomlError(_)));
}

#[test]
fn explicit_settings_file_must_exist() {
    let dir = tempdir().unwrap();
    let err = load_settings(Some(&dir.path().join("nope.toml")), ConfigSection::default())
        .unwrap_err();
    assert!(matches!(err, ProckerError::IoError(_)));
}
