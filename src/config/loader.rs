// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigSection, RawConfigFile, Settings};
use crate::errors::Result;

/// Load a settings file from a given path without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Resolve the effective settings.
///
/// Relative paths inside a settings file are taken relative to that file.
///
/// Precedence, highest first:
/// - `overrides` (CLI flags),
/// - the settings file: `path` if given (must exist), otherwise
///   [`default_config_path`] when present,
/// - built-in defaults.
pub fn load_settings(path: Option<&Path>, overrides: ConfigSection) -> Result<Settings> {
    let from_file = match path {
        Some(path) => Some(load_file_section(path)?),
        None => {
            let default_path = default_config_path();
            if default_path.is_file() {
                Some(load_file_section(&default_path)?)
            } else {
                debug!(path = ?default_path, "no settings file; using defaults");
                None
            }
        }
    };

    Settings::try_from(overrides.or(from_file.unwrap_or_default()))
}

/// Read `path` and make its file paths relative to the file's own directory.
fn load_file_section(path: &Path) -> Result<ConfigSection> {
    let mut section = load_from_path(path)?.config;

    if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        section.procfile = section.procfile.map(|p| base.join(p));
        section.envfile = section.envfile.map(|p| base.join(p));
    }

    debug!(path = ?path, ?section, "loaded settings file");
    Ok(section)
}

/// Settings file looked up in the current directory when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Procker.toml")
}
