// src/config/validate.rs

use std::path::PathBuf;

use crate::config::duration::parse_duration;
use crate::config::model::{
    ConfigSection, DEFAULT_BASE_PORT, DEFAULT_ENVFILE, DEFAULT_PROCFILE, DEFAULT_STOP_TIMEOUT,
    Settings,
};
use crate::errors::{ProckerError, Result};

impl TryFrom<ConfigSection> for Settings {
    type Error = ProckerError;

    fn try_from(section: ConfigSection) -> std::result::Result<Self, Self::Error> {
        let base_port = validate_base_port(section.base_port.unwrap_or(DEFAULT_BASE_PORT))?;

        let timeout_str = section
            .stop_timeout
            .as_deref()
            .unwrap_or(DEFAULT_STOP_TIMEOUT);
        let stop_timeout = parse_duration(timeout_str).map_err(|e| {
            ProckerError::ConfigError(format!("[config].stop_timeout: {e}"))
        })?;

        let procfile = section
            .procfile
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROCFILE));
        if procfile.as_os_str().is_empty() {
            return Err(ProckerError::ConfigError(
                "[config].procfile must not be empty".to_string(),
            ));
        }

        let envfile_required = section.envfile.is_some();
        let envfile = section
            .envfile
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENVFILE));

        Ok(Settings {
            procfile,
            envfile,
            envfile_required,
            base_port,
            stop_timeout,
        })
    }
}

fn validate_base_port(port: u32) -> Result<u16> {
    match u16::try_from(port) {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(ProckerError::ConfigError(format!(
            "[config].base_port must be between 1 and 65535 (got {port})"
        ))),
    }
}
