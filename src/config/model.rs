// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default Procfile location, relative to the current directory.
pub const DEFAULT_PROCFILE: &str = "Procfile";

/// Default env file; a missing default env file is not an error.
pub const DEFAULT_ENVFILE: &str = ".env";

pub const DEFAULT_BASE_PORT: u32 = 5000;

pub const DEFAULT_STOP_TIMEOUT: &str = "5s";

/// Settings file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// procfile = "Procfile"
/// envfile = ".env"
/// base_port = 5000
/// stop_timeout = "5s"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,
}

/// `[config]` section. The CLI builds one of these for its overrides too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Procfile declaring the processes to run.
    pub procfile: Option<PathBuf>,

    /// Env file whose entries are added to every process environment.
    pub envfile: Option<PathBuf>,

    /// Port handed to the first process as `PORT`; the next one gets +1.
    pub base_port: Option<u32>,

    /// Grace period between SIGTERM and SIGKILL on shutdown, e.g. `"5s"`.
    pub stop_timeout: Option<String>,
}

impl ConfigSection {
    /// Fill every unset key of `self` from `lower`.
    pub fn or(self, lower: ConfigSection) -> ConfigSection {
        ConfigSection {
            procfile: self.procfile.or(lower.procfile),
            envfile: self.envfile.or(lower.envfile),
            base_port: self.base_port.or(lower.base_port),
            stop_timeout: self.stop_timeout.or(lower.stop_timeout),
        }
    }
}

/// Validated settings used to build and drive the process group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub procfile: PathBuf,
    pub envfile: PathBuf,
    /// False when `envfile` is the implicit default, so it may be absent.
    pub envfile_required: bool,
    pub base_port: u16,
    pub stop_timeout: Duration,
}
