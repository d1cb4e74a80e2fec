// src/config/mod.rs

//! Supervisor settings: optional `Procker.toml` merged with CLI flags.
//!
//! - [`model`] holds the serde types and the validated [`Settings`].
//! - [`loader`] reads the file and applies precedence.
//! - [`validate`] turns a merged [`ConfigSection`] into [`Settings`].

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_from_path, load_settings};
pub use model::{ConfigSection, RawConfigFile, Settings};
