// src/manifest/mod.rs

//! Declarative inputs: the Procfile, env files and the `$NAME` expansion
//! helper they share with command templates.

pub mod envfile;
pub mod expand;
pub mod procfile;

pub use envfile::{load_env, parse_env, parse_env_with};
pub use expand::{env_to_map, expand, expand_with_env, split_command};
pub use procfile::{load_procfile, parse_procfile};
