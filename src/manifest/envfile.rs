// src/manifest/envfile.rs

//! `.env` style files: `KEY=VALUE` per line, values expanded as they are read.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{ProckerError, Result};
use crate::manifest::expand::expand;

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("env key pattern is valid"));

/// Parse an env file, falling back to the supervisor's own environment for
/// names the file has not defined (yet).
pub fn parse_env<R: BufRead>(reader: R) -> Result<Vec<String>> {
    parse_env_with(reader, |name| std::env::var(name).ok())
}

/// Parse an env file with an explicit fallback lookup.
///
/// Each value may reference `$NAME`: keys defined on earlier lines win, then
/// `fallback`, then the empty string. A reference to a key defined further
/// down is therefore not seen. Output keeps declaration order.
pub fn parse_env_with<R, F>(reader: R, fallback: F) -> Result<Vec<String>>
where
    R: BufRead,
    F: Fn(&str) -> Option<String>,
{
    let mut defined: HashMap<String, String> = HashMap::new();
    let mut env = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let invalid = || ProckerError::EnvParse {
            line_no: idx + 1,
            line: line.to_string(),
        };

        let (key, raw_value) = line.split_once('=').ok_or_else(invalid)?;
        let key = key.trim();
        if !KEY_RE.is_match(key) {
            return Err(invalid());
        }

        let value = expand(raw_value.trim(), |name| {
            defined.get(name).cloned().or_else(|| fallback(name))
        });

        env.push(format!("{key}={value}"));
        defined.insert(key.to_string(), value);
    }

    Ok(env)
}

/// Open and parse the env file at `path`.
pub fn load_env(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let file = File::open(path.as_ref())?;
    parse_env(BufReader::new(file))
}
