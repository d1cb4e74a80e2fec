// src/manifest/procfile.rs

//! Procfile parsing: one `name: command` declaration per line.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{ProckerError, Result};

static PROCFILE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+):\s*(.+)$").expect("procfile pattern is valid")
});

/// Parse Procfile content into a `name -> command` map.
///
/// Blank lines are skipped. Any other line that does not match
/// `name: command` aborts parsing with [`ProckerError::ManifestParse`].
pub fn parse_procfile<R: BufRead>(reader: R) -> Result<BTreeMap<String, String>> {
    let mut processes = BTreeMap::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let caps = PROCFILE_LINE_RE
            .captures(line)
            .ok_or_else(|| ProckerError::ManifestParse {
                line_no: idx + 1,
                line: line.to_string(),
            })?;

        let name = caps[1].to_string();
        let command = caps[2].trim().to_string();
        if let Some(previous) = processes.insert(name.clone(), command) {
            warn!(process = %name, %previous, "duplicate Procfile entry; keeping the later one");
        }
    }

    debug!(count = processes.len(), "parsed Procfile");
    Ok(processes)
}

/// Open and parse the Procfile at `path`.
pub fn load_procfile(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
    let file = File::open(path.as_ref())?;
    parse_procfile(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_declaration() {
        let input = "web:     python ranking/manage.py runserver\n\
                     db:      postgres -D /usr/local/var/postgres\n\
                     redis:   redis-server /usr/local/etc/redis.conf";
        let p = parse_procfile(input.as_bytes()).unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p["web"], "python ranking/manage.py runserver");
        assert_eq!(p["db"], "postgres -D /usr/local/var/postgres");
        assert_eq!(p["redis"], "redis-server /usr/local/etc/redis.conf");
    }

    #[test]
    fn ignores_blank_lines() {
        let input = "web: run web\n\n     \n\ndb: run db\n\n";
        let p = parse_procfile(input.as_bytes()).unwrap();
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn rejects_hyphenated_names_with_line_number() {
        let input = "job: bundle exec rake jobs:work\nweb-9: bundle exec thin start";
        match parse_procfile(input.as_bytes()) {
            Err(ProckerError::ManifestParse { line_no, line }) => {
                assert_eq!(line_no, 2);
                assert_eq!(line, "web-9: bundle exec thin start");
            }
            other => panic!("expected ManifestParse, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_command() {
        assert!(parse_procfile("web:   ".as_bytes()).is_err());
    }

    #[test]
    fn later_duplicate_replaces_earlier() {
        let p = parse_procfile("web: one\nweb: two".as_bytes()).unwrap();
        assert_eq!(p["web"], "two");
    }
}
