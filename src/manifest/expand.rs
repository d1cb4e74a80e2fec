// src/manifest/expand.rs

//! `$NAME` / `${NAME}` substitution shared by command templates and env files.
//!
//! Semantics follow shell variable expansion rather than templating: a name
//! the lookup cannot resolve becomes an empty string, and a `$` that is not
//! followed by a variable name is left untouched.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z0-9_]+)\}|([A-Za-z0-9_]+))").expect("variable pattern is valid")
});

/// Expand every variable reference in `template` using `lookup`.
pub fn expand<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    VARIABLE_RE
        .replace_all(template, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}

/// Build a lookup map from `KEY=VALUE` strings.
///
/// Entries without `=` are skipped; a repeated key keeps its last value.
pub fn env_to_map<S: AsRef<str>>(env: &[S]) -> HashMap<String, String> {
    env.iter()
        .filter_map(|entry| entry.as_ref().split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Expand `template` against an environment list.
pub fn expand_with_env<S: AsRef<str>>(template: &str, env: &[S]) -> String {
    let vars = env_to_map(env);
    expand(template, |name| vars.get(name).cloned())
}

/// Split an expanded command line into program and arguments.
///
/// Splitting is purely on whitespace: quotes are not interpreted, so an
/// argument can never contain a space.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_and_blanks_unknown() {
        let env = ["MSG=hello", "OTHER=world"];
        assert_eq!(expand_with_env("echo -n $MSG", &env), "echo -n hello");
        assert_eq!(expand_with_env("echo $MISSING!", &env), "echo !");
        assert_eq!(expand_with_env("${MSG}_${OTHER}", &env), "hello_world");
    }

    #[test]
    fn lone_dollar_is_kept() {
        assert_eq!(expand("cost: $ 5", |_| None), "cost: $ 5");
        assert_eq!(expand("trailing$", |_| None), "trailing$");
    }

    #[test]
    fn last_duplicate_key_wins() {
        let map = env_to_map(&["A=1", "A=2", "broken"]);
        assert_eq!(map.get("A").map(String::as_str), Some("2"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn values_may_contain_equals() {
        let map = env_to_map(&["URL=postgres://u@h/db?x=1"]);
        assert_eq!(map["URL"], "postgres://u@h/db?x=1");
    }

    #[test]
    fn split_ignores_quotes() {
        assert_eq!(
            split_command("echo  'hello world'\t42"),
            vec!["echo", "'hello", "world'", "42"]
        );
        assert!(split_command("   ").is_empty());
    }
}
