//! Process-wide configuration (spec §3 "Options"): built once at CLI
//! parse time, read-only for the rest of the run (spec §5 "Process-wide
//! state").

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Options {
    pub workflow: PathBuf,
    pub branch: String,
    pub merge_branch: String,
    pub auto: bool,
    pub quiet: bool,
    pub print: bool,
    pub logfile: Option<PathBuf>,
    pub vars: IndexMap<String, String>,
    pub debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            workflow: PathBuf::from("./workflow.d"),
            branch: String::new(),
            merge_branch: String::new(),
            auto: false,
            quiet: false,
            print: false,
            logfile: None,
            vars: IndexMap::new(),
            debug: false,
        }
    }
}

/// Parses `k=v,k=v` into an ordered map, rejecting any value that
/// itself contains `=` (Open Question decision: an unlimited split on
/// `=` within one pair is a user error, not a feature).
pub fn parse_vars(raw: &str) -> Result<IndexMap<String, String>> {
    let mut vars = IndexMap::new();
    if raw.is_empty() {
        return Ok(vars);
    }
    for pair in raw.split(',') {
        let parts: Vec<&str> = pair.split('=').collect();
        if parts.len() != 2 {
            return Err(Error::InvalidArgument {
                arg: pair.to_string(),
                hint: "expected exactly one '=' per k=v pair".to_string(),
            });
        }
        vars.insert(parts[0].to_string(), parts[1].to_string());
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_pairs_in_order() {
        let vars = parse_vars("a=1,b=2").unwrap();
        assert_eq!(vars.get("a").map(String::as_str), Some("1"));
        assert_eq!(vars.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn empty_string_yields_no_vars() {
        assert!(parse_vars("").unwrap().is_empty());
    }

    #[test]
    fn value_containing_equals_is_rejected() {
        let err = parse_vars("a=1=2").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn missing_equals_is_rejected() {
        let err = parse_vars("a").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
