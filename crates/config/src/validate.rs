//! Configuration validation.
//!
//! Parses the config file in its own format, flags unknown (often
//! misspelled) keys against the known schema, and reports type errors from a
//! full deserialization.

use std::path::{Path, PathBuf};

use crate::{
    env_subst::substitute_env,
    loader::{find_config_file, parse_config, parse_value},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "browser.headles"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Known sections and their fields, mirroring `schema.rs`.
const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    ("browser", &[
        "chrome_path",
        "headless",
        "viewport_width",
        "viewport_height",
        "device_scale_factor",
        "navigation_timeout_ms",
        "idle_timeout_ms",
        "settle_ms",
        "user_agent",
        "chrome_args",
    ]),
    ("monitor", &["checks", "interval_secs", "output"]),
    ("scrape", &["max_pages"]),
    ("spreadsheet", &["compare_row_limit"]),
];

fn section_fields(name: &str) -> Option<&'static [&'static str]> {
    KNOWN_SECTIONS
        .iter()
        .find(|(section, _)| *section == name)
        .map(|(_, fields)| *fields)
}

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

fn suggest<'a>(needle: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

fn unknown_key(result: &mut ValidationResult, path: String, key: &str, candidates: &[&str]) {
    let message = match suggest(key, candidates) {
        Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
        None => "unknown field".to_string(),
    };
    result.push(Severity::Error, path, message);
}

/// Validate a config file at the given path, or the discovered one.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let Some(path) = path.map(Path::to_path_buf).or_else(find_config_file) else {
        let mut result = ValidationResult::default();
        result.push(Severity::Info, "", "no config file found; using defaults");
        return result;
    };

    let mut result = match std::fs::read_to_string(&path) {
        Ok(raw) => validate_str(&substitute_env(&raw), &path),
        Err(e) => {
            let mut result = ValidationResult::default();
            result.push(
                Severity::Error,
                "",
                format!("failed to read config file: {e}"),
            );
            result
        },
    };
    result.config_path = Some(path);
    result
}

/// Validate raw config text; `path` only selects the format.
#[must_use]
pub fn validate_str(raw: &str, path: &Path) -> ValidationResult {
    let mut result = ValidationResult::default();

    let value = match parse_value(raw, path) {
        Ok(v) => v,
        Err(e) => {
            result.push(Severity::Error, "", format!("syntax error: {e}"));
            return result;
        },
    };

    let section_names: Vec<&str> = KNOWN_SECTIONS.iter().map(|(name, _)| *name).collect();

    if let Some(table) = value.as_object() {
        for (key, child) in table {
            let Some(fields) = section_fields(key) else {
                unknown_key(&mut result, key.clone(), key, &section_names);
                continue;
            };
            let Some(child) = child.as_object() else {
                result.push(Severity::Error, key.clone(), "expected a table");
                continue;
            };
            for field in child.keys() {
                if !fields.contains(&field.as_str()) {
                    unknown_key(&mut result, format!("{key}.{field}"), field, fields);
                }
            }
        }
    }

    match parse_config(raw, path) {
        Ok(cfg) => {
            if cfg.monitor.checks == 0 {
                result.push(
                    Severity::Warning,
                    "monitor.checks",
                    "0 checks produces an empty report",
                );
            }
            if cfg.browser.settle_ms > cfg.browser.navigation_timeout_ms {
                result.push(
                    Severity::Warning,
                    "browser.settle_ms",
                    "settle delay is longer than the navigation timeout",
                );
            }
        },
        Err(e) => result.push(Severity::Error, "", format!("type error: {e}")),
    }

    result
}
