//! Configuration loading, env substitution, and validation.
//!
//! Config files: `docpilot.toml`, `docpilot.yaml`, `docpilot.yml` or
//! `docpilot.json`, searched in `./` then `~/.config/docpilot/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::ConfigError,
    loader::{config_dir, discover_and_load, find_config_file, load_config, load_or_discover},
    schema::{
        BrowserSection, DocpilotConfig, MonitorSection, ScrapeSection, SpreadsheetSection,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
