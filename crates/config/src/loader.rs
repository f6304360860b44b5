use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, error::ConfigError, schema::DocpilotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "docpilot.toml",
    "docpilot.yaml",
    "docpilot.yml",
    "docpilot.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<DocpilotConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./docpilot.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/docpilot/docpilot.{toml,yaml,yml,json}` (user-global)
///
/// Returns `DocpilotConfig::default()` if no config file is found or the
/// file cannot be loaded.
pub fn discover_and_load() -> DocpilotConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    DocpilotConfig::default()
}

/// Load an explicit config file, or fall back to discovery.
///
/// An explicit path that fails to load is an error; discovery never is.
pub fn load_or_discover(explicit: Option<&Path>) -> Result<DocpilotConfig, ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None => Ok(discover_and_load()),
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/docpilot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "docpilot").map(|d| d.config_dir().to_path_buf())
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<DocpilotConfig, ConfigError> {
    match extension(path) {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse raw config text into a format-neutral JSON value.
pub(crate) fn parse_value(raw: &str, path: &Path) -> Result<serde_json::Value, ConfigError> {
    match extension(path) {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_each_format() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("docpilot.toml");
        std::fs::write(&toml_path, "[monitor]\nchecks = 3\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().monitor.checks, 3);

        let yaml_path = dir.path().join("docpilot.yaml");
        std::fs::write(&yaml_path, "scrape:\n  max_pages: 4\n").unwrap();
        assert_eq!(load_config(&yaml_path).unwrap().scrape.max_pages, 4);

        let json_path = dir.path().join("docpilot.json");
        std::fs::write(&json_path, r#"{"browser": {"headless": false}}"#).unwrap();
        assert!(!load_config(&json_path).unwrap().browser.headless);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docpilot.ini");
        std::fs::write(&path, "checks=1").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_or_discover(Some(Path::new("/nonexistent/docpilot.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn fallback_placeholder_is_applied_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docpilot.toml");
        std::fs::write(
            &path,
            "[browser]\nsettle_ms = ${DOCPILOT_TEST_UNSET_SETTLE:-750}\n",
        )
        .unwrap();
        assert_eq!(load_config(&path).unwrap().browser.settle_ms, 750);
    }
}
