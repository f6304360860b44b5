//! Reading skill payloads and writing reports as JSON files.

use std::path::Path;

use {
    serde::{Serialize, de::DeserializeOwned},
    tracing::debug,
};

use crate::error::{Error, Result};

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::message(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::message(format!("failed to parse {}: {e}", path.display())))
}

/// Serialize `value` as pretty JSON and write it to `path`.
///
/// Parent directories are created when missing.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body)?;
    debug!(path = %path.display(), "wrote JSON report");
    Ok(())
}

/// Render `value` as pretty JSON for stdout.
pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
