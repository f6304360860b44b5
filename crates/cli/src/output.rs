//! Reading skill payloads and writing reports.

use std::path::Path;

use {
    anyhow::{Context, Result},
    docpilot_common::json,
    serde::{Serialize, de::DeserializeOwned},
    tracing::info,
};

fn is_inline(arg: &str) -> bool {
    let trimmed = arg.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// Parse a payload given either inline (`{...}` / `[...]`) or as a path to a
/// JSON file.
pub fn load_payload<T: DeserializeOwned>(arg: &str) -> Result<T> {
    if is_inline(arg) {
        serde_json::from_str(arg.trim_start()).context("invalid inline JSON")
    } else {
        Ok(json::read_json(Path::new(arg))?)
    }
}

/// Directory that relative paths inside a payload file resolve against.
/// Inline payloads resolve against the working directory.
pub fn payload_dir(arg: &str) -> Option<&Path> {
    if is_inline(arg) {
        None
    } else {
        Path::new(arg).parent()
    }
}

/// Write `report` as pretty JSON to `output`, or to stdout when no path is
/// given.
pub fn emit<T: Serialize + ?Sized>(report: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            json::write_json_pretty(path, report)?;
            info!(path = %path.display(), "report written");
        },
        None => println!("{}", json::to_pretty(report)?),
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::Value};

    #[rstest]
    #[case(r#"{"a": 1}"#, true)]
    #[case("  [1, 2]", true)]
    #[case("specs/deck.json", false)]
    #[case("{weird}.json", true)]
    fn inline_detection(#[case] arg: &str, #[case] expected: bool) {
        assert_eq!(is_inline(arg), expected);
    }

    #[test]
    fn inline_and_file_payloads() {
        let inline: Value = load_payload(r#" {"a": 1}"#).unwrap();
        assert_eq!(inline["a"], 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.json");
        std::fs::write(&path, r#"[1, 2]"#).unwrap();
        let from_file: Vec<u8> = load_payload(path.to_str().unwrap()).unwrap();
        assert_eq!(from_file, vec![1, 2]);
    }

    #[test]
    fn payload_dir_only_for_files() {
        assert_eq!(payload_dir("decks/q3.json"), Some(Path::new("decks")));
        assert_eq!(payload_dir(r#"{"slides": []}"#), None);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_payload::<Value>("/nonexistent/spec.json").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/spec.json"));
    }

    #[test]
    fn emit_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.json");
        emit(&serde_json::json!({ "ok": true }), Some(&path)).unwrap();
        let back: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["ok"], true);
    }
}
