//! Config schema types (browser, monitor, scrape, spreadsheet).

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocpilotConfig {
    pub browser: BrowserSection,
    pub monitor: MonitorSection,
    pub scrape: ScrapeSection,
    pub spreadsheet: SpreadsheetSection,
}

/// Browser launch and page-readiness settings shared by every browser skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    /// Whether to run in headless mode.
    pub headless: bool,
    /// Default viewport width.
    pub viewport_width: u32,
    /// Default viewport height.
    pub viewport_height: u32,
    /// Device scale factor for screenshots.
    pub device_scale_factor: f64,
    /// Navigation and CDP request timeout in milliseconds.
    pub navigation_timeout_ms: u64,
    /// Upper bound on the network-idle wait after navigation.
    pub idle_timeout_ms: u64,
    /// Fixed delay after the page goes idle, for late client-side rendering.
    pub settle_ms: u64,
    /// User agent string (uses default if not set).
    pub user_agent: Option<String>,
    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            device_scale_factor: 1.0,
            navigation_timeout_ms: 30_000,
            idle_timeout_ms: 15_000,
            settle_ms: 2_000,
            user_agent: None,
            chrome_args: Vec::new(),
        }
    }
}

/// Defaults for `docpilot monitor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Number of checks per run.
    pub checks: u32,
    /// Seconds to sleep between checks.
    pub interval_secs: u64,
    /// Report path used when `--output` is not given.
    pub output: Option<String>,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            checks: 1,
            interval_secs: 60,
            output: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSection {
    /// Default page cap when a scrape config does not set one.
    pub max_pages: u32,
}

impl Default for ScrapeSection {
    fn default() -> Self {
        Self { max_pages: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetSection {
    /// Maximum number of rows examined by `sheet compare`.
    pub compare_row_limit: u32,
}

impl Default for SpreadsheetSection {
    fn default() -> Self {
        Self {
            compare_row_limit: 100,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg: DocpilotConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, DocpilotConfig::default());
        assert!(cfg.browser.headless);
        assert_eq!(cfg.monitor.checks, 1);
        assert_eq!(cfg.spreadsheet.compare_row_limit, 100);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: DocpilotConfig = toml::from_str(
            r#"
            [browser]
            headless = false
            settle_ms = 500

            [monitor]
            checks = 5
            "#,
        )
        .unwrap();
        assert!(!cfg.browser.headless);
        assert_eq!(cfg.browser.settle_ms, 500);
        assert_eq!(cfg.browser.navigation_timeout_ms, 30_000);
        assert_eq!(cfg.monitor.checks, 5);
        assert_eq!(cfg.monitor.interval_secs, 60);
    }
}
