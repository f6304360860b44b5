//! Browser configuration and shared request types.

use {
    serde::{Deserialize, Serialize},
    tracing::warn,
};

use crate::error::BrowserError;

/// Browser configuration resolved from the config file and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    /// Whether to run in headless mode.
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_scale_factor: f64,
    /// Navigation and CDP request timeout in milliseconds.
    pub navigation_timeout_ms: u64,
    /// Upper bound on the network-idle wait after navigation.
    pub idle_timeout_ms: u64,
    /// Fixed delay after the page goes idle.
    pub settle_ms: u64,
    pub user_agent: Option<String>,
    pub chrome_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::from(&docpilot_config::BrowserSection::default())
    }
}

impl From<&docpilot_config::BrowserSection> for BrowserConfig {
    fn from(cfg: &docpilot_config::BrowserSection) -> Self {
        Self {
            chrome_path: cfg.chrome_path.clone(),
            headless: cfg.headless,
            viewport_width: cfg.viewport_width,
            viewport_height: cfg.viewport_height,
            device_scale_factor: cfg.device_scale_factor,
            navigation_timeout_ms: cfg.navigation_timeout_ms,
            idle_timeout_ms: cfg.idle_timeout_ms,
            settle_ms: cfg.settle_ms,
            user_agent: cfg.user_agent.clone(),
            chrome_args: cfg.chrome_args.clone(),
        }
    }
}

/// Page rendering options for print-to-PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    pub landscape: bool,
    pub print_background: bool,
    /// Paper width in inches.
    pub paper_width: f64,
    /// Paper height in inches.
    pub paper_height: f64,
    /// Uniform margin in inches.
    pub margin: f64,
    pub scale: f64,
}

impl Default for PdfOptions {
    fn default() -> Self {
        // US Letter
        Self {
            landscape: false,
            print_background: true,
            paper_width: 8.5,
            paper_height: 11.0,
            margin: 0.4,
            scale: 1.0,
        }
    }
}

/// Validate a URL before attempting navigation.
///
/// Only non-empty, parseable http/https URLs are accepted.
pub fn validate_url(url: &str) -> Result<url::Url, BrowserError> {
    if url.trim().is_empty() {
        return Err(BrowserError::InvalidUrl("URL cannot be empty".to_string()));
    }

    let parsed = url::Url::parse(url)
        .map_err(|e| BrowserError::InvalidUrl(format!("'{}': {e}", truncate_url(url))))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => {
            warn!(url = %truncate_url(url), scheme, "rejecting non-http URL");
            Err(BrowserError::InvalidUrl(format!(
                "unsupported scheme '{scheme}', only http/https allowed"
            )))
        },
    }
}

/// Truncate a URL for error messages.
fn truncate_url(url: &str) -> String {
    match url.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &url[..idx]),
        None => url.to_string(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn defaults_follow_config_section() {
        let cfg = BrowserConfig::default();
        assert!(cfg.headless);
        assert_eq!(cfg.navigation_timeout_ms, 30_000);
        assert_eq!(cfg.settle_ms, 2_000);
    }

    #[rstest]
    #[case("https://example.com")]
    #[case("http://localhost:8080/dashboard?tab=1")]
    fn accepts_http_urls(#[case] url: &str) {
        assert!(validate_url(url).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("not a url")]
    #[case("ftp://example.com")]
    #[case("file:///etc/passwd")]
    #[case("javascript:alert(1)")]
    fn rejects_bad_urls(#[case] url: &str) {
        assert!(matches!(validate_url(url), Err(BrowserError::InvalidUrl(_))));
    }

    #[test]
    fn long_urls_are_truncated_in_errors() {
        let long = format!("ftp://{}", "a".repeat(300));
        assert!(truncate_url(&long).len() < 110);
    }
}
