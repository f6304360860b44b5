//! Chromium executable discovery and install guidance.

use std::{fmt, path::PathBuf};

/// Environment variable that overrides browser discovery.
pub const CHROME_ENV: &str = "CHROME";

/// Chromium-based executable names searched on `PATH`.
/// All of these speak the Chrome DevTools Protocol.
const CHROMIUM_EXECUTABLES: &[&str] = &[
    "chrome",
    "chrome-browser",
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "msedge",
    "microsoft-edge",
    "microsoft-edge-stable",
    "brave",
    "brave-browser",
];

#[cfg(target_os = "macos")]
const PLATFORM_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "windows")]
const PLATFORM_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_PATHS: &[&str] = &[];

/// Where a detected browser came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// `--chrome-path` or `browser.chrome_path`.
    Configured,
    /// The `CHROME` environment variable.
    Environment,
    /// A well-known install location for this platform.
    Platform,
    /// A known executable name on `PATH`.
    SearchPath,
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Configured => "configured",
            Self::Environment => "environment",
            Self::Platform => "platform",
            Self::SearchPath => "path",
        };
        f.write_str(s)
    }
}

/// A browser executable that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedBrowser {
    pub path: PathBuf,
    pub source: DetectionSource,
}

/// Detect a Chromium-based browser.
///
/// Checks (in order):
/// 1. `custom_path` from the CLI or config file
/// 2. `CHROME` environment variable
/// 3. Platform-specific install paths (more reliable than `PATH` wrappers)
/// 4. Known executable names on `PATH`
pub fn detect_browser(custom_path: Option<&str>) -> Option<DetectedBrowser> {
    detect_with(custom_path, std::env::var(CHROME_ENV).ok().as_deref())
}

fn detect_with(custom_path: Option<&str>, env_path: Option<&str>) -> Option<DetectedBrowser> {
    let existing = |path: &str, source| {
        let p = PathBuf::from(path);
        p.exists().then_some(DetectedBrowser { path: p, source })
    };

    if let Some(found) = custom_path.and_then(|p| existing(p, DetectionSource::Configured)) {
        return Some(found);
    }
    if let Some(found) = env_path.and_then(|p| existing(p, DetectionSource::Environment)) {
        return Some(found);
    }
    if let Some(found) = PLATFORM_PATHS
        .iter()
        .find_map(|p| existing(p, DetectionSource::Platform))
    {
        return Some(found);
    }

    CHROMIUM_EXECUTABLES.iter().find_map(|name| {
        which::which(name).ok().map(|path| DetectedBrowser {
            path,
            source: DetectionSource::SearchPath,
        })
    })
}

/// Platform-specific install instructions.
pub fn install_instructions() -> String {
    let instructions = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome\n  \
         # Alternatives: chromium, brave-browser, microsoft-edge"
    } else if cfg!(target_os = "linux") {
        "  Debian/Ubuntu: sudo apt install chromium-browser\n  \
         Fedora:         sudo dnf install chromium\n  \
         Arch:           sudo pacman -S chromium"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else {
        "  Download from https://www.google.com/chrome/"
    };

    format!(
        "No Chromium-based browser found. Install one:\n\n\
         {instructions}\n\n\
         Or point docpilot at an existing binary:\n  \
         --chrome-path /path/to/browser\n  \
         [browser] chrome_path = \"/path/to/browser\" in docpilot.toml\n  \
         {CHROME_ENV}=/path/to/browser"
    )
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_instructions_mention_overrides() {
        let hint = install_instructions();
        assert!(hint.contains("--chrome-path"));
        assert!(hint.contains(CHROME_ENV));
    }

    #[test]
    fn configured_path_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let configured = dir.path().join("my-chrome");
        let from_env = dir.path().join("env-chrome");
        std::fs::write(&configured, "").unwrap();
        std::fs::write(&from_env, "").unwrap();

        let found = detect_with(configured.to_str(), from_env.to_str()).unwrap();
        assert_eq!(found.path, configured);
        assert_eq!(found.source, DetectionSource::Configured);
    }

    #[test]
    fn environment_used_when_configured_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        let from_env = dir.path().join("env-chrome");
        std::fs::write(&from_env, "").unwrap();

        let found = detect_with(Some("/nonexistent/chrome"), from_env.to_str()).unwrap();
        assert_eq!(found.path, from_env);
        assert_eq!(found.source, DetectionSource::Environment);
    }

    #[test]
    fn missing_overrides_fall_through() {
        // Whatever is found (if anything) must come from the system search.
        if let Some(found) = detect_with(Some("/nonexistent/a"), Some("/nonexistent/b")) {
            assert!(matches!(
                found.source,
                DetectionSource::Platform | DetectionSource::SearchPath
            ));
        }
    }

    #[test]
    fn executable_list_covers_chrome_and_chromium() {
        assert!(CHROMIUM_EXECUTABLES.contains(&"chrome"));
        assert!(CHROMIUM_EXECUTABLES.contains(&"chromium"));
    }
}
