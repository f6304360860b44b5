//! One Chromium process with a single reusable page.

use std::time::{Duration, Instant};

use {
    async_trait::async_trait,
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig, Page,
        cdp::browser_protocol::{
            emulation::SetDeviceMetricsOverrideParams,
            page::{CaptureScreenshotFormat, PrintToPdfParams},
        },
        handler::viewport::Viewport,
        page::ScreenshotParams,
    },
    futures::{StreamExt, future::BoxFuture},
    serde_json::Value,
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

use crate::{
    detect::{DetectedBrowser, detect_browser, install_instructions},
    driver::PageDriver,
    error::BrowserError,
    types::{BrowserConfig, PdfOptions},
};

/// Polled while waiting for the network to go quiet.
const IDLE_PROBE_JS: &str = r#"({
    ready: document.readyState,
    resources: performance.getEntriesByType('resource').length
})"#;

const IDLE_POLL: Duration = Duration::from_millis(250);

/// How long the resource count must stay unchanged to count as idle.
const IDLE_QUIET: Duration = Duration::from_millis(500);

/// Tracks consecutive idle polls.
#[derive(Debug, Default)]
pub(crate) struct IdleTracker {
    last_resources: Option<u64>,
    quiet: Duration,
}

impl IdleTracker {
    /// Record one poll; returns `true` once the page has been quiet long enough.
    pub(crate) fn observe(&mut self, ready: bool, resources: u64, elapsed: Duration) -> bool {
        if ready && self.last_resources == Some(resources) {
            self.quiet += elapsed;
        } else {
            self.quiet = Duration::ZERO;
        }
        self.last_resources = Some(resources);
        self.quiet >= IDLE_QUIET
    }
}

fn require_browser(found: Option<DetectedBrowser>) -> Result<DetectedBrowser, BrowserError> {
    found.ok_or_else(|| BrowserError::BrowserNotAvailable(install_instructions()))
}

/// A launched browser plus the page every check reuses.
///
/// Dropping the session aborts the CDP event task and lets `chromiumoxide`
/// kill the child process; [`close`](Self::close) does the same gracefully.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    config: BrowserConfig,
}

impl BrowserSession {
    /// Launch Chromium and open a blank page with the configured viewport.
    pub async fn launch(config: BrowserConfig) -> Result<Self, BrowserError> {
        let detected = require_browser(detect_browser(config.chrome_path.as_deref()))?;

        info!(
            path = %detected.path.display(),
            source = %detected.source,
            headless = config.headless,
            viewport_width = config.viewport_width,
            viewport_height = config.viewport_height,
            "launching browser"
        );

        let viewport = Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            device_scale_factor: Some(config.device_scale_factor),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        };

        let mut builder = CdpBrowserConfig::builder()
            .chrome_executable(&detected.path)
            .viewport(viewport)
            .request_timeout(Duration::from_millis(config.navigation_timeout_ms));

        // chromiumoxide runs headless unless asked for a window
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref ua) = config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }
        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox");

        let cdp_config = builder
            .build()
            .map_err(|e| BrowserError::LaunchFailed(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(cdp_config).await.map_err(|e| {
            BrowserError::LaunchFailed(format!("{e}\n\n{}", install_instructions()))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
            debug!("browser event handler exited");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // The browser-level viewport is not always applied to new pages.
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(config.viewport_width)
            .height(config.viewport_height)
            .device_scale_factor(config.device_scale_factor)
            .mobile(false)
            .build()
            .map_err(BrowserError::Cdp)?;
        if let Err(e) = page.execute(metrics).await {
            warn!(error = %e, "failed to set page viewport");
        }

        Ok(Self {
            browser,
            page,
            handler,
            config,
        })
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Close the browser and wait for the process to exit.
    pub async fn close(mut self) -> Result<(), BrowserError> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "waiting for browser exit failed");
        }
        self.handler.abort();
        closed?;
        info!("browser closed");
        Ok(())
    }

    async fn idle_probe(&self) -> Result<(bool, u64), BrowserError> {
        let v: Value = self
            .page
            .evaluate(IDLE_PROBE_JS)
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?;
        let ready = v["ready"].as_str() == Some("complete");
        let resources = v["resources"].as_u64().unwrap_or(0);
        Ok((ready, resources))
    }
}

/// Launch a session, run `f` on it, and close it whether `f` succeeded or not.
///
/// ```ignore
/// let results = with_session(config, move |session| {
///     Box::pin(async move { Ok(run_monitor(session, &options).await) })
/// })
/// .await?;
/// ```
pub async fn with_session<T, F>(config: BrowserConfig, f: F) -> Result<T, BrowserError>
where
    F: for<'s> FnOnce(&'s mut BrowserSession) -> BoxFuture<'s, Result<T, BrowserError>>,
{
    let mut session = BrowserSession::launch(config).await?;
    let result = f(&mut session).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close browser cleanly");
    }
    result
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        let start = Instant::now();
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(format!("{url}: {e}")))?;
        debug!(
            url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "navigated"
        );
        Ok(())
    }

    async fn wait_for_idle(&mut self) -> Result<(), BrowserError> {
        let deadline = Instant::now() + Duration::from_millis(self.config.idle_timeout_ms);
        let mut tracker = IdleTracker::default();

        loop {
            let (ready, resources) = self.idle_probe().await?;
            if tracker.observe(ready, resources, IDLE_POLL) {
                debug!(resources, "page network idle");
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    timeout_ms = self.config.idle_timeout_ms,
                    resources, "page never went idle, continuing"
                );
                break;
            }
            tokio::time::sleep(IDLE_POLL).await;
        }

        tokio::time::sleep(Duration::from_millis(self.config.settle_ms)).await;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, BrowserError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        debug!(selector, "clicked element");
        Ok(())
    }

    async fn type_into(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        element.type_str(text).await?;
        debug!(selector, chars = text.chars().count(), "typed text");
        Ok(())
    }

    async fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>, BrowserError> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(full_page)
                    .build(),
            )
            .await
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))
    }

    async fn pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, BrowserError> {
        let params = PrintToPdfParams {
            landscape: Some(options.landscape),
            print_background: Some(options.print_background),
            paper_width: Some(options.paper_width),
            paper_height: Some(options.paper_height),
            margin_top: Some(options.margin),
            margin_bottom: Some(options.margin),
            margin_left: Some(options.margin),
            margin_right: Some(options.margin),
            scale: Some(options.scale),
            ..Default::default()
        };
        self.page
            .pdf(params)
            .await
            .map_err(|e| BrowserError::PdfFailed(e.to_string()))
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_browser_explains_how_to_install() {
        let err = require_browser(None).unwrap_err();
        assert!(matches!(err, BrowserError::BrowserNotAvailable(_)));
        assert!(err.to_string().contains("--chrome-path"));
    }

    #[test]
    fn idle_requires_ready_document() {
        let mut tracker = IdleTracker::default();
        for _ in 0..10 {
            assert!(!tracker.observe(false, 4, IDLE_POLL));
        }
    }

    #[test]
    fn idle_after_quiet_window() {
        let mut tracker = IdleTracker::default();
        assert!(!tracker.observe(true, 3, IDLE_POLL));
        assert!(!tracker.observe(true, 3, IDLE_POLL));
        assert!(tracker.observe(true, 3, IDLE_POLL));
    }

    #[test]
    fn new_requests_reset_the_quiet_window() {
        let mut tracker = IdleTracker::default();
        assert!(!tracker.observe(true, 3, IDLE_POLL));
        assert!(!tracker.observe(true, 3, IDLE_POLL));
        assert!(!tracker.observe(true, 7, IDLE_POLL));
        assert!(!tracker.observe(true, 7, IDLE_POLL));
        assert!(tracker.observe(true, 7, IDLE_POLL));
    }
}
