//! Chromium-driven skills over CDP.
//!
//! A [`BrowserSession`] owns one Chromium process and a single page that is
//! reused for every operation in a run. The skills only need the
//! [`PageDriver`] surface, so each one is a plain async function taking
//! `&mut dyn PageDriver`:
//!
//! - **monitor**: repeated dashboard health checks with an anomaly checklist
//! - **tags**: tag-manager and analytics installation report
//! - **extract**: named fields from a selector map
//! - **scrape**: repeated items across paginated listings
//! - **form**: fill and submit a form
//! - **capture**: screenshots and print-to-PDF
//!
//! # Example
//!
//! ```ignore
//! use docpilot_browser::{BrowserConfig, with_session, monitor::{MonitorOptions, run_monitor}};
//!
//! let options = MonitorOptions { url, checks: 3, interval: Duration::from_secs(60) };
//! let results = with_session(BrowserConfig::default(), move |session| {
//!     Box::pin(async move { Ok(run_monitor(session, &options).await) })
//! })
//! .await?;
//! ```

pub mod capture;
pub mod detect;
pub mod driver;
pub mod error;
pub mod extract;
pub mod form;
pub mod monitor;
pub mod scrape;
pub mod session;
pub mod tags;
pub mod types;

pub use {
    driver::PageDriver,
    error::BrowserError,
    session::{BrowserSession, with_session},
    types::{BrowserConfig, PdfOptions, validate_url},
};
