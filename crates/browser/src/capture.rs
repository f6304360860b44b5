//! Screenshots and print-to-PDF.

use std::path::{Path, PathBuf};

use {serde::Serialize, tracing::info};

use crate::{driver::PageDriver, error::BrowserError, types::PdfOptions};

/// A file written by a capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    pub url: String,
    pub path: PathBuf,
    pub bytes: usize,
}

async fn write_output(path: &Path, data: &[u8]) -> Result<(), BrowserError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await?;
    Ok(())
}

/// Save a PNG of `url` to `path`.
pub async fn screenshot(
    driver: &mut dyn PageDriver,
    url: &str,
    path: &Path,
    full_page: bool,
) -> Result<CaptureReport, BrowserError> {
    driver.goto(url).await?;
    driver.wait_for_idle().await?;
    let png = driver.screenshot(full_page).await?;
    write_output(path, &png).await?;

    info!(url, path = %path.display(), bytes = png.len(), full_page, "screenshot saved");
    Ok(CaptureReport {
        url: url.to_string(),
        path: path.to_path_buf(),
        bytes: png.len(),
    })
}

/// Render `url` to a PDF file at `path`.
pub async fn print_pdf(
    driver: &mut dyn PageDriver,
    url: &str,
    path: &Path,
    options: &PdfOptions,
) -> Result<CaptureReport, BrowserError> {
    driver.goto(url).await?;
    driver.wait_for_idle().await?;
    let pdf = driver.pdf(options).await?;
    write_output(path, &pdf).await?;

    info!(
        url,
        path = %path.display(),
        bytes = pdf.len(),
        landscape = options.landscape,
        "pdf saved"
    );
    Ok(CaptureReport {
        url: url.to_string(),
        path: path.to_path_buf(),
        bytes: pdf.len(),
    })
}
