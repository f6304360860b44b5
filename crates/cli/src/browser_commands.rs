//! CLI subcommands backed by a browser session.

use std::{path::PathBuf, time::Duration};

use {
    anyhow::{Result, bail},
    clap::Args,
    docpilot_browser::{
        BrowserConfig, PdfOptions, capture,
        extract::{self, SelectorMap},
        form::{self, FormConfig},
        monitor::{self, MonitorOptions},
        scrape::{self, ScrapeConfig},
        tags, validate_url, with_session,
    },
    docpilot_config::DocpilotConfig,
    serde_json::Value,
    tracing::info,
};

use crate::output::{emit, load_payload};

#[derive(Args)]
pub struct MonitorArgs {
    /// Dashboard URL.
    pub url: String,
    /// Number of checks (default from config, else 1).
    #[arg(long)]
    pub checks: Option<u32>,
    /// Seconds between checks (default from config, else 60).
    #[arg(long)]
    pub interval: Option<u64>,
    /// Write the results array here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct TagsArgs {
    pub url: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExtractArgs {
    pub url: String,
    /// Selector map as inline JSON or a JSON file: `{"name": "css"}` or
    /// `{"name": {"selector": "css", "attribute": "href", "multiple": true}}`.
    #[arg(long)]
    pub selectors: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ScrapeArgs {
    pub url: String,
    /// Scrape config as inline JSON or a JSON file.
    #[arg(long)]
    pub spec: String,
    /// Page cap (overrides the payload, at most 50).
    #[arg(long)]
    pub max_pages: Option<u32>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct FillFormArgs {
    pub url: String,
    /// Form config as inline JSON or a JSON file.
    #[arg(long)]
    pub spec: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ScreenshotArgs {
    pub url: String,
    /// PNG path.
    #[arg(short, long, default_value = "screenshot.png")]
    pub output: PathBuf,
    /// Capture the whole scrollable page instead of the viewport.
    #[arg(long)]
    pub full_page: bool,
}

#[derive(Args)]
pub struct PrintPdfArgs {
    pub url: String,
    #[arg(short, long, default_value = "page.pdf")]
    pub output: PathBuf,
    #[arg(long)]
    pub landscape: bool,
    /// Leave out background colours and images.
    #[arg(long)]
    pub no_background: bool,
    /// Paper width in inches.
    #[arg(long, default_value_t = 8.5)]
    pub paper_width: f64,
    /// Paper height in inches.
    #[arg(long, default_value_t = 11.0)]
    pub paper_height: f64,
    /// Margin in inches.
    #[arg(long, default_value_t = 0.4)]
    pub margin: f64,
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
}

pub async fn monitor(
    browser: BrowserConfig,
    config: &DocpilotConfig,
    args: MonitorArgs,
) -> Result<()> {
    validate_url(&args.url)?;
    let checks = args.checks.unwrap_or(config.monitor.checks);
    if checks == 0 {
        bail!("--checks must be at least 1");
    }
    let options = MonitorOptions {
        url: args.url,
        checks,
        interval: Duration::from_secs(args.interval.unwrap_or(config.monitor.interval_secs)),
    };
    let output = args
        .output
        .or_else(|| config.monitor.output.as_ref().map(PathBuf::from));

    info!(url = %options.url, checks, "starting dashboard monitor");
    let results = with_session(browser, move |session| {
        Box::pin(async move { Ok(monitor::run_monitor(session, &options).await) })
    })
    .await?;

    let summary = monitor::summarize(&results);
    info!(
        checks = summary.checks,
        healthy = summary.healthy,
        issues_detected = summary.issues_detected,
        errors = summary.errors,
        "monitor finished"
    );
    emit(&results, output.as_deref())
}

pub async fn tags(browser: BrowserConfig, args: TagsArgs) -> Result<()> {
    validate_url(&args.url)?;
    let url = args.url;
    let report = with_session(browser, move |session| {
        Box::pin(async move { tags::check_tags(session, &url).await })
    })
    .await?;
    emit(&report, args.output.as_deref())
}

pub async fn extract(browser: BrowserConfig, args: ExtractArgs) -> Result<()> {
    validate_url(&args.url)?;
    let fields: SelectorMap = load_payload(&args.selectors)?;
    if fields.is_empty() {
        bail!("selector map is empty");
    }
    let url = args.url;
    let data = with_session(browser, move |session| {
        Box::pin(async move { extract::extract(session, &url, &fields).await })
    })
    .await?;
    emit(&data, args.output.as_deref())
}

pub async fn scrape(
    browser: BrowserConfig,
    config: &DocpilotConfig,
    args: ScrapeArgs,
) -> Result<()> {
    validate_url(&args.url)?;
    let mut raw: Value = load_payload(&args.spec)?;
    if let Some(map) = raw.as_object_mut() {
        let max_pages = args.max_pages.or_else(|| {
            (!map.contains_key("max_pages")).then_some(config.scrape.max_pages)
        });
        if let Some(max_pages) = max_pages {
            map.insert("max_pages".into(), max_pages.into());
        }
    }
    let spec: ScrapeConfig = serde_json::from_value(raw)?;
    let url = args.url;
    let result = with_session(browser, move |session| {
        Box::pin(async move { scrape::scrape(session, &url, &spec).await })
    })
    .await?;
    emit(&result, args.output.as_deref())
}

pub async fn fill_form(browser: BrowserConfig, args: FillFormArgs) -> Result<()> {
    validate_url(&args.url)?;
    let spec: FormConfig = load_payload(&args.spec)?;
    let url = args.url;
    let report = with_session(browser, move |session| {
        Box::pin(async move { form::fill_form(session, &url, &spec).await })
    })
    .await?;
    emit(&report, args.output.as_deref())
}

pub async fn screenshot(browser: BrowserConfig, args: ScreenshotArgs) -> Result<()> {
    validate_url(&args.url)?;
    let ScreenshotArgs {
        url,
        output,
        full_page,
    } = args;
    let report = with_session(browser, move |session| {
        Box::pin(async move { capture::screenshot(session, &url, &output, full_page).await })
    })
    .await?;
    emit(&report, None)
}

pub async fn print_pdf(browser: BrowserConfig, args: PrintPdfArgs) -> Result<()> {
    validate_url(&args.url)?;
    if args.scale <= 0.0 || args.paper_width <= 0.0 || args.paper_height <= 0.0 {
        bail!("paper size and scale must be positive");
    }
    let options = PdfOptions {
        landscape: args.landscape,
        print_background: !args.no_background,
        paper_width: args.paper_width,
        paper_height: args.paper_height,
        margin: args.margin,
        scale: args.scale,
    };
    let (url, output) = (args.url, args.output);
    let report = with_session(browser, move |session| {
        Box::pin(async move { capture::print_pdf(session, &url, &output, &options).await })
    })
    .await?;
    emit(&report, None)
}
