mod browser_commands;
mod config_commands;
mod doc_commands;
mod output;
mod pdf_commands;
mod sheet_commands;
mod slides_commands;

use std::{path::PathBuf, process::ExitCode};

use {
    clap::{Parser, Subcommand},
    docpilot_browser::BrowserConfig,
    docpilot_config::DocpilotConfig,
    tracing::{debug, error, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "docpilot",
    version,
    about = "Dashboard monitoring, web extraction and office-document skills"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./docpilot.toml and the user config dir).
    #[arg(long, global = true, env = "DOCPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Chrome/Chromium executable.
    #[arg(long, global = true, env = "DOCPILOT_CHROME_PATH")]
    chrome_path: Option<String>,

    /// Run the browser headless (the default unless the config says otherwise).
    #[arg(long, global = true, overrides_with = "no_headless")]
    headless: bool,

    /// Show the browser window.
    #[arg(long, global = true, overrides_with = "headless")]
    no_headless: bool,

    /// Navigation timeout in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a dashboard for anomalies, once or repeatedly.
    Monitor(browser_commands::MonitorArgs),
    /// Report tag-manager and analytics installation on a page.
    Tags(browser_commands::TagsArgs),
    /// Extract named fields from a page with a selector map.
    Extract(browser_commands::ExtractArgs),
    /// Scrape repeated items across paginated listings.
    Scrape(browser_commands::ScrapeArgs),
    /// Fill and optionally submit a form.
    FillForm(browser_commands::FillFormArgs),
    /// Save a PNG screenshot of a page.
    Screenshot(browser_commands::ScreenshotArgs),
    /// Print a page to PDF.
    PrintPdf(browser_commands::PrintPdfArgs),
    /// Spreadsheet tools.
    Sheet {
        #[command(subcommand)]
        action: sheet_commands::SheetAction,
    },
    /// Presentation tools.
    Slides {
        #[command(subcommand)]
        action: slides_commands::SlidesAction,
    },
    /// Word document tools.
    Doc {
        #[command(subcommand)]
        action: doc_commands::DocAction,
    },
    /// PDF tools.
    Pdf {
        #[command(subcommand)]
        action: pdf_commands::PdfAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Initialise tracing on stderr so reports on stdout stay machine-readable.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Browser settings from the config file with CLI flags applied on top.
fn browser_config(cli: &Cli, config: &DocpilotConfig) -> BrowserConfig {
    let mut browser = BrowserConfig::from(&config.browser);
    if let Some(ref path) = cli.chrome_path {
        browser.chrome_path = Some(path.clone());
    }
    if cli.no_headless {
        browser.headless = false;
    } else if cli.headless {
        browser.headless = true;
    }
    if let Some(ms) = cli.timeout_ms {
        browser.navigation_timeout_ms = ms;
    }
    browser
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let loaded = docpilot_config::load_or_discover(cli.config.as_deref());
    let config = match (loaded, &cli.command) {
        (Ok(config), _) => config,
        // `config check` reports the problems itself.
        (
            Err(e),
            Commands::Config {
                action: config_commands::ConfigAction::Check { .. },
            },
        ) => {
            warn!(error = %e, "config failed to load");
            DocpilotConfig::default()
        },
        (Err(e), _) => return Err(e.into()),
    };
    let browser = browser_config(&cli, &config);

    match cli.command {
        Commands::Monitor(args) => browser_commands::monitor(browser, &config, args).await,
        Commands::Tags(args) => browser_commands::tags(browser, args).await,
        Commands::Extract(args) => browser_commands::extract(browser, args).await,
        Commands::Scrape(args) => browser_commands::scrape(browser, &config, args).await,
        Commands::FillForm(args) => browser_commands::fill_form(browser, args).await,
        Commands::Screenshot(args) => browser_commands::screenshot(browser, args).await,
        Commands::PrintPdf(args) => browser_commands::print_pdf(browser, args).await,
        Commands::Sheet { action } => sheet_commands::handle_sheet(action, &config),
        Commands::Slides { action } => slides_commands::handle_slides(action),
        Commands::Doc { action } => doc_commands::handle_doc(action),
        Commands::Pdf { action } => pdf_commands::handle_pdf(action),
        Commands::Config { action } => {
            config_commands::handle_config(action, cli.config.as_deref(), &config)
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Argument errors exit 1; --help and --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        },
    };

    init_telemetry(&cli);
    debug!(version = env!("CARGO_PKG_VERSION"), "docpilot starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        },
    }
}
