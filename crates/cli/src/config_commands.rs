use std::path::Path;

use {
    anyhow::{Result, bail},
    clap::Subcommand,
    docpilot_config::{
        DocpilotConfig, find_config_file,
        validate::{self, Severity},
    },
};

use crate::output::emit;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as JSON.
    Show,
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(
    action: ConfigAction,
    explicit: Option<&Path>,
    config: &DocpilotConfig,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            match explicit.map(Path::to_path_buf).or_else(find_config_file) {
                Some(path) => eprintln!("# {}", path.display()),
                None => eprintln!("# defaults (no config file found)"),
            }
            emit(config, None)
        },
        ConfigAction::Check { verbose } => check(explicit, verbose),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(explicit: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(explicit);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        bail!("config has {errors} error(s)");
    }
    Ok(())
}
