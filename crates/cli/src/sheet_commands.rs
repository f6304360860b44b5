//! Spreadsheet subcommands.

use std::path::{Path, PathBuf};

use {
    anyhow::{Result, bail},
    clap::Subcommand,
    docpilot_config::DocpilotConfig,
    docpilot_spreadsheet::{
        analyze, compare,
        convert::{self, CsvOptions},
        create::{self, WorkbookSpec},
        filter,
    },
    serde_json::json,
    tracing::info,
};

use crate::output::{emit, load_payload};

#[derive(Subcommand)]
pub enum SheetAction {
    /// Build a workbook from a JSON spec.
    Create {
        /// Workbook spec as inline JSON or a JSON file.
        spec: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Convert a CSV file to xlsx.
    CsvToExcel {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Field delimiter.
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        /// Treat the first record as data rather than a header.
        #[arg(long)]
        no_header: bool,
        #[arg(long, default_value = "Sheet1")]
        sheet_name: String,
    },
    /// Export one sheet of a workbook to CSV.
    ExcelToCsv {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Sheet name (first sheet when omitted).
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Per-column statistics, written to a new workbook.
    Analyze {
        input: PathBuf,
        /// Statistics workbook.
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Cell-by-cell comparison of two workbooks.
    Compare {
        left: PathBuf,
        right: PathBuf,
        /// Rows compared per sheet (default from config, else 100).
        #[arg(long)]
        limit: Option<usize>,
        /// Write the report here instead of stdout.
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Bold and freeze the header row and add an autofilter.
    Filter {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
    },
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

pub fn handle_sheet(action: SheetAction, config: &DocpilotConfig) -> Result<()> {
    match action {
        SheetAction::Create { spec, output } => {
            let spec: WorkbookSpec = load_payload(&spec)?;
            create::create_workbook(&spec, &output)?;
            emit(&json!({ "path": output, "sheets": spec.sheets.len() }), None)
        },
        SheetAction::CsvToExcel {
            input,
            output,
            delimiter,
            no_header,
            sheet_name,
        } => {
            let Some(delimiter) = u8::try_from(delimiter).ok().filter(u8::is_ascii) else {
                bail!("delimiter must be a single ASCII character");
            };
            let options = CsvOptions {
                delimiter,
                has_header: !no_header,
                sheet_name,
            };
            let report = convert::csv_to_excel(&input, &output, &options)?;
            emit(&report, None)
        },
        SheetAction::ExcelToCsv {
            input,
            output,
            sheet,
        } => {
            let report = convert::excel_to_csv(&input, &output, sheet.as_deref())?;
            emit(&report, None)
        },
        SheetAction::Analyze {
            input,
            output,
            sheet,
        } => {
            if same_file(&input, &output) {
                bail!("output would overwrite the input workbook");
            }
            let stats = analyze::analyze(&input, &output, sheet.as_deref())?;
            emit(&stats, None)
        },
        SheetAction::Compare {
            left,
            right,
            limit,
            report,
        } => {
            let limit = limit.unwrap_or(config.spreadsheet.compare_row_limit as usize);
            if limit == 0 {
                bail!("--limit must be at least 1");
            }
            let result = compare::compare(&left, &right, limit)?;
            info!(
                differences = result.differences.len(),
                identical = result.is_identical(),
                "compared workbooks"
            );
            emit(&result, report.as_deref())
        },
        SheetAction::Filter {
            input,
            output,
            sheet,
        } => {
            if same_file(&input, &output) {
                bail!("output would overwrite the input workbook");
            }
            let range = filter::apply_filters(&input, &output, sheet.as_deref())?;
            emit(&json!({ "path": output, "range": range }), None)
        },
    }
}
