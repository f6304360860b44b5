//! CSV to xlsx and back.

use std::path::Path;

use {
    rust_xlsxwriter::Workbook,
    serde::{Deserialize, Serialize},
    tracing::info,
};

use crate::{
    error::Result,
    read::read_sheet,
    value::CellValue,
    write::{col_num, write_grid},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Treat the first record as a header: kept as text, bolded and frozen.
    pub has_header: bool,
    pub sheet_name: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            sheet_name: "Sheet1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConvertReport {
    pub rows: usize,
    pub columns: usize,
}

/// Convert a CSV file into a single-sheet workbook.
///
/// Numeric fields are written as numbers; the header row, when enabled,
/// always stays text.
pub fn csv_to_excel(csv_path: &Path, xlsx_path: &Path, options: &CsvOptions) -> Result<ConvertReport> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let header = options.has_header && index == 0;
        rows.push(
            record
                .iter()
                .map(|field| match (header, field.is_empty()) {
                    (_, true) => CellValue::Empty,
                    (true, false) => CellValue::Text(field.to_string()),
                    (false, false) => CellValue::parse(field),
                })
                .collect(),
        );
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name(&options.sheet_name)?;
    write_grid(ws, &rows, options.has_header)?;
    if options.has_header && !rows.is_empty() {
        ws.set_freeze_panes(1, 0)?;
    }
    for col in 0..columns {
        ws.set_column_width(col_num(col)?, 14)?;
    }
    workbook.save(xlsx_path)?;

    info!(
        csv = %csv_path.display(),
        xlsx = %xlsx_path.display(),
        rows = rows.len(),
        columns,
        "converted CSV to workbook"
    );
    Ok(ConvertReport {
        rows: rows.len(),
        columns,
    })
}

/// Write one sheet of a workbook as CSV. Short rows are padded so every
/// record has the same number of fields.
pub fn excel_to_csv(xlsx_path: &Path, csv_path: &Path, sheet: Option<&str>) -> Result<ConvertReport> {
    let grid = read_sheet(xlsx_path, sheet)?;
    let columns = grid.width();

    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(csv_path)?;
    for row in 0..grid.height() {
        let record: Vec<String> = (0..columns).map(|col| grid.get(row, col).to_string()).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!(
        xlsx = %xlsx_path.display(),
        csv = %csv_path.display(),
        sheet = %grid.sheet,
        rows = grid.height(),
        "converted workbook to CSV"
    );
    Ok(ConvertReport {
        rows: grid.height(),
        columns,
    })
}
