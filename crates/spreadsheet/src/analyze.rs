//! Per-column summary statistics.

use std::{collections::HashSet, path::Path};

use {
    docpilot_common::cell,
    rust_xlsxwriter::Workbook,
    serde::Serialize,
    tracing::info,
};

use crate::{
    error::Result,
    read::read_sheet,
    value::{CellValue, Grid},
    write::{col_num, write_grid},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Empty,
    Numeric,
    Text,
    Boolean,
    Mixed,
}

impl ColumnType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Mixed => "mixed",
        }
    }
}

/// Statistics for one column. Row 1 is the header; the rest is data.
///
/// `min`, `max`, `avg` and `sum` cover the numeric cells only and are absent
/// when there are none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    pub column: String,
    pub header: String,
    /// Non-empty data cells.
    pub count: usize,
    pub unique: usize,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    pub numeric_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
}

fn classify(numbers: usize, texts: usize, bools: usize) -> ColumnType {
    match (numbers, texts, bools) {
        (0, 0, 0) => ColumnType::Empty,
        (_, 0, 0) => ColumnType::Numeric,
        (0, _, 0) => ColumnType::Text,
        (0, 0, _) => ColumnType::Boolean,
        _ => ColumnType::Mixed,
    }
}

fn stats_for(grid: &Grid, col: usize) -> ColumnStats {
    let mut seen = HashSet::new();
    let (mut count, mut texts, mut bools) = (0, 0, 0);
    let mut numbers = Vec::new();

    for row in 1..grid.height() {
        let value = grid.get(row, col);
        match value {
            CellValue::Empty => continue,
            CellValue::Number(n) => numbers.push(*n),
            CellValue::Text(_) => texts += 1,
            CellValue::Bool(_) => bools += 1,
        }
        count += 1;
        seen.insert(value.to_string());
    }

    let numeric = !numbers.is_empty();
    let sum: f64 = numbers.iter().sum();
    let header = grid.get(0, col).to_string();

    ColumnStats {
        column: cell::column_letter(col as u32),
        header,
        count,
        unique: seen.len(),
        kind: classify(numbers.len(), texts, bools),
        numeric_count: numbers.len(),
        min: numeric.then(|| numbers.iter().copied().fold(f64::INFINITY, f64::min)),
        max: numeric.then(|| numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        avg: numeric.then(|| sum / numbers.len() as f64),
        sum: numeric.then_some(sum),
    }
}

/// Statistics for every column of `grid`, from column A to the widest row.
pub fn column_stats(grid: &Grid) -> Vec<ColumnStats> {
    (0..grid.width()).map(|col| stats_for(grid, col)).collect()
}

const STATS_HEADERS: [&str; 10] = [
    "Column", "Header", "Count", "Unique", "Type", "Numeric", "Min", "Max", "Average", "Sum",
];

fn stats_rows(stats: &[ColumnStats]) -> Vec<Vec<CellValue>> {
    let number = |v: Option<f64>| v.map_or(CellValue::Empty, CellValue::Number);
    std::iter::once(STATS_HEADERS.iter().map(|h| CellValue::from(*h)).collect::<Vec<_>>())
        .chain(stats.iter().map(|s| {
            vec![
                CellValue::from(s.column.as_str()),
                CellValue::from(s.header.as_str()),
                CellValue::Number(s.count as f64),
                CellValue::Number(s.unique as f64),
                CellValue::from(s.kind.as_str()),
                CellValue::Number(s.numeric_count as f64),
                number(s.min),
                number(s.max),
                number(s.avg),
                number(s.sum),
            ]
        }))
        .collect()
}

/// Compute column statistics for a sheet of `input` and write them to a
/// "Statistics" sheet in a new workbook at `output`.
pub fn analyze(input: &Path, output: &Path, sheet: Option<&str>) -> Result<Vec<ColumnStats>> {
    let grid = read_sheet(input, sheet)?;
    let stats = column_stats(&grid);

    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name("Statistics")?;
    write_grid(ws, &stats_rows(&stats), true)?;
    ws.set_freeze_panes(1, 0)?;
    ws.set_column_width(col_num(1)?, 20)?;
    workbook.save(output)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        sheet = %grid.sheet,
        columns = stats.len(),
        "analyzed workbook"
    );
    Ok(stats)
}
