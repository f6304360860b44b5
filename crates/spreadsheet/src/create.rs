//! Workbook generation from a JSON description.

use std::path::Path;

use {
    docpilot_common::cell,
    rust_xlsxwriter::{Chart, ChartType, Workbook, Worksheet},
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

use crate::{
    error::{Result, SheetError},
    value::CellValue,
    write::{col_num, header_format, row_num, write_row},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookSpec {
    pub sheets: Vec<SheetSpec>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSpec {
    pub name: String,
    /// Written to row 1 when present; data starts below it.
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
    /// Widths in characters, from column A.
    #[serde(default)]
    pub column_widths: Vec<f64>,
    #[serde(default = "default_true")]
    pub bold_header: bool,
    #[serde(default)]
    pub freeze_header: bool,
    #[serde(default)]
    pub autofilter: bool,
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Column,
    Bar,
    Line,
    Pie,
    Area,
    Scatter,
}

impl From<ChartKind> for ChartType {
    fn from(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Column => ChartType::Column,
            ChartKind::Bar => ChartType::Bar,
            ChartKind::Line => ChartType::Line,
            ChartKind::Pie => ChartType::Pie,
            ChartKind::Area => ChartType::Area,
            ChartKind::Scatter => ChartType::Scatter,
        }
    }
}

fn default_anchor() -> String {
    "H2".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default, rename = "type")]
    pub kind: ChartKind,
    #[serde(default)]
    pub title: Option<String>,
    /// Category range such as `A2:A10` or `Sales!A2:A10`.
    pub categories: String,
    pub values: String,
    #[serde(default)]
    pub series_name: Option<String>,
    /// Top-left cell the chart is placed at.
    #[serde(default = "default_anchor")]
    pub anchor: String,
}

/// Qualify a range with `sheet` unless it names one, and make it absolute.
pub(crate) fn chart_range(sheet: &str, range: &str) -> Result<String> {
    let (sheet, cells) = match range.rsplit_once('!') {
        Some((sheet, cells)) => match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            Some(quoted) => (quoted.replace("''", "'"), cells),
            None => (sheet.to_string(), cells),
        },
        None => (sheet.to_string(), range),
    };
    let invalid = || SheetError::InvalidSpec(format!("invalid chart range '{range}'"));
    let (start, end) = cells.split_once(':').ok_or_else(invalid)?;
    let (r1, c1) = cell::parse_address(start).ok_or_else(invalid)?;
    let (r2, c2) = cell::parse_address(end).ok_or_else(invalid)?;
    Ok(format!(
        "'{}'!${}${}:${}${}",
        sheet.replace('\'', "''"),
        cell::column_letter(c1),
        r1 + 1,
        cell::column_letter(c2),
        r2 + 1
    ))
}

fn add_chart(ws: &mut Worksheet, sheet: &str, spec: &ChartSpec) -> Result<()> {
    let mut chart = Chart::new(spec.kind.into());
    let categories = chart_range(sheet, &spec.categories)?;
    let values = chart_range(sheet, &spec.values)?;

    let series = chart.add_series();
    series
        .set_categories(categories.as_str())
        .set_values(values.as_str());
    if let Some(ref name) = spec.series_name {
        series.set_name(name.as_str());
    }
    if let Some(ref title) = spec.title {
        chart.title().set_name(title.as_str());
    }

    let (row, col) = cell::parse_address(&spec.anchor)
        .ok_or_else(|| SheetError::InvalidSpec(format!("invalid chart anchor '{}'", spec.anchor)))?;
    ws.insert_chart(row, col_num(col as usize)?, &chart)?;
    debug!(sheet, kind = ?spec.kind, anchor = %spec.anchor, "inserted chart");
    Ok(())
}

fn build_sheet(ws: &mut Worksheet, spec: &SheetSpec) -> Result<()> {
    ws.set_name(&spec.name)?;

    let has_header = !spec.headers.is_empty();
    if has_header {
        let headers: Vec<CellValue> = spec.headers.iter().map(|h| CellValue::from(h.as_str())).collect();
        let bold = header_format();
        write_row(ws, 0, &headers, spec.bold_header.then_some(&bold))?;
    }
    let offset = usize::from(has_header);
    for (index, row) in spec.rows.iter().enumerate() {
        write_row(ws, index + offset, row, None)?;
    }

    for (col, width) in spec.column_widths.iter().enumerate() {
        ws.set_column_width(col_num(col)?, *width)?;
    }

    if spec.freeze_header && has_header {
        ws.set_freeze_panes(1, 0)?;
    }

    let last_row = spec.rows.len() + offset;
    let last_col = spec
        .rows
        .iter()
        .map(Vec::len)
        .chain([spec.headers.len()])
        .max()
        .unwrap_or(0);
    if spec.autofilter && last_row > 0 && last_col > 0 {
        ws.autofilter(0, 0, row_num(last_row - 1)?, col_num(last_col - 1)?)?;
    }

    for chart in &spec.charts {
        add_chart(ws, &spec.name, chart)?;
    }
    Ok(())
}

/// Build the workbook described by `spec` and save it to `path`.
pub fn create_workbook(spec: &WorkbookSpec, path: &Path) -> Result<()> {
    if spec.sheets.is_empty() {
        return Err(SheetError::InvalidSpec("workbook needs at least one sheet".into()));
    }

    let mut workbook = Workbook::new();
    for sheet in &spec.sheets {
        let ws = workbook.add_worksheet();
        build_sheet(ws, sheet)?;
    }
    workbook.save(path)?;

    info!(
        path = %path.display(),
        sheets = spec.sheets.len(),
        "workbook created"
    );
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::read::read_sheet, rstest::rstest, serde_json::json};

    #[rstest]
    #[case("Sales", "A2:A5", "'Sales'!$A$2:$A$5")]
    #[case("Sales", "$B$2:$B$5", "'Sales'!$B$2:$B$5")]
    #[case("Sales", "Q1 Data!C1:C3", "'Q1 Data'!$C$1:$C$3")]
    #[case("Sales", "'It''s'!A1:A2", "'It''s'!$A$1:$A$2")]
    fn chart_ranges(#[case] sheet: &str, #[case] range: &str, #[case] expected: &str) {
        assert_eq!(chart_range(sheet, range).unwrap(), expected);
    }

    #[rstest]
    #[case("A2")]
    #[case("A2:")]
    #[case("2A:B3")]
    fn bad_chart_ranges(#[case] range: &str) {
        assert!(chart_range("S", range).is_err());
    }

    #[test]
    fn creates_sheets_with_headers_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let spec: WorkbookSpec = serde_json::from_value(json!({
            "sheets": [{
                "name": "Sales",
                "headers": ["Month", "Revenue"],
                "rows": [["Jan", 1200], ["Feb", 1350.5], ["Mar", null]],
                "column_widths": [12, 14],
                "freeze_header": true,
                "autofilter": true,
                "charts": [{
                    "type": "line",
                    "title": "Revenue",
                    "categories": "A2:A4",
                    "values": "B2:B4",
                    "anchor": "D2"
                }]
            }, {
                "name": "Notes",
                "rows": [["free text"]]
            }]
        }))
        .unwrap();

        create_workbook(&spec, &path).unwrap();

        let sales = read_sheet(&path, Some("Sales")).unwrap();
        assert_eq!(sales.get(0, 1), &CellValue::Text("Revenue".into()));
        assert_eq!(sales.get(2, 1), &CellValue::Number(1350.5));
        assert_eq!(sales.get(3, 1), &CellValue::Empty);

        let notes = read_sheet(&path, Some("Notes")).unwrap();
        assert_eq!(notes.get(0, 0), &CellValue::Text("free text".into()));
    }

    #[test]
    fn empty_workbook_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let spec = WorkbookSpec { sheets: vec![] };
        let err = create_workbook(&spec, &dir.path().join("x.xlsx")).unwrap_err();
        assert!(matches!(err, SheetError::InvalidSpec(_)));
    }

    #[test]
    fn bad_anchor_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let spec: WorkbookSpec = serde_json::from_value(json!({
            "sheets": [{
                "name": "S",
                "rows": [["a", 1]],
                "charts": [{ "categories": "A1:A1", "values": "B1:B1", "anchor": "nowhere" }]
            }]
        }))
        .unwrap();
        assert!(create_workbook(&spec, &dir.path().join("x.xlsx")).is_err());
    }
}
