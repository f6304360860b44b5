//! Cell-by-cell workbook comparison.

use std::path::Path;

use {docpilot_common::cell, serde::Serialize, tracing::info};

use crate::{error::Result, read::read_all, value::Grid};

/// Default number of rows compared per sheet.
pub const DEFAULT_ROW_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub sheet: String,
    /// A1-style address, e.g. `C7`.
    pub cell: String,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareReport {
    pub differences: Vec<Difference>,
    pub rows_compared: usize,
    /// Some sheet had more rows than the limit.
    pub truncated: bool,
    pub sheets_only_in_left: Vec<String>,
    pub sheets_only_in_right: Vec<String>,
}

impl CompareReport {
    pub fn is_identical(&self) -> bool {
        self.differences.is_empty()
            && self.sheets_only_in_left.is_empty()
            && self.sheets_only_in_right.is_empty()
    }
}

/// Compare the first `limit` rows of two grids. A cell present on only one
/// side compares against an empty cell.
pub fn compare_grids(left: &Grid, right: &Grid, limit: usize, report: &mut CompareReport) {
    let height = left.height().max(right.height());
    let width = left.width().max(right.width());
    let rows = height.min(limit);

    for row in 0..rows {
        for col in 0..width {
            let (a, b) = (left.get(row, col), right.get(row, col));
            if a != b {
                report.differences.push(Difference {
                    sheet: left.sheet.clone(),
                    cell: cell::cell_address(row as u32, col as u32),
                    left: a.to_string(),
                    right: b.to_string(),
                });
            }
        }
    }

    report.rows_compared += rows;
    report.truncated |= height > limit;
}

/// Compare every sheet that exists in both workbooks, matched by name.
pub fn compare(left: &Path, right: &Path, limit: usize) -> Result<CompareReport> {
    let left_sheets = read_all(left)?;
    let right_sheets = read_all(right)?;
    let mut report = CompareReport::default();

    for grid in &left_sheets {
        match right_sheets.iter().find(|g| g.sheet == grid.sheet) {
            Some(other) => compare_grids(grid, other, limit, &mut report),
            None => report.sheets_only_in_left.push(grid.sheet.clone()),
        }
    }
    report.sheets_only_in_right = right_sheets
        .iter()
        .filter(|g| !left_sheets.iter().any(|l| l.sheet == g.sheet))
        .map(|g| g.sheet.clone())
        .collect();

    info!(
        left = %left.display(),
        right = %right.display(),
        differences = report.differences.len(),
        rows = report.rows_compared,
        truncated = report.truncated,
        "compared workbooks"
    );
    Ok(report)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{value::CellValue, write::write_grid},
        rust_xlsxwriter::Workbook,
    };

    fn grid(rows: usize) -> Vec<Vec<CellValue>> {
        (0..rows)
            .map(|r| vec![CellValue::Text(format!("item {r}")), CellValue::Number(r as f64)])
            .collect()
    }

    fn save(path: &Path, sheets: &[(&str, Vec<Vec<CellValue>>)]) {
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let ws = workbook.add_worksheet();
            ws.set_name(*name).unwrap();
            write_grid(ws, rows, false).unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn identical_workbook_has_no_differences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.xlsx");
        save(&path, &[("Data", grid(10))]);

        let report = compare(&path, &path, DEFAULT_ROW_LIMIT).unwrap();
        assert!(report.is_identical());
        assert_eq!(report.rows_compared, 10);
        assert!(!report.truncated);
    }

    #[test]
    fn one_changed_cell_is_one_difference() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (dir.path().join("a.xlsx"), dir.path().join("b.xlsx"));
        let mut changed = grid(10);
        changed[6][1] = CellValue::Number(600.0);
        save(&a, &[("Data", grid(10))]);
        save(&b, &[("Data", changed)]);

        let report = compare(&a, &b, DEFAULT_ROW_LIMIT).unwrap();
        assert_eq!(report.differences, vec![Difference {
            sheet: "Data".into(),
            cell: "B7".into(),
            left: "6".into(),
            right: "600".into(),
        }]);
    }

    #[test]
    fn rows_past_the_limit_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (dir.path().join("a.xlsx"), dir.path().join("b.xlsx"));
        let mut changed = grid(150);
        changed[120][0] = CellValue::Text("late edit".into());
        save(&a, &[("Data", grid(150))]);
        save(&b, &[("Data", changed)]);

        let report = compare(&a, &b, DEFAULT_ROW_LIMIT).unwrap();
        assert!(report.differences.is_empty());
        assert_eq!(report.rows_compared, 100);
        assert!(report.truncated);
    }

    #[test]
    fn extra_row_compares_against_empty() {
        let left = Grid::new("S", grid(2));
        let right = Grid::new("S", grid(3));
        let mut report = CompareReport::default();
        compare_grids(&left, &right, DEFAULT_ROW_LIMIT, &mut report);

        let cells: Vec<_> = report.differences.iter().map(|d| d.cell.as_str()).collect();
        assert_eq!(cells, vec!["A3", "B3"]);
        assert_eq!(report.differences[0].left, "");
    }

    #[test]
    fn unmatched_sheets_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (dir.path().join("a.xlsx"), dir.path().join("b.xlsx"));
        save(&a, &[("Data", grid(2)), ("Old", grid(1))]);
        save(&b, &[("Data", grid(2)), ("New", grid(1))]);

        let report = compare(&a, &b, DEFAULT_ROW_LIMIT).unwrap();
        assert!(report.differences.is_empty());
        assert_eq!(report.sheets_only_in_left, vec!["Old"]);
        assert_eq!(report.sheets_only_in_right, vec!["New"]);
        assert!(!report.is_identical());
    }
}
