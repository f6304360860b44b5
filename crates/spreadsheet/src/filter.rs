//! Header formatting: bold row 1, freeze it, and add an autofilter.

use std::path::Path;

use {
    docpilot_common::cell,
    rust_xlsxwriter::Workbook,
    tracing::{debug, info},
};

use crate::{
    error::{Result, SheetError},
    read::read_all,
    write::{col_num, row_num, write_grid},
};

/// The autofilter range for a block of `rows` x `cols` starting at `A1`.
pub fn filter_range(rows: usize, cols: usize) -> Option<String> {
    if rows == 0 || cols == 0 {
        return None;
    }
    Some(cell::range(0, 0, rows as u32 - 1, cols as u32 - 1))
}

/// Rewrite `input` to `output` with the target sheet's header bolded and
/// frozen and an autofilter over its used range. Returns that range.
///
/// Only cell values are carried over; other sheets are copied as-is.
pub fn apply_filters(input: &Path, output: &Path, sheet: Option<&str>) -> Result<String> {
    let grids = read_all(input)?;
    let target = match sheet {
        Some(name) => grids
            .iter()
            .position(|g| g.sheet == name)
            .ok_or_else(|| SheetError::SheetNotFound(name.to_string()))?,
        None => 0,
    };

    let grid = &grids[target];
    let range = filter_range(grid.height(), grid.width())
        .ok_or_else(|| SheetError::EmptySheet(grid.sheet.clone()))?;

    let mut workbook = Workbook::new();
    for (index, grid) in grids.iter().enumerate() {
        let ws = workbook.add_worksheet();
        ws.set_name(&grid.sheet)?;
        let is_target = index == target;
        write_grid(ws, &grid.rows, is_target)?;
        if is_target {
            ws.set_freeze_panes(1, 0)?;
            ws.autofilter(
                0,
                0,
                row_num(grid.height() - 1)?,
                col_num(grid.width() - 1)?,
            )?;
            ws.autofit();
        } else {
            debug!(sheet = %grid.sheet, "copied sheet");
        }
    }
    workbook.save(output)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        sheet = %grid.sheet,
        range = %range,
        "applied filters"
    );
    Ok(range)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{read::read_sheet, value::CellValue},
        rstest::rstest,
    };

    #[rstest]
    #[case(1, 1, Some("A1:A1"))]
    #[case(10, 3, Some("A1:C10"))]
    #[case(5, 28, Some("A1:AB5"))]
    #[case(0, 3, None)]
    #[case(4, 0, None)]
    fn ranges(#[case] rows: usize, #[case] cols: usize, #[case] expected: Option<&str>) {
        assert_eq!(filter_range(rows, cols).as_deref(), expected);
    }

    fn write_book(path: &Path) {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.set_name("Summary").unwrap();
        ws.write_string(0, 0, "note").unwrap();
        let ws = workbook.add_worksheet();
        ws.set_name("Orders").unwrap();
        let rows: Vec<Vec<CellValue>> = vec![
            vec!["id".into(), "customer".into(), "total".into(), "status".into()],
            vec![1.0.into(), "acme".into(), 12.5.into()],
            vec![2.0.into(), "globex".into(), 40.0.into(), "paid".into()],
        ];
        write_grid(ws, &rows, false).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn range_spans_last_column_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let (input, output) = (dir.path().join("in.xlsx"), dir.path().join("out.xlsx"));
        write_book(&input);

        let range = apply_filters(&input, &output, Some("Orders")).unwrap();
        assert_eq!(range, "A1:D3");

        let orders = read_sheet(&output, Some("Orders")).unwrap();
        assert_eq!(orders.get(2, 3), &CellValue::Text("paid".into()));
        let summary = read_sheet(&output, Some("Summary")).unwrap();
        assert_eq!(summary.get(0, 0), &CellValue::Text("note".into()));
    }

    #[test]
    fn defaults_to_first_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let (input, output) = (dir.path().join("in.xlsx"), dir.path().join("out.xlsx"));
        write_book(&input);
        assert_eq!(apply_filters(&input, &output, None).unwrap(), "A1:A1");
    }

    #[test]
    fn unknown_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let (input, output) = (dir.path().join("in.xlsx"), dir.path().join("out.xlsx"));
        write_book(&input);
        let err = apply_filters(&input, &output, Some("Missing")).unwrap_err();
        assert!(matches!(err, SheetError::SheetNotFound(_)));
        assert!(!output.exists());
    }
}
