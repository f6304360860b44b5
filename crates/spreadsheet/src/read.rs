//! Reading workbooks (xlsx, xls, ods) into [`Grid`]s.

use std::path::Path;

use {
    calamine::{Reader, Sheets, open_workbook_auto},
    tracing::debug,
};

use crate::{
    error::{Result, SheetError},
    value::{CellValue, Grid},
};

fn open(path: &Path) -> Result<Sheets<std::io::BufReader<std::fs::File>>> {
    open_workbook_auto(path).map_err(|source| SheetError::Open {
        path: path.to_path_buf(),
        source,
    })
}

pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    Ok(open(path)?.sheet_names())
}

/// Read one sheet, or the first sheet when `sheet` is `None`.
///
/// Leading empty rows and columns are kept so that `grid.get(r, c)` matches
/// the cell's real address.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<Grid> {
    let mut workbook = open(path)?;
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) if names.iter().any(|n| n == wanted) => wanted.to_string(),
        Some(wanted) => return Err(SheetError::SheetNotFound(wanted.to_string())),
        None => names
            .first()
            .cloned()
            .ok_or_else(|| SheetError::NoSheets(path.to_path_buf()))?,
    };
    read_named(&mut workbook, &name)
}

/// Read every sheet in workbook order.
pub fn read_all(path: &Path) -> Result<Vec<Grid>> {
    let mut workbook = open(path)?;
    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(SheetError::NoSheets(path.to_path_buf()));
    }
    names
        .iter()
        .map(|name| read_named(&mut workbook, name))
        .collect()
}

fn read_named(
    workbook: &mut Sheets<std::io::BufReader<std::fs::File>>,
    name: &str,
) -> Result<Grid> {
    let range = workbook
        .worksheet_range(name)
        .map_err(|source| SheetError::ReadSheet {
            sheet: name.to_string(),
            source,
        })?;

    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<CellValue>> = (0..first_row).map(|_| Vec::new()).collect();
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; first_col as usize];
        cells.extend(row.iter().map(CellValue::from));
        while cells.last().is_some_and(CellValue::is_empty) {
            cells.pop();
        }
        rows.push(cells);
    }
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }

    debug!(sheet = name, rows = rows.len(), "read sheet");
    Ok(Grid::new(name, rows))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rust_xlsxwriter::Workbook};

    fn offset_workbook(path: &Path) {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.set_name("Data").unwrap();
        ws.write_string(1, 2, "name").unwrap();
        ws.write_number(2, 2, 7).unwrap();
        workbook.add_worksheet().set_name("Other").unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn keeps_cell_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");
        offset_workbook(&path);

        let grid = read_sheet(&path, None).unwrap();
        assert_eq!(grid.sheet, "Data");
        assert_eq!(grid.get(1, 2), &CellValue::Text("name".into()));
        assert_eq!(grid.get(2, 2), &CellValue::Number(7.0));
        assert_eq!(grid.height(), 3);
    }

    #[test]
    fn missing_sheet_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");
        offset_workbook(&path);

        let err = read_sheet(&path, Some("Nope")).unwrap_err();
        assert!(matches!(err, SheetError::SheetNotFound(ref s) if s == "Nope"));
        assert_eq!(sheet_names(&path).unwrap(), vec!["Data", "Other"]);
    }

    #[test]
    fn read_all_includes_empty_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");
        offset_workbook(&path);

        let grids = read_all(&path).unwrap();
        assert_eq!(grids.len(), 2);
        assert!(grids[1].is_empty());
    }

    #[test]
    fn missing_file_fails_to_open() {
        let err = read_sheet(Path::new("/nonexistent/book.xlsx"), None).unwrap_err();
        assert!(matches!(err, SheetError::Open { .. }));
    }
}
