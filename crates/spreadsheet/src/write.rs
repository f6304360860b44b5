use rust_xlsxwriter::{ColNum, Format, RowNum, Worksheet};

use crate::{
    error::{Result, SheetError},
    value::CellValue,
};

pub(crate) fn row_num(index: usize) -> Result<RowNum> {
    RowNum::try_from(index)
        .map_err(|_| SheetError::InvalidSpec(format!("row {index} is out of range")))
}

pub(crate) fn col_num(index: usize) -> Result<ColNum> {
    ColNum::try_from(index)
        .map_err(|_| SheetError::InvalidSpec(format!("column {index} is out of range")))
}

pub(crate) fn header_format() -> Format {
    Format::new().set_bold()
}

pub(crate) fn write_cell(
    ws: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &CellValue,
    format: Option<&Format>,
) -> Result<()> {
    match (value, format) {
        (CellValue::Empty, _) => {},
        (CellValue::Number(n), None) => {
            ws.write_number(row, col, *n)?;
        },
        (CellValue::Number(n), Some(f)) => {
            ws.write_number_with_format(row, col, *n, f)?;
        },
        (CellValue::Bool(b), None) => {
            ws.write_boolean(row, col, *b)?;
        },
        (CellValue::Bool(b), Some(f)) => {
            ws.write_boolean_with_format(row, col, *b, f)?;
        },
        (CellValue::Text(s), None) => {
            ws.write_string(row, col, s)?;
        },
        (CellValue::Text(s), Some(f)) => {
            ws.write_string_with_format(row, col, s, f)?;
        },
    }
    Ok(())
}

pub(crate) fn write_row(
    ws: &mut Worksheet,
    row: usize,
    cells: &[CellValue],
    format: Option<&Format>,
) -> Result<()> {
    let row = row_num(row)?;
    for (col, value) in cells.iter().enumerate() {
        write_cell(ws, row, col_num(col)?, value, format)?;
    }
    Ok(())
}

/// Write `rows` from `A1`, bolding the first row when `bold_header` is set.
pub(crate) fn write_grid(ws: &mut Worksheet, rows: &[Vec<CellValue>], bold_header: bool) -> Result<()> {
    let bold = header_format();
    for (index, cells) in rows.iter().enumerate() {
        let format = (bold_header && index == 0).then_some(&bold);
        write_row(ws, index, cells, format)?;
    }
    Ok(())
}
