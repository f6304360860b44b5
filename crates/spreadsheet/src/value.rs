use std::fmt;

use {
    calamine::Data,
    serde::{Deserialize, Serialize},
};

/// A single cell as the skills see it.
///
/// In JSON a cell is `null`, a boolean, a number or a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Interpret raw text, e.g. a CSV field: blank is empty, finite numeric
    /// strings become numbers, everything else stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match trimmed.parse::<f64>() {
            // "inf" and "NaN" parse as floats but are not spreadsheet numbers
            Ok(n) if n.is_finite() && trimmed.bytes().any(|b| b.is_ascii_digit()) => {
                Self::Number(n)
            },
            _ => Self::Text(raw.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::Int(i) => Self::Number(*i as f64),
            Data::Float(n) => Self::Number(*n),
            Data::Bool(b) => Self::Bool(*b),
            Data::String(s) => Self::Text(s.clone()),
            // Excel serial date number
            Data::DateTime(dt) => Self::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Error(e) => Self::Text(format!("#{e:?}")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

static EMPTY: CellValue = CellValue::Empty;

/// One worksheet's values, row-major, addressed from `A1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub sheet: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(sheet: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            sheet: sheet.into(),
            rows,
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at a 0-based position; out-of-range positions read as empty.
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(CellValue::is_empty))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("42", CellValue::Number(42.0))]
    #[case(" 3.5 ", CellValue::Number(3.5))]
    #[case("-1e3", CellValue::Number(-1000.0))]
    #[case("", CellValue::Empty)]
    #[case("   ", CellValue::Empty)]
    #[case("inf", CellValue::Text("inf".into()))]
    #[case("NaN", CellValue::Text("NaN".into()))]
    #[case("12 apples", CellValue::Text("12 apples".into()))]
    fn parse_cells(#[case] raw: &str, #[case] expected: CellValue) {
        assert_eq!(CellValue::parse(raw), expected);
    }

    #[rstest]
    #[case(CellValue::Number(30.0), "30")]
    #[case(CellValue::Number(1.5), "1.5")]
    #[case(CellValue::Number(-0.25), "-0.25")]
    #[case(CellValue::Bool(true), "TRUE")]
    #[case(CellValue::Empty, "")]
    #[case(CellValue::Text("ann".into()), "ann")]
    fn display_cells(#[case] value: CellValue, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn json_cells_are_untagged() {
        let row: Vec<CellValue> = serde_json::from_str(r#"[null, true, 12, "x"]"#).unwrap();
        assert_eq!(row, vec![
            CellValue::Empty,
            CellValue::Bool(true),
            CellValue::Number(12.0),
            CellValue::Text("x".into()),
        ]);
    }

    #[test]
    fn grid_reads_outside_bounds_as_empty() {
        let grid = Grid::new("S", vec![vec![1.0.into()], vec![2.0.into(), "b".into()]]);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(0, 1), &CellValue::Empty);
        assert_eq!(grid.get(9, 9), &CellValue::Empty);
        assert_eq!(grid.get(1, 1), &CellValue::Text("b".into()));
    }
}
