//! A1-style cell addressing shared by the spreadsheet skills.
//!
//! Rows and columns are zero-based on the Rust side; the rendered addresses
//! are the one-based letters/numbers users see in a spreadsheet.

/// Convert a zero-based column index to spreadsheet letters (`0` → `A`,
/// `26` → `AA`).
pub fn column_letter(index: u32) -> String {
    let mut n = index as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Parse spreadsheet column letters back to a zero-based index.
///
/// Returns `None` for empty input or non-alphabetic characters.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if n > u32::MAX as u64 {
            return None;
        }
    }
    Some((n - 1) as u32)
}

/// Render a zero-based `(row, col)` pair as an address such as `B3`.
pub fn cell_address(row: u32, col: u32) -> String {
    format!("{}{}", column_letter(col), row + 1)
}

/// Render an inclusive zero-based rectangle as `A1:C4`.
pub fn range(first_row: u32, first_col: u32, last_row: u32, last_col: u32) -> String {
    format!(
        "{}:{}",
        cell_address(first_row, first_col),
        cell_address(last_row, last_col)
    )
}

/// Parse an address such as `B3` into zero-based `(row, col)`.
pub fn parse_address(address: &str) -> Option<(u32, u32)> {
    let address = address.trim().replace('$', "");
    let split = address.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = address.split_at(split);
    let col = column_index(letters)?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(0, "A")]
    #[case(1, "B")]
    #[case(25, "Z")]
    #[case(26, "AA")]
    #[case(27, "AB")]
    #[case(51, "AZ")]
    #[case(52, "BA")]
    #[case(701, "ZZ")]
    #[case(702, "AAA")]
    fn letters(#[case] index: u32, #[case] expected: &str) {
        assert_eq!(column_letter(index), expected);
        assert_eq!(column_index(expected), Some(index));
    }

    #[test]
    fn column_index_rejects_garbage() {
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn addresses() {
        assert_eq!(cell_address(0, 0), "A1");
        assert_eq!(cell_address(2, 1), "B3");
        assert_eq!(range(0, 0, 3, 2), "A1:C4");
    }

    #[rstest]
    #[case("A1", Some((0, 0)))]
    #[case("b3", Some((2, 1)))]
    #[case("$C$10", Some((9, 2)))]
    #[case("A0", None)]
    #[case("12", None)]
    #[case("AB", None)]
    fn parse(#[case] input: &str, #[case] expected: Option<(u32, u32)>) {
        assert_eq!(parse_address(input), expected);
    }
}
