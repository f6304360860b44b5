use crate::error::{PresentationError, Result};

pub(crate) const EMU_PER_INCH: f64 = 914_400.0;

pub(crate) const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

/// The `xmlns` attributes every presentation part declares.
pub(crate) fn pml_namespaces() -> String {
    format!(r#"xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}""#)
}

pub(crate) fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // not allowed in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {},
            c => out.push(c),
        }
    }
    out
}

/// Normalise `#rrggbb` / `RRGGBB` to upper-case `RRGGBB`.
pub(crate) fn hex_color(raw: &str) -> Result<String> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hex.to_ascii_uppercase())
    } else {
        Err(PresentationError::InvalidDeck(format!(
            "invalid colour '{raw}', expected RRGGBB"
        )))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(1.0, 914_400)]
    #[case(0.5, 457_200)]
    #[case(13.333, 12_191_695)]
    #[case(0.0, 0)]
    fn inches_to_emu(#[case] inches: f64, #[case] expected: i64) {
        assert_eq!(emu(inches), expected);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"Q&A <draft> "v2" it's"#),
            "Q&amp;A &lt;draft&gt; &quot;v2&quot; it&apos;s"
        );
        assert_eq!(escape("bell\u{7}tab\t"), "belltab\t");
    }

    #[rstest]
    #[case("#1f77b4", "1F77B4")]
    #[case("FF0000", "FF0000")]
    fn valid_colors(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(hex_color(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("red")]
    #[case("#FFF")]
    #[case("GG0000")]
    fn invalid_colors(#[case] raw: &str) {
        assert!(hex_color(raw).is_err());
    }
}
