//! PDF string encodings.

use lopdf::Object;

/// Encode for a WinAnsi font. Characters outside Latin-1 become `?`.
pub(crate) fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// A text string the way readers display it: UTF-16BE with a BOM, else
/// single-byte.
pub(crate) fn decode(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        },
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// A literal string object: Latin-1 when it fits, UTF-16BE otherwise.
pub(crate) fn string_object(text: &str) -> Object {
    if text.chars().all(|c| u32::from(c) <= 0xFF) {
        Object::string_literal(latin1(text))
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::string_literal(bytes)
    }
}

/// The decoded value of a string object, if it is one.
pub(crate) fn object_text(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Greedy word wrap to at most `width` characters per line. Words longer
/// than a line are split.
pub(crate) fn wrap(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(width)
                .map_or(word.len(), |(i, _)| i);
            out.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn utf16_round_trip() {
        let object = string_object("Zoë → 東京");
        assert_eq!(object_text(&object).unwrap(), "Zoë → 東京");
        let latin = string_object("Zoë");
        assert!(matches!(latin, Object::String(ref bytes, _) if bytes == &[b'Z', b'o', 0xEB]));
        assert_eq!(object_text(&latin).unwrap(), "Zoë");
    }

    #[test]
    fn latin1_replaces_wide_chars() {
        assert_eq!(latin1("a€b"), b"a?b");
    }

    #[rstest]
    #[case("", 10, vec![""])]
    #[case("short line", 20, vec!["short line"])]
    #[case("the quick brown fox", 10, vec!["the quick", "brown fox"])]
    #[case("abcdefghij klm", 4, vec!["abcd", "efgh", "ij", "klm"])]
    fn wraps(#[case] line: &str, #[case] width: usize, #[case] expected: Vec<&str>) {
        assert_eq!(wrap(line, width), expected);
    }
}
