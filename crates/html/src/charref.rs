//! Character reference resolution.
//!
//! Two questions are answered here:
//! - [`may_continue_reference`]: can a partial reference still grow into a
//!   legal one? The tokenizer asks this when a chunk ends mid-reference.
//! - [`resolve`]: what does a complete (or provably maximal) reference decode to?
//!
//! Numeric references saturate instead of overflowing, so a reference with
//! thousands of digits still decodes to U+FFFD.

use crate::entities::{self, MAX_NAME_LEN};
use std::borrow::Cow;

pub const REPLACEMENT: char = '\u{FFFD}';

/// Remapping for numeric references in `0x80..=0x9F`. Unassigned slots map to
/// themselves.
const WINDOWS_1252: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Whether `s` is a strict prefix of some legal character reference.
///
/// Named candidates (`&[a-zA-Z][a-zA-Z0-9]*`) are answered by a prefix search
/// over the entity table. Numeric candidates must be a non-empty proper prefix
/// of `&#[0-9]+;` or `&#[xX][0-9a-fA-F]+;`. Anything already containing a
/// terminator or an illegal character returns `false`.
pub fn may_continue_reference(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('&') else {
        return false;
    };
    let bytes = rest.as_bytes();
    match bytes.first() {
        None => true,
        Some(b) if b.is_ascii_alphabetic() => {
            rest.len() <= MAX_NAME_LEN
                && bytes.iter().all(u8::is_ascii_alphanumeric)
                && entities::has_name_with_prefix(rest)
        }
        Some(b'#') => match bytes.get(1) {
            Some(b'x' | b'X') => bytes[2..].iter().all(u8::is_ascii_hexdigit),
            _ => bytes[1..].iter().all(u8::is_ascii_digit),
        },
        Some(_) => false,
    }
}

/// Decode a character reference.
///
/// `reference` must start with `&`. Accepted shapes are `&name;`, `&name`
/// (legacy names, possibly followed by more name characters which are kept
/// verbatim), `&#digits;?` and `&#xhex;?`. Unknown names and malformed input
/// come back unchanged.
pub fn resolve(reference: &str) -> Cow<'_, str> {
    let Some(body) = reference.strip_prefix('&') else {
        return Cow::Borrowed(reference);
    };
    if let Some(numeric) = body.strip_prefix('#') {
        return match parse_numeric(numeric) {
            Some(codepoint) => Cow::Owned(resolve_codepoint(codepoint).to_string()),
            None => Cow::Borrowed(reference),
        };
    }

    let (name, terminated) = match body.strip_suffix(';') {
        Some(name) => (name, true),
        None => (body, false),
    };
    if !is_reference_name(name) {
        return Cow::Borrowed(reference);
    }
    if terminated && let Some(value) = entities::lookup(name) {
        return Cow::Borrowed(value);
    }
    match entities::longest_legacy_prefix(name) {
        Some((len, value)) if len == body.len() => Cow::Borrowed(value),
        Some((len, value)) => {
            let rest = &body[len..];
            let mut out = String::with_capacity(value.len() + rest.len());
            out.push_str(value);
            out.push_str(rest);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(reference),
    }
}

/// Map a numeric reference value to the scalar it denotes.
pub fn resolve_codepoint(codepoint: u32) -> char {
    match codepoint {
        0 | 0xD800..=0xDFFF => REPLACEMENT,
        0x80..=0x9F => WINDOWS_1252[(codepoint - 0x80) as usize],
        _ => char::from_u32(codepoint).unwrap_or(REPLACEMENT),
    }
}

/// Length in bytes of the reference at the start of `s`, if any.
///
/// Matches the longest prefix of `s` of the form
/// `&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z][a-zA-Z0-9]*);?`. Used by the text
/// decoders to delimit what [`resolve`] receives.
pub fn reference_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }
    let end = match bytes.get(1)? {
        b'#' => {
            let (start, hex) = match bytes.get(2) {
                Some(b'x' | b'X') => (3, true),
                _ => (2, false),
            };
            let digits = bytes[start..]
                .iter()
                .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
                .count();
            if digits == 0 {
                return None;
            }
            start + digits
        }
        b if b.is_ascii_alphabetic() => {
            1 + bytes[1..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric())
                .count()
        }
        _ => return None,
    };
    Some(if bytes.get(end) == Some(&b';') { end + 1 } else { end })
}

fn parse_numeric(numeric: &str) -> Option<u32> {
    let numeric = numeric.strip_suffix(';').unwrap_or(numeric);
    let (digits, radix) = match numeric.as_bytes().first()? {
        b'x' | b'X' => (&numeric[1..], 16),
        _ => (numeric, 10),
    };
    if digits.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for b in digits.bytes() {
        let digit = char::from(b).to_digit(radix)?;
        value = value.saturating_mul(radix).saturating_add(digit);
    }
    Some(value)
}

fn is_reference_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic()) && bytes.all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_strings_without_ampersand() {
        assert!(!may_continue_reference(""));
        assert!(!may_continue_reference("amp"));
    }

    #[test]
    fn rejects_complete_references() {
        for s in ["&#123;", "&#xA0;", "&amp;", "&Acirc;", "&#123; + 1", "&amp; &amp;", "&Acirc; B"] {
            assert!(!may_continue_reference(s), "{s}");
        }
    }

    #[test]
    fn rejects_references_closed_by_invalid_characters() {
        for s in ["&%", "&#o", "&# ", "&#xG0;", "&#FFFF;", "&amp+", "&foobar;", "&foo"] {
            assert!(!may_continue_reference(s), "{s}");
        }
    }

    #[test]
    fn accepts_reference_prefixes() {
        for s in [
            "&", "&#", "&#x", "&#X", "&#x0", "&#x0F", "&#4", "&#45", "&#452", "&a", "&am", "&amp",
            "&f", "&fs", "&fsc", "&fscr",
        ] {
            assert!(may_continue_reference(s), "{s}");
        }
    }

    #[test]
    fn overlong_names_are_rejected() {
        let long = format!("&{}", "a".repeat(MAX_NAME_LEN + 1));
        assert!(!may_continue_reference(&long));
        assert!(may_continue_reference("&CounterClockwiseContourIntegral"));
    }

    #[test]
    fn numeric_references() {
        for s in ["&#106;", "&#0106;", "&#x6a;", "&#x6A;", "&#X6a;", "&#X6A;"] {
            assert_eq!(resolve(s), "j", "{s}");
        }
        for s in ["&#106", "&#0106", "&#x6a", "&#X6A"] {
            assert_eq!(resolve(s), "j", "{s}");
        }
        assert_eq!(resolve("&#000000000000000000000000000106;"), "j");
        assert_eq!(resolve("&#x0000000000000000000000000006a;"), "j");
    }

    #[test]
    fn windows_1252_remapping() {
        assert_eq!(resolve("&#x7F;"), "\u{7F}");
        assert_eq!(resolve("&#x80;"), "\u{20AC}");
        assert_eq!(resolve("&#x81;"), "\u{81}");
        assert_eq!(resolve("&#x82;"), "\u{201A}");
        assert_eq!(resolve("&#x95;"), "\u{2022}");
        assert_eq!(resolve("&#x9F;"), "\u{178}");
        assert_eq!(resolve("&#xA0;"), "\u{A0}");
        assert_eq!(resolve("&#128;"), "\u{20AC}");
        assert_eq!(resolve("&#159;"), "\u{178}");
        assert_eq!(resolve("&#160;"), "\u{A0}");
    }

    #[test]
    fn invalid_codepoints_become_replacement() {
        for s in [
            "&#x0;", "&#0;", "&#xD800;", "&#55296;", "&#xDBFF;", "&#xDC00;", "&#xDFFF;",
            "&#57343;", "&#x110000;", "&#1114112;", "&#x110001;",
        ] {
            assert_eq!(resolve(s), "\u{FFFD}", "{s}");
        }
        assert_eq!(resolve("&#xD7FF;"), "\u{D7FF}");
        assert_eq!(resolve("&#xE000;"), "\u{E000}");
        assert_eq!(resolve("&#xFFFE;"), "\u{FFFE}");
        assert_eq!(resolve("&#65535;"), "\u{FFFF}");
        assert_eq!(resolve("&#x10000;"), "\u{10000}");
        assert_eq!(resolve("&#x10FFFF;"), "\u{10FFFF}");
        assert_eq!(resolve("&#1114111;"), "\u{10FFFF}");
    }

    #[test]
    fn huge_numeric_references_saturate() {
        assert_eq!(resolve("&#x123456789ABCDEF123456789ABCDEF;"), "\u{FFFD}");
        assert_eq!(resolve("&#123456789123456789123456789123456789;"), "\u{FFFD}");
        let hex = format!("&#x{};", "123456789ABCDEF".repeat(1000));
        assert_eq!(resolve(&hex), "\u{FFFD}");
        let dec = format!("&#{};", "9".repeat(3000));
        assert_eq!(resolve(&dec), "\u{FFFD}");
    }

    #[test]
    fn named_references() {
        assert_eq!(resolve("&amp;"), "&");
        assert_eq!(resolve("&lt;"), "<");
        assert_eq!(resolve("&quot;"), "\"");
        assert_eq!(resolve("&frac23;"), "\u{2154}");
        assert_eq!(resolve("&amp"), "&");
        assert_eq!(resolve("&quot"), "\"");
        assert_eq!(resolve("&frac23"), "&frac23");
        assert_eq!(resolve("&foo;"), "&foo;");
    }

    #[test]
    fn legacy_names_splice_trailing_characters() {
        assert_eq!(resolve("&ampfoo;"), "&foo;");
        assert_eq!(resolve("&ltbar;"), "<bar;");
        assert_eq!(resolve("&gtbaz"), ">baz");
        assert_eq!(resolve("&quotquux"), "\"quux");
        assert_eq!(resolve("&notit;"), "\u{AC}it;");
        assert_eq!(resolve("&frac23foo"), "&frac23foo");
    }

    #[test]
    fn malformed_references_are_unchanged() {
        for s in ["&", "&#", "&#x", "&#;", "&;", "& ", "x"] {
            assert_eq!(resolve(s), s, "{s}");
        }
    }

    #[test]
    fn reference_lengths() {
        assert_eq!(reference_len("&amp;x"), Some(5));
        assert_eq!(reference_len("&ampx y"), Some(5));
        assert_eq!(reference_len("&#38b"), Some(4));
        assert_eq!(reference_len("&#x26;;"), Some(6));
        assert_eq!(reference_len("&#xg"), None);
        assert_eq!(reference_len("&#"), None);
        assert_eq!(reference_len("&;"), None);
        assert_eq!(reference_len("a&amp;"), None);
    }
}
