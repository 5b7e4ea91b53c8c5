//! Raw-to-value decoding for text, comments and attribute values.

use super::TextKind;
use crate::charref::{self, REPLACEMENT};
use crate::entities;
use memchr::{memchr2, memchr3};
use std::borrow::Cow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DecodeMode {
    Data,
    Rcdata,
    Rawtext,
    Attribute,
    Comment,
}

impl From<TextKind> for DecodeMode {
    fn from(kind: TextKind) -> Self {
        match kind {
            TextKind::Data => DecodeMode::Data,
            TextKind::Rcdata => DecodeMode::Rcdata,
            TextKind::Rawtext => DecodeMode::Rawtext,
        }
    }
}

impl DecodeMode {
    fn decodes_references(self) -> bool {
        matches!(
            self,
            DecodeMode::Data | DecodeMode::Rcdata | DecodeMode::Attribute
        )
    }
}

/// Decode the raw source of a text token.
///
/// CR and CRLF become LF in every content model. `Data` and `Rcdata` decode
/// character references; `Rawtext` leaves them verbatim. NUL is dropped in
/// `Data` and replaced with U+FFFD otherwise.
pub fn text_value(raw: &str, kind: TextKind) -> Cow<'_, str> {
    decode(raw, kind.into())
}

/// Decode the raw source of a comment token.
///
/// Handles complete comments (`<!--x-->`, `<!--x--!>`), abruptly closed ones
/// (`<!-->`, `<!--->`), comments cut off by end of input, and bogus comments
/// (`<!x>`, `<?x>`, `</%x>`).
pub fn comment_value(raw: &str) -> String {
    decode(comment_body(raw), DecodeMode::Comment).into_owned()
}

fn comment_body(raw: &str) -> &str {
    if let Some(rest) = raw.strip_prefix("<!--") {
        if raw.ends_with("-->") {
            return if raw.len() <= "<!--->".len() {
                ""
            } else {
                &raw[4..raw.len() - 3]
            };
        }
        if raw.len() >= 8
            && let Some(body) = rest.strip_suffix("--!>")
        {
            return body;
        }
        // Cut off by end of input: a trailing partial terminator is not content.
        return ["--!", "--", "-"]
            .iter()
            .find_map(|&suffix| rest.strip_suffix(suffix))
            .unwrap_or(rest);
    }
    let body = if raw.starts_with("<?") {
        &raw[1..]
    } else if raw.starts_with("<!") || raw.starts_with("</") {
        &raw[2..]
    } else {
        raw
    };
    body.strip_suffix('>').unwrap_or(body)
}

pub(crate) fn decode(raw: &str, mode: DecodeMode) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    let next_special = |from: usize| {
        let hay = &bytes[from..];
        let found = if mode.decodes_references() {
            memchr3(b'\r', b'\0', b'&', hay)
        } else {
            memchr2(b'\r', b'\0', hay)
        };
        found.map(|rel| from + rel)
    };

    let Some(mut pos) = next_special(0) else {
        return Cow::Borrowed(raw);
    };
    let mut out = String::with_capacity(raw.len());
    let mut copied = 0;
    loop {
        out.push_str(&raw[copied..pos]);
        pos = match bytes[pos] {
            b'\r' => {
                out.push('\n');
                if bytes.get(pos + 1) == Some(&b'\n') {
                    pos + 2
                } else {
                    pos + 1
                }
            }
            b'\0' => {
                if mode != DecodeMode::Data {
                    out.push(REPLACEMENT);
                }
                pos + 1
            }
            b'&' => pos + decode_reference(&raw[pos..], mode, &mut out),
            other => unreachable!("decode stopped on unexpected byte {other:#04x}"),
        };
        copied = pos;
        match next_special(pos) {
            Some(next) => pos = next,
            None => break,
        }
    }
    out.push_str(&raw[copied..]);
    Cow::Owned(out)
}

/// Decode the reference at the start of `s` into `out`, returning the number of
/// bytes consumed.
fn decode_reference(s: &str, mode: DecodeMode, out: &mut String) -> usize {
    let Some(len) = charref::reference_len(s) else {
        out.push('&');
        return 1;
    };
    let reference = &s[..len];
    if mode == DecodeMode::Attribute && !applies_in_attribute(reference, s.as_bytes().get(len)) {
        out.push_str(reference);
    } else {
        out.push_str(&charref::resolve(reference));
    }
    len
}

/// Inside attribute values a named reference without `;` is only honored when
/// it is a legacy name in full and is not followed by `=`.
fn applies_in_attribute(reference: &str, next: Option<&u8>) -> bool {
    let body = &reference[1..];
    if body.starts_with('#') {
        return true;
    }
    match body.strip_suffix(';') {
        Some(name) => entities::lookup(name).is_some(),
        None => entities::lookup_legacy(body).is_some() && next != Some(&b'='),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(raw: &str) -> String {
        text_value(raw, TextKind::Data).into_owned()
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(text_value("Hello, world!", TextKind::Data), Cow::Borrowed(_)));
        assert!(matches!(text_value("a & b", TextKind::Rawtext), Cow::Borrowed(_)));
    }

    #[test]
    fn stray_markup_is_kept() {
        for raw in ["a < b", "a &", "a & b", "foo&bar;", "<&>", "<&#>", "<&;>", "<&#x>", "<&#z>"] {
            assert_eq!(data(raw), raw);
        }
    }

    #[test]
    fn references_are_substituted() {
        assert_eq!(data("a &amp; b"), "a & b");
        assert_eq!(data("a&ampb"), "a&b");
        assert_eq!(data("a &notin; b"), "a \u{2209} b");
        assert_eq!(data("a &notit; b"), "a \u{AC}it; b");
        assert_eq!(data("a &#38; b"), "a & b");
        assert_eq!(data("a &#38 b"), "a & b");
        assert_eq!(data("a&#38b"), "a&b");
    }

    #[test]
    fn carriage_returns_become_line_feeds() {
        assert_eq!(data("a\r\n"), "a\n");
        assert_eq!(data("a\r"), "a\n");
        assert_eq!(
            data("a\n\n\nb\n\n\rc\n\r\nd\n\r\re\r\n\nf\r\n\rg\r\r\nh\r\r\ri"),
            "a\n\n\nb\n\n\nc\n\nd\n\n\ne\n\nf\n\ng\n\nh\n\n\ni"
        );
        assert_eq!(text_value("x\r\ny", TextKind::Rawtext), "x\ny");
    }

    #[test]
    fn nul_handling_depends_on_content_model() {
        assert_eq!(text_value("a\0b", TextKind::Data), "ab");
        assert_eq!(text_value("a\0b", TextKind::Rcdata), "a\u{FFFD}b");
        assert_eq!(text_value("a\0b", TextKind::Rawtext), "a\u{FFFD}b");
    }

    #[test]
    fn rcdata_decodes_references_rawtext_does_not() {
        assert_eq!(text_value("&lt;b&gt;", TextKind::Rcdata), "<b>");
        assert_eq!(text_value("&lt;b&gt;", TextKind::Rawtext), "&lt;b&gt;");
    }

    #[test]
    fn comment_shapes() {
        assert_eq!(comment_value("<!---->"), "");
        assert_eq!(comment_value("<!-- c -->"), " c ");
        assert_eq!(comment_value("<!-->"), "");
        assert_eq!(comment_value("<!--->"), "");
        assert_eq!(comment_value("<!--<!--->"), "<!-");
        assert_eq!(comment_value("<!--a--!>"), "a");
        assert_eq!(comment_value("<!----!>"), "");
        assert_eq!(comment_value("<!--!>-->"), "!>");
        assert_eq!(comment_value("<!---!>-->"), "-!>");
    }

    #[test]
    fn unterminated_comments_drop_partial_terminators() {
        assert_eq!(comment_value("<!--"), "");
        assert_eq!(comment_value("<!-- c"), " c");
        assert_eq!(comment_value("<!-- a -"), " a ");
        assert_eq!(comment_value("<!--a--"), "a");
        assert_eq!(comment_value("<!--a--!"), "a");
        assert_eq!(comment_value("<!--a---"), "a-");
        assert_eq!(comment_value("<!---!>"), "-!>");
    }

    #[test]
    fn bogus_comments() {
        assert_eq!(comment_value("<?xml version=1?>"), "?xml version=1?");
        assert_eq!(comment_value("<!>"), "");
        assert_eq!(comment_value("<!->"), "-");
        assert_eq!(comment_value("</%>"), "%");
        assert_eq!(comment_value("</#a>"), "#a");
        assert_eq!(comment_value("<![CDATA[x]]>"), "[CDATA[x]]");
        assert_eq!(comment_value("<!x"), "x");
    }

    #[test]
    fn comment_bodies_fold_newlines_and_nul() {
        assert_eq!(comment_value("<!--a\r\nb\rc\0-->"), "a\nb\nc\u{FFFD}");
        assert_eq!(comment_value("<!--&amp;-->"), "&amp;");
    }

    #[test]
    fn attribute_references() {
        let attr = |raw: &str| decode(raw, DecodeMode::Attribute).into_owned();
        assert_eq!(attr("a&amp;b"), "a&b");
        assert_eq!(attr("&amp"), "&");
        assert_eq!(attr("&amp x"), "& x");
        assert_eq!(attr("foo=bar&copy=true"), "foo=bar&copy=true");
        assert_eq!(attr("&copyx"), "&copyx");
        assert_eq!(attr("&notit;"), "&notit;");
        assert_eq!(attr("&#38;&#x26"), "&&");
        assert_eq!(attr("a\0b"), "a\u{FFFD}b");
    }
}
