//! Attribute extraction from the raw text of a start tag.

use super::decode::{DecodeMode, decode};
use super::{Attributes, is_html_whitespace, normalize_tag_name, tag_name_end};
use memchr::memchr;

/// Re-lex the attributes of a raw start tag such as `<a href="x" download>`.
///
/// Follows the HTML attribute states: names end at whitespace, `/`, `>` or
/// `=` (a leading `=` is part of the name), values may be double-quoted,
/// single-quoted or unquoted, and stray `/` separators are skipped. Names are
/// normalized like tag names; values are decoded with attribute reference
/// rules. The first occurrence of a duplicate name wins.
pub fn parse_attributes(raw: &str) -> Attributes {
    let mut attributes = Attributes::new();
    if !raw.starts_with('<') {
        return attributes;
    }
    let bytes = raw.as_bytes();
    let len = bytes.len();
    let mut i = tag_name_end(raw, 1);

    loop {
        while i < len && (is_html_whitespace(bytes[i]) || bytes[i] == b'/') {
            i += 1;
        }
        if i >= len || bytes[i] == b'>' {
            break;
        }

        let name_start = i;
        i += 1;
        while i < len && !is_attribute_name_stop(bytes[i]) {
            i += 1;
        }
        let name = &raw[name_start..i];

        while i < len && is_html_whitespace(bytes[i]) {
            i += 1;
        }
        let mut value = "";
        if i < len && bytes[i] == b'=' {
            i += 1;
            while i < len && is_html_whitespace(bytes[i]) {
                i += 1;
            }
            match bytes.get(i) {
                Some(&quote @ (b'"' | b'\'')) => {
                    let start = i + 1;
                    let end = memchr(quote, &bytes[start..]).map_or(len, |rel| start + rel);
                    value = &raw[start..end];
                    i = (end + 1).min(len);
                }
                Some(b'>') | None => {}
                Some(_) => {
                    let start = i;
                    while i < len && !is_html_whitespace(bytes[i]) && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = &raw[start..i];
                }
            }
        }

        let name = normalize_tag_name(name);
        if !attributes.contains_key(name.as_ref()) {
            let value = decode(value, DecodeMode::Attribute).into_owned();
            attributes.insert(name.into_owned(), value);
        }
    }

    attributes
}

fn is_attribute_name_stop(b: u8) -> bool {
    is_html_whitespace(b) || matches!(b, b'/' | b'>' | b'=')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(raw: &str) -> Vec<(String, String)> {
        parse_attributes(raw).into_iter().collect()
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn quoted_and_unquoted_values() {
        assert_eq!(
            attrs("<div a=1 b='2' c=\"3\" d>"),
            pairs(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "")])
        );
        assert_eq!(attrs("<div foo=\"bar>baz\">"), pairs(&[("foo", "bar>baz")]));
        assert_eq!(attrs("<div foo = 'bar'>"), pairs(&[("foo", "bar")]));
    }

    #[test]
    fn no_attributes() {
        assert!(parse_attributes("<div>").is_empty());
        assert!(parse_attributes("<br/>").is_empty());
        assert!(parse_attributes("<div   >").is_empty());
    }

    #[test]
    fn names_are_lowercased_and_first_wins() {
        assert_eq!(
            attrs("<p ID=one id=two Class=x>"),
            pairs(&[("class", "x"), ("id", "one")])
        );
        assert_eq!(attrs("<p a\0b=1>"), pairs(&[("a\u{FFFD}b", "1")]));
    }

    #[test]
    fn stray_equals_and_slashes() {
        assert_eq!(attrs("<div =foo=\"bar\">"), pairs(&[("=foo", "bar")]));
        assert_eq!(attrs("<div a / foo='x'>"), pairs(&[("a", ""), ("foo", "x")]));
        assert_eq!(attrs("<div a =foo=\"bar>"), pairs(&[("a", "foo=\"bar")]));
        assert_eq!(attrs("<div fo=o=\"bar>"), pairs(&[("fo", "o=\"bar")]));
        assert_eq!(attrs("<img src=x/>"), pairs(&[("src", "x/")]));
        assert_eq!(attrs("<img src='x'/>"), pairs(&[("src", "x")]));
    }

    #[test]
    fn missing_whitespace_between_attributes() {
        assert_eq!(attrs("<a b='1'c=2>"), pairs(&[("b", "1"), ("c", "2")]));
    }

    #[test]
    fn values_decode_references_with_attribute_rules() {
        assert_eq!(
            attrs("<a href=\"?x=1&amp;y=2&copy=3\" title=&lt;b&gt;>"),
            pairs(&[("href", "?x=1&y=2&copy=3"), ("title", "<b>")])
        );
        assert_eq!(attrs("<a t='a\r\nb'>"), pairs(&[("t", "a\nb")]));
    }

    #[test]
    fn empty_value_before_close() {
        assert_eq!(attrs("<a b=>"), pairs(&[("b", "")]));
        assert_eq!(attrs("<a b=''>"), pairs(&[("b", "")]));
    }
}
