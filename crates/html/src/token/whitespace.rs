use super::{TextKind, is_html_whitespace};
use crate::charref;

/// Split raw text at the end of its leading whitespace.
///
/// Outside RAWTEXT a character reference that decodes to whitespace
/// (`&#10;`, `&Tab;`) is treated like the character itself. Empty halves come
/// back as `None`.
pub fn split_leading_whitespace(raw: &str, kind: TextKind) -> (Option<&str>, Option<&str>) {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if is_html_whitespace(bytes[i]) {
            i += 1;
            continue;
        }
        if bytes[i] == b'&'
            && kind != TextKind::Rawtext
            && let Some(len) = whitespace_reference_len(&raw[i..])
        {
            i += len;
            continue;
        }
        break;
    }
    let (before, after) = raw.split_at(i);
    (
        (!before.is_empty()).then_some(before),
        (!after.is_empty()).then_some(after),
    )
}

fn whitespace_reference_len(s: &str) -> Option<usize> {
    let len = charref::reference_len(s)?;
    let value = charref::resolve(&s[..len]);
    let all_whitespace = !value.is_empty() && value.bytes().all(is_html_whitespace);
    all_whitespace.then_some(len)
}
