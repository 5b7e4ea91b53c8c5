//! Token model.
//!
//! The tokenizer emits [`RawToken`]s: each carries the exact source slice that
//! produced it, plus whatever discriminant was already known while lexing (the
//! tag name, the text content model). Concatenating the `raw` of every emitted
//! token reproduces the input byte for byte.
//!
//! [`Token`] is the decoded form. Decoding is a pure function of the raw token,
//! and a `Token` owns its decoded strings, so reading them is free.

use std::borrow::Cow;
use std::collections::BTreeMap;

mod attributes;
mod decode;
mod whitespace;

pub use attributes::parse_attributes;
pub use decode::{comment_value, text_value};
pub use whitespace::split_leading_whitespace;

/// Decoded attributes of a start tag. The first occurrence of a name wins.
pub type Attributes = BTreeMap<String, String>;

/// Content model a text run was lexed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TextKind {
    /// Ordinary content: references decoded, NUL dropped.
    Data,
    /// `<title>`/`<textarea>`: references decoded, tags inert.
    Rcdata,
    /// `<script>`, `<style>`, `<plaintext>`...: references and tags inert.
    Rawtext,
}

impl TextKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TextKind::Data => "data",
            TextKind::Rcdata => "rcdata",
            TextKind::Rawtext => "rawtext",
        }
    }
}

/// A token as emitted by the tokenizer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum RawToken {
    Text { raw: String, kind: TextKind },
    StartTag { tag_name: String, raw: String },
    EndTag { tag_name: String, raw: String },
    Doctype { raw: String },
    Comment { raw: String },
    /// Markup that is neither text, a tag, nor a comment (`</>`, an
    /// unterminated tag at end of input). Consumers skip it.
    Garbage { raw: String },
}

/// A decoded token.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Token {
    Text { value: String },
    StartTag { tag_name: String, attributes: Attributes },
    EndTag { tag_name: String },
    Doctype,
    Comment { value: String },
    Garbage { raw: String },
}

impl RawToken {
    pub fn text(raw: impl Into<String>, kind: TextKind) -> Self {
        RawToken::Text {
            raw: raw.into(),
            kind,
        }
    }

    /// Build a start tag from its source, e.g. `<div class=a>`.
    pub fn start_tag(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let tag_name = normalize_tag_name(tag_name_slice(&raw, 1)).into_owned();
        RawToken::StartTag { tag_name, raw }
    }

    /// Build an end tag from its source, e.g. `</div>`.
    pub fn end_tag(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let tag_name = normalize_tag_name(tag_name_slice(&raw, 2)).into_owned();
        RawToken::EndTag { tag_name, raw }
    }

    /// The exact source text of this token.
    pub fn raw(&self) -> &str {
        match self {
            RawToken::Text { raw, .. }
            | RawToken::StartTag { raw, .. }
            | RawToken::EndTag { raw, .. }
            | RawToken::Doctype { raw }
            | RawToken::Comment { raw }
            | RawToken::Garbage { raw } => raw,
        }
    }

    pub fn into_raw(self) -> String {
        match self {
            RawToken::Text { raw, .. }
            | RawToken::StartTag { raw, .. }
            | RawToken::EndTag { raw, .. }
            | RawToken::Doctype { raw }
            | RawToken::Comment { raw }
            | RawToken::Garbage { raw } => raw,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        match self {
            RawToken::StartTag { tag_name, .. } | RawToken::EndTag { tag_name, .. } => {
                Some(tag_name)
            }
            _ => None,
        }
    }

    /// Decode into the parsed form.
    pub fn parse(&self) -> Token {
        match self {
            RawToken::Text { raw, kind } => Token::Text {
                value: text_value(raw, *kind).into_owned(),
            },
            RawToken::StartTag { tag_name, raw } => Token::StartTag {
                tag_name: tag_name.clone(),
                attributes: parse_attributes(raw),
            },
            RawToken::EndTag { tag_name, .. } => Token::EndTag {
                tag_name: tag_name.clone(),
            },
            RawToken::Doctype { .. } => Token::Doctype,
            RawToken::Comment { raw } => Token::Comment {
                value: comment_value(raw),
            },
            RawToken::Garbage { raw } => Token::Garbage { raw: raw.clone() },
        }
    }

    /// Split a text token at the end of its leading whitespace.
    ///
    /// Whitespace written as a character reference (`&#32;`, `&Tab;`) counts
    /// unless the text is RAWTEXT. Either side is `None` when empty. Tokens
    /// other than text are returned whole as the second element.
    pub fn split_whitespace(&self) -> (Option<RawToken>, Option<RawToken>) {
        let RawToken::Text { raw, kind } = self else {
            return (None, Some(self.clone()));
        };
        let (before, after) = split_leading_whitespace(raw, *kind);
        (
            before.map(|s| RawToken::text(s, *kind)),
            after.map(|s| RawToken::text(s, *kind)),
        )
    }
}

impl From<&RawToken> for Token {
    fn from(raw: &RawToken) -> Self {
        raw.parse()
    }
}

impl Token {
    /// Split a decoded text token at the end of its leading whitespace.
    ///
    /// Same contract as [`RawToken::split_whitespace`]; the value is already
    /// decoded, so only literal whitespace is considered.
    pub fn split_whitespace(&self) -> (Option<Token>, Option<Token>) {
        let Token::Text { value } = self else {
            return (None, Some(self.clone()));
        };
        let split = value
            .bytes()
            .position(|b| !is_html_whitespace(b))
            .unwrap_or(value.len());
        let text = |s: &str| Token::Text {
            value: s.to_string(),
        };
        let (before, after) = value.split_at(split);
        (
            (!before.is_empty()).then(|| text(before)),
            (!after.is_empty()).then(|| text(after)),
        )
    }
}

/// Lowercase ASCII letters and replace NUL with U+FFFD. Everything else,
/// including non-ASCII letters, passes through.
pub fn normalize_tag_name(name: &str) -> Cow<'_, str> {
    if !name.bytes().any(|b| b.is_ascii_uppercase() || b == 0) {
        return Cow::Borrowed(name);
    }
    Cow::Owned(
        name.chars()
            .map(|ch| match ch {
                '\0' => crate::charref::REPLACEMENT,
                ch => ch.to_ascii_lowercase(),
            })
            .collect(),
    )
}

pub(crate) fn is_html_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

/// The tag name in a raw tag, starting after its `<` or `</` prefix.
fn tag_name_slice(raw: &str, prefix: usize) -> &str {
    let rest = raw.get(prefix..).unwrap_or("");
    let end = rest
        .bytes()
        .position(|b| is_html_whitespace(b) || b == b'/' || b == b'>')
        .unwrap_or(rest.len());
    &rest[..end]
}

pub(crate) fn tag_name_end(raw: &str, prefix: usize) -> usize {
    prefix.min(raw.len()) + tag_name_slice(raw, prefix).len()
}

#[cfg(test)]
mod tests;
