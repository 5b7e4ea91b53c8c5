//! Deterministic token formatting for snapshots and the command line.
//!
//! One token per line. Raw tokens show their source text; parsed tokens show
//! decoded values, with attributes in name order.

use crate::token::{RawToken, Token};
use std::fmt::Write;

/// Extension trait for deterministic token snapshot formatting.
pub trait TokenTestFormatExt {
    fn to_test_string(&self) -> String;
}

impl TokenTestFormatExt for RawToken {
    fn to_test_string(&self) -> String {
        match self {
            RawToken::Text { raw, kind } => {
                format!("CHAR kind={} raw=\"{}\"", kind.as_str(), escape_text(raw))
            }
            RawToken::StartTag { tag_name, raw } => {
                format!("START name={tag_name} raw=\"{}\"", escape_text(raw))
            }
            RawToken::EndTag { tag_name, raw } => {
                format!("END name={tag_name} raw=\"{}\"", escape_text(raw))
            }
            RawToken::Doctype { raw } => format!("DOCTYPE raw=\"{}\"", escape_text(raw)),
            RawToken::Comment { raw } => format!("COMMENT raw=\"{}\"", escape_text(raw)),
            RawToken::Garbage { raw } => format!("GARBAGE raw=\"{}\"", escape_text(raw)),
        }
    }
}

impl TokenTestFormatExt for Token {
    fn to_test_string(&self) -> String {
        match self {
            Token::Text { value } => format!("CHAR text=\"{}\"", escape_text(value)),
            Token::StartTag {
                tag_name,
                attributes,
            } => {
                let mut out = String::new();
                out.push_str("START name=");
                out.push_str(tag_name);
                out.push_str(" attrs=[");
                for (i, (name, value)) in attributes.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    let _ = write!(&mut out, "{name}=\"{}\"", escape_text(value));
                }
                out.push(']');
                out
            }
            Token::EndTag { tag_name } => format!("END name={tag_name}"),
            Token::Doctype => "DOCTYPE".to_string(),
            Token::Comment { value } => format!("COMMENT text=\"{}\"", escape_text(value)),
            Token::Garbage { raw } => format!("GARBAGE raw=\"{}\"", escape_text(raw)),
        }
    }
}

/// Escape quotes, backslashes and control characters for single-line output.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' || ch == '\u{7f}' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}
