//! Generator for `crates/html/src/entities/table.rs`.
//!
//! Input is the WHATWG `entities.json` map, keyed by `&name;` or `&name`:
//!
//! ```json
//! { "&amp;": { "codepoints": [38], "characters": "&" }, "&amp": { ... } }
//! ```
//!
//! Semicolon-terminated names go to `NAMED` with their decoded text. Names
//! without `;` are the legacy aliases and go to `LEGACY`; each must decode
//! exactly like its `;` form.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write;

pub const HEADER: &str = "\
// Generated from the WHATWG named character reference list
// (https://html.spec.whatwg.org/entities.json). Do not edit by hand.
// Regenerate with `cargo run -p tools --bin gen_entities -- <entities.json>`.
";

#[derive(Debug, Deserialize)]
struct Entity {
    codepoints: Vec<u32>,
    characters: String,
}

/// Validate `entities.json` and render the Rust table module.
pub fn render_table(json: &str) -> Result<String> {
    let entities: BTreeMap<String, Entity> =
        serde_json::from_str(json).context("failed to parse entities.json")?;

    let mut named: Vec<(&str, &str)> = Vec::new();
    let mut legacy: Vec<&str> = Vec::new();
    for (key, entity) in &entities {
        let decoded = entity
            .codepoints
            .iter()
            .map(|&cp| char::from_u32(cp))
            .collect::<Option<String>>();
        if decoded.as_deref() != Some(entity.characters.as_str()) {
            bail!("invalid entity {key}: codepoint mismatch");
        }

        let Some(body) = key.strip_prefix('&') else {
            bail!("invalid entity {key}: invalid format");
        };
        match body.strip_suffix(';') {
            Some(name) if is_reference_name(name) => {
                named.push((name, entity.characters.as_str()));
            }
            None if is_reference_name(body) => {
                let terminated = entities.get(&format!("{key};"));
                if terminated.map(|e| e.characters.as_str()) != Some(entity.characters.as_str()) {
                    bail!("invalid entity {key}: does not correspond with its `;` form");
                }
                legacy.push(body);
            }
            _ => bail!("invalid entity {key}: invalid format"),
        }
    }
    // Keys carry the `;`, which sorts after digits, so re-sort by bare name.
    named.sort_unstable_by(|a, b| a.0.cmp(b.0));
    if named.is_empty() {
        bail!("entities.json contains no semicolon-terminated names");
    }

    let max_name_len = named.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::with_capacity(json.len() / 2);
    out.push_str(HEADER);
    out.push('\n');
    out.push_str("/// Length of the longest semicolon-terminated name, excluding `&` and `;`.\n");
    let _ = writeln!(out, "pub const MAX_NAME_LEN: usize = {max_name_len};");
    out.push('\n');
    out.push_str("/// Semicolon-terminated names (without `&` and `;`), sorted bytewise.\n");
    out.push_str("pub(super) static NAMED: &[(&str, &str)] = &[\n");
    for (name, value) in &named {
        let _ = writeln!(out, "    (\"{name}\", \"{}\"),", escape_value(value));
    }
    out.push_str("];\n\n");
    out.push_str("/// Names that are also recognized without a trailing `;`, sorted bytewise.\n");
    out.push_str("pub(super) static LEGACY: &[&str] = &[\n");
    for name in &legacy {
        let _ = writeln!(out, "    \"{name}\",");
    }
    out.push_str("];\n");
    Ok(out)
}

/// `[a-zA-Z][a-zA-Z0-9]*`
fn is_reference_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic()) && bytes.all(|b| b.is_ascii_alphanumeric())
}

/// Printable ASCII stays literal except `"` and `\`; everything else is a
/// `\u{..}` escape.
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 2);
    for ch in value.chars() {
        if matches!(ch, ' '..='~') && ch != '"' && ch != '\\' {
            out.push(ch);
        } else {
            let _ = write!(out, "\\u{{{:x}}}", ch as u32);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "&lt;": { "codepoints": [60], "characters": "<" },
        "&lt": { "codepoints": [60], "characters": "<" },
        "&AElig;": { "codepoints": [198], "characters": "\u00C6" },
        "&AElig": { "codepoints": [198], "characters": "\u00C6" },
        "&quot;": { "codepoints": [34], "characters": "\"" },
        "&nvlt;": { "codepoints": [60, 8402], "characters": "<\u20D2" },
        "&CounterClockwiseContourIntegral;": { "codepoints": [8755], "characters": "\u2233" }
    }"#;

    #[test]
    fn renders_sorted_tables() {
        let table = render_table(SAMPLE).unwrap();
        let expected = format!(
            "{HEADER}
/// Length of the longest semicolon-terminated name, excluding `&` and `;`.
pub const MAX_NAME_LEN: usize = 31;

/// Semicolon-terminated names (without `&` and `;`), sorted bytewise.
pub(super) static NAMED: &[(&str, &str)] = &[
    (\"AElig\", \"\\u{{c6}}\"),
    (\"CounterClockwiseContourIntegral\", \"\\u{{2233}}\"),
    (\"lt\", \"<\"),
    (\"nvlt\", \"<\\u{{20d2}}\"),
    (\"quot\", \"\\u{{22}}\"),
];

/// Names that are also recognized without a trailing `;`, sorted bytewise.
pub(super) static LEGACY: &[&str] = &[
    \"AElig\",
    \"lt\",
];
"
        );
        assert_eq!(table, expected);
    }

    #[test]
    fn rejects_codepoint_mismatch() {
        let json = r#"{ "&amp;": { "codepoints": [39], "characters": "&" } }"#;
        let err = render_table(json).unwrap_err().to_string();
        assert!(err.contains("codepoint mismatch"), "{err}");
    }

    #[test]
    fn rejects_malformed_names() {
        for key in ["&1x;", "amp;", "&a-b;", "&;"] {
            let json = format!(r#"{{ "{key}": {{ "codepoints": [38], "characters": "&" }} }}"#);
            let err = render_table(&json).unwrap_err().to_string();
            assert!(err.contains("invalid format"), "{key}: {err}");
        }
    }

    #[test]
    fn legacy_alias_must_match_terminated_form() {
        let json = r#"{
            "&amp;": { "codepoints": [38], "characters": "&" },
            "&amp": { "codepoints": [60], "characters": "<" }
        }"#;
        let err = render_table(json).unwrap_err().to_string();
        assert!(err.contains("does not correspond"), "{err}");

        let json = r#"{ "&amp": { "codepoints": [38], "characters": "&" } }"#;
        assert!(render_table(json).is_err());
    }

    #[test]
    fn escapes_quote_backslash_and_controls() {
        assert_eq!(escape_value("a\"\\\t\u{a0}'"), "a\\u{22}\\u{5c}\\u{9}\\u{a0}'");
    }
}
