//! Shared helpers for the tokenizer's test suites.
//!
//! - [`chunker`]: chunk plans, seeded fuzz plans and plan shrinking.
//! - [`fixtures`]: TOML snapshot fixtures.
//! - [`diff_lines`]: readable first-mismatch diffs for line snapshots.

pub mod chunker;
pub mod fixtures;

/// Describe the first mismatch between two line snapshots with context.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let mut out = String::new();
    use std::fmt::Write;
    let mut mismatch = None;
    let missing = "<missing>";
    for i in 0..max {
        let left = expected.get(i).map(String::as_str).unwrap_or(missing);
        let right = actual.get(i).map(String::as_str).unwrap_or(missing);
        if left != right {
            mismatch = Some(i);
            break;
        }
    }
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for line_idx in start..end {
            let left = expected
                .get(line_idx)
                .map(String::as_str)
                .unwrap_or(missing);
            let right = actual.get(line_idx).map(String::as_str).unwrap_or(missing);
            let marker = if line_idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", line_idx + 1);
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", line_idx + 1);
        }
    }
    if expected.len() != actual.len() && mismatch.is_none() {
        let _ = writeln!(
            &mut out,
            "prefix matched but lengths differ (expected {} lines, actual {} lines)",
            expected.len(),
            actual.len()
        );
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::diff_lines;

    #[test]
    fn diff_points_at_first_mismatch() {
        let expected = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let actual = vec!["a".to_string(), "x".to_string(), "c".to_string()];
        let out = diff_lines(&expected, &actual);
        assert!(out.starts_with("first mismatch at line 2"));
        assert!(out.contains(">    2  expected: b"));
        assert!(out.contains(">    2    actual: x"));
    }

    #[test]
    fn diff_reports_length_mismatch() {
        let expected = vec!["a".to_string()];
        let actual = vec!["a".to_string(), "b".to_string()];
        let out = diff_lines(&expected, &actual);
        assert!(out.contains("<missing>"));
        assert!(out.ends_with("expected 1 lines, actual 2 lines\n"));
    }
}
