//! Escaped script data tracking.
//!
//! Inside `<script>` an HTML comment opener switches the content into the
//! "escaped" sub-state, where a nested `<script` enters "double escaped". While
//! double escaped, `</script>` is not an end tag. The scanner sees every byte
//! of script content exactly once, in order, no matter how the input was
//! chunked, and keeps the longest suffix that may still grow into a trigger.

use memchr::{memchr, memchr2};

use crate::token::is_html_whitespace;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum ScriptMode {
    #[default]
    Script,
    Escaped,
    DoubleEscaped,
}

struct Trigger {
    word: &'static [u8],
    /// Requires a following whitespace, `/` or `>` byte.
    delimited: bool,
    next: ScriptMode,
    /// Bytes of the match kept as the new carry.
    keep: usize,
}

impl Trigger {
    fn pattern_len(&self) -> usize {
        self.word.len() + usize::from(self.delimited)
    }

    fn matches(&self, carry: &[u8]) -> bool {
        let Some(start) = carry.len().checked_sub(self.pattern_len()) else {
            return false;
        };
        let candidate = &carry[start..];
        let word = &candidate[..self.word.len()];
        if !word.eq_ignore_ascii_case(self.word) {
            return false;
        }
        !self.delimited || is_trigger_delimiter(candidate[self.word.len()])
    }

    fn starts_with(&self, carry: &[u8]) -> bool {
        carry.len() < self.pattern_len()
            && carry.len() <= self.word.len()
            && carry.eq_ignore_ascii_case(&self.word[..carry.len()])
    }
}

const SCRIPT_TRIGGERS: &[Trigger] = &[Trigger {
    word: b"<!--",
    delimited: false,
    next: ScriptMode::Escaped,
    keep: 2,
}];

const ESCAPED_TRIGGERS: &[Trigger] = &[
    Trigger {
        word: b"-->",
        delimited: false,
        next: ScriptMode::Script,
        keep: 0,
    },
    Trigger {
        word: b"<script",
        delimited: true,
        next: ScriptMode::DoubleEscaped,
        keep: 0,
    },
];

const DOUBLE_ESCAPED_TRIGGERS: &[Trigger] = &[
    Trigger {
        word: b"-->",
        delimited: false,
        next: ScriptMode::Script,
        keep: 0,
    },
    Trigger {
        word: b"</script",
        delimited: true,
        next: ScriptMode::Escaped,
        keep: 0,
    },
];

/// One more than the longest pattern, so a full match fits after a push.
const CARRY_CAPACITY: usize = 9;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ScriptScanner {
    mode: ScriptMode,
    carry: [u8; CARRY_CAPACITY],
    carry_len: u8,
}

impl ScriptScanner {
    #[cfg(any(test, feature = "debug-stats"))]
    pub(crate) fn mode(&self) -> ScriptMode {
        self.mode
    }

    pub(crate) fn is_double_escaped(&self) -> bool {
        self.mode == ScriptMode::DoubleEscaped
    }

    /// Pending bytes that may still complete a trigger. Never longer than 8.
    pub(crate) fn carry(&self) -> &[u8] {
        &self.carry[..usize::from(self.carry_len)]
    }

    pub(crate) fn feed(&mut self, bytes: &[u8]) {
        let mut i = 0;
        while i < bytes.len() {
            if self.carry_len == 0 {
                let rest = &bytes[i..];
                let found = match self.mode {
                    ScriptMode::Script => memchr(b'<', rest),
                    ScriptMode::Escaped | ScriptMode::DoubleEscaped => memchr2(b'<', b'-', rest),
                };
                match found {
                    Some(rel) => i += rel,
                    None => return,
                }
            }
            self.push(bytes[i]);
            i += 1;
        }
    }

    fn push(&mut self, b: u8) {
        let len = usize::from(self.carry_len);
        self.carry[len] = b;
        self.carry_len += 1;

        let carry = self.carry();
        if let Some(trigger) = triggers(self.mode).iter().find(|t| t.matches(carry)) {
            let len = carry.len();
            #[cfg(any(test, feature = "debug-stats"))]
            let from = self.mode;
            self.mode = trigger.next;
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(target: "html.tokenizer", "script mode {from:?} -> {:?}", self.mode());
            self.carry.copy_within(len - trigger.keep..len, 0);
            self.carry_len = trigger.keep as u8;
        }
        self.shrink();
    }

    /// Drop leading bytes until the carry is a proper prefix of a trigger.
    fn shrink(&mut self) {
        let triggers = triggers(self.mode);
        let mut start = 0;
        let len = usize::from(self.carry_len);
        while start < len && !triggers.iter().any(|t| t.starts_with(&self.carry[start..len])) {
            start += 1;
        }
        if start > 0 {
            self.carry.copy_within(start..len, 0);
            self.carry_len = (len - start) as u8;
        }
    }
}

impl PartialEq for ScriptScanner {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && self.carry() == other.carry()
    }
}

impl Eq for ScriptScanner {}

fn triggers(mode: ScriptMode) -> &'static [Trigger] {
    match mode {
        ScriptMode::Script => SCRIPT_TRIGGERS,
        ScriptMode::Escaped => ESCAPED_TRIGGERS,
        ScriptMode::DoubleEscaped => DOUBLE_ESCAPED_TRIGGERS,
    }
}

fn is_trigger_delimiter(b: u8) -> bool {
    is_html_whitespace(b) || b == b'/' || b == b'>'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(parts: &[&str]) -> ScriptScanner {
        let mut scanner = ScriptScanner::default();
        for part in parts {
            scanner.feed(part.as_bytes());
        }
        scanner
    }

    #[test]
    fn comment_opener_enters_escaped() {
        let scanner = scan(&["var a = 1; <!--"]);
        assert_eq!(scanner.mode(), ScriptMode::Escaped);
        assert_eq!(scanner.carry(), b"--");
        assert_eq!(scan(&["<!-->"]).mode(), ScriptMode::Script);
        assert_eq!(scan(&["<!--->"]).mode(), ScriptMode::Script);
        assert_eq!(scan(&["<!-<"]).mode(), ScriptMode::Script);
    }

    #[test]
    fn nested_script_enters_double_escaped() {
        assert_eq!(scan(&["<!--<script>"]).mode(), ScriptMode::DoubleEscaped);
        assert_eq!(scan(&["<!--<SCRIPT "]).mode(), ScriptMode::DoubleEscaped);
        assert_eq!(scan(&["<!--<script/"]).mode(), ScriptMode::DoubleEscaped);
        assert_eq!(scan(&["<!--<scripta"]).mode(), ScriptMode::Escaped);
        assert_eq!(scan(&["<!--<script-"]).mode(), ScriptMode::Escaped);
    }

    #[test]
    fn leaving_double_escaped() {
        assert_eq!(
            scan(&["<!--<script></script>"]).mode(),
            ScriptMode::Escaped
        );
        assert_eq!(
            scan(&["<!--<script></ScRiPt "]).mode(),
            ScriptMode::Escaped
        );
        assert_eq!(scan(&["<!--<script>-->"]).mode(), ScriptMode::Script);
        assert_eq!(
            scan(&["<!--<script></scripta"]).mode(),
            ScriptMode::DoubleEscaped
        );
    }

    #[test]
    fn triggers_split_across_feeds() {
        let whole = "x<!--y<script>z</script>w";
        for split in 0..=whole.len() {
            let (a, b) = whole.split_at(split);
            assert_eq!(scan(&[a, b]), scan(&[whole]), "split at {split}");
        }
        let bytes: Vec<String> = whole.chars().map(String::from).collect();
        let parts: Vec<&str> = bytes.iter().map(String::as_str).collect();
        assert_eq!(scan(&parts), scan(&[whole]));
    }

    #[test]
    fn mode_changes_in_byte_order() {
        let input = "<!--<script>x</script>-->";
        let mut scanner = ScriptScanner::default();
        let mut changes = Vec::new();
        for (i, b) in input.bytes().enumerate() {
            let before = scanner.mode();
            scanner.feed(&[b]);
            if scanner.mode() != before {
                changes.push((i, scanner.mode()));
            }
        }
        assert_eq!(
            changes,
            vec![
                (3, ScriptMode::Escaped),
                (11, ScriptMode::DoubleEscaped),
                (21, ScriptMode::Escaped),
                (24, ScriptMode::Script),
            ]
        );
    }

    #[test]
    fn carry_is_bounded() {
        let scanner = scan(&["<!--<script></script"]);
        assert_eq!(scanner.mode(), ScriptMode::DoubleEscaped);
        assert_eq!(scanner.carry(), b"</script");
        assert!(scan(&["<!--<script"]).carry().len() <= 8);
        assert_eq!(scan(&["plain text"]).carry(), b"");
    }
}
