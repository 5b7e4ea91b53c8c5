//! Tokenizer states and the per-byte transition function.
//!
//! Several HTML states collapse into one here because they only differ in how
//! the finished token is classified, which happens on emission:
//! - `TagOpen` also covers the RCDATA/RAWTEXT/script "less-than sign" states.
//! - `BeforeAttributeName` also covers "self-closing start tag" and
//!   "after attribute value (quoted)".
//! - `AttributeName` also covers "after attribute name".
//! - `BogusComment` covers markup declarations, comments, doctypes and CDATA.

use crate::token::is_html_whitespace;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TokenizerState {
    #[default]
    Data,
    /// Just after `\r`; held so CRLF is never split across text tokens.
    DataCarriageReturn,
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    BogusComment,
    CharacterReference,
    NamedCharacterReference,
    NumericCharacterReference,
    HexadecimalCharacterReference,
    DecimalCharacterReference,
}

/// Outcome of feeding one byte to a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Consume the byte and move to the state.
    Next(TokenizerState),
    /// Move to the state without consuming the byte.
    Reconsume(TokenizerState),
    /// Consume the byte (always `>`) and emit the pending markup.
    EmitTag,
}

impl TokenizerState {
    pub(crate) fn on_byte(self, b: u8) -> Transition {
        use Transition::{EmitTag, Next, Reconsume};
        use TokenizerState::*;

        match self {
            Data => match b {
                b'&' => Next(CharacterReference),
                b'<' => Next(TagOpen),
                b'\r' => Next(DataCarriageReturn),
                _ => Next(Data),
            },
            DataCarriageReturn => Reconsume(Data),
            TagOpen => match b {
                b if b.is_ascii_alphabetic() => Next(TagName),
                b'/' => Next(EndTagOpen),
                b'!' | b'?' => Next(BogusComment),
                _ => Reconsume(Data),
            },
            EndTagOpen => match b {
                b if b.is_ascii_alphabetic() => Next(TagName),
                b'>' => EmitTag,
                _ => Next(BogusComment),
            },
            TagName => match b {
                b'>' => EmitTag,
                b'/' => Next(BeforeAttributeName),
                b if is_html_whitespace(b) => Next(BeforeAttributeName),
                _ => Next(TagName),
            },
            BeforeAttributeName => match b {
                b'>' => EmitTag,
                b'/' => Next(BeforeAttributeName),
                b if is_html_whitespace(b) => Next(BeforeAttributeName),
                _ => Next(AttributeName),
            },
            AttributeName => match b {
                b'=' => Next(BeforeAttributeValue),
                b'>' => EmitTag,
                b'/' => Next(BeforeAttributeName),
                _ => Next(AttributeName),
            },
            BeforeAttributeValue => match b {
                b'"' => Next(AttributeValueDoubleQuoted),
                b'\'' => Next(AttributeValueSingleQuoted),
                b'>' => EmitTag,
                b if is_html_whitespace(b) => Next(BeforeAttributeValue),
                _ => Next(AttributeValueUnquoted),
            },
            AttributeValueDoubleQuoted => match b {
                b'"' => Next(BeforeAttributeName),
                _ => Next(AttributeValueDoubleQuoted),
            },
            AttributeValueSingleQuoted => match b {
                b'\'' => Next(BeforeAttributeName),
                _ => Next(AttributeValueSingleQuoted),
            },
            AttributeValueUnquoted => match b {
                b'>' => EmitTag,
                b if is_html_whitespace(b) => Next(BeforeAttributeName),
                _ => Next(AttributeValueUnquoted),
            },
            BogusComment => match b {
                b'>' => EmitTag,
                _ => Next(BogusComment),
            },
            CharacterReference => match b {
                b if b.is_ascii_alphabetic() => Next(NamedCharacterReference),
                b'#' => Next(NumericCharacterReference),
                _ => Reconsume(Data),
            },
            NamedCharacterReference => match b {
                b if b.is_ascii_alphanumeric() => Next(NamedCharacterReference),
                _ => Reconsume(Data),
            },
            NumericCharacterReference => match b {
                b'x' | b'X' => Next(HexadecimalCharacterReference),
                b if b.is_ascii_digit() => Next(DecimalCharacterReference),
                _ => Reconsume(Data),
            },
            HexadecimalCharacterReference => match b {
                b if b.is_ascii_hexdigit() => Next(HexadecimalCharacterReference),
                _ => Reconsume(Data),
            },
            DecimalCharacterReference => match b {
                b if b.is_ascii_digit() => Next(DecimalCharacterReference),
                _ => Reconsume(Data),
            },
        }
    }

    pub(crate) fn is_character_reference(self) -> bool {
        matches!(
            self,
            TokenizerState::CharacterReference
                | TokenizerState::NamedCharacterReference
                | TokenizerState::NumericCharacterReference
                | TokenizerState::HexadecimalCharacterReference
                | TokenizerState::DecimalCharacterReference
        )
    }
}

/// Length of a run of well-formed `name=value` attributes (plus surrounding
/// whitespace) at the start of `bytes`.
///
/// Only complete attributes count: an unquoted value must be followed by
/// whitespace or `>` inside `bytes`, a quoted value by its closing quote.
/// Skipping the run lands in the same state the byte rules would reach.
pub(crate) fn attribute_run_len(bytes: &[u8]) -> usize {
    let skip_whitespace = |mut pos: usize| {
        while pos < bytes.len() && is_html_whitespace(bytes[pos]) {
            pos += 1;
        }
        pos
    };
    let plain_run = |pos: usize| {
        pos + bytes[pos..]
            .iter()
            .take_while(|&&b| is_plain_attribute_byte(b))
            .count()
    };

    let mut pos = skip_whitespace(0);
    let mut accepted = pos;
    loop {
        let name_end = plain_run(pos);
        if name_end == pos || bytes.get(name_end) != Some(&b'=') {
            break;
        }
        let value_start = name_end + 1;
        let value_end = match bytes.get(value_start) {
            Some(&quote @ (b'"' | b'\'')) => {
                match memchr::memchr(quote, &bytes[value_start + 1..]) {
                    Some(rel) => value_start + 1 + rel + 1,
                    None => break,
                }
            }
            _ => {
                let end = plain_run(value_start);
                let terminated = bytes
                    .get(end)
                    .is_some_and(|&b| b == b'>' || is_html_whitespace(b));
                if end == value_start || !terminated {
                    break;
                }
                end
            }
        };
        pos = skip_whitespace(value_end);
        accepted = pos;
    }
    accepted
}

fn is_plain_attribute_byte(b: u8) -> bool {
    !is_html_whitespace(b) && !matches!(b, b'<' | b'=' | b'>' | b'\'' | b'"' | b'/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_runs_stop_at_incomplete_attributes() {
        assert_eq!(attribute_run_len(b"a=b c=\"d\" e='f'>"), 15);
        assert_eq!(attribute_run_len(b"  a=b>"), 5);
        assert_eq!(attribute_run_len(b"a=b"), 0);
        assert_eq!(attribute_run_len(b"a=b c=d"), 4);
        assert_eq!(attribute_run_len(b"a=\"b"), 0);
        assert_eq!(attribute_run_len(b"a b=c>"), 0);
        assert_eq!(attribute_run_len(b"a=b=c>"), 0);
        assert_eq!(attribute_run_len(b"=a>"), 0);
        assert_eq!(attribute_run_len(b" / a=b>"), 1);
    }

    #[test]
    fn attribute_run_matches_byte_rules() {
        let input = b"a=b c='d>' e=\"f\" >";
        let skipped = attribute_run_len(input);
        let mut state = TokenizerState::BeforeAttributeName;
        for &b in &input[..skipped] {
            match state.on_byte(b) {
                Transition::Next(next) => state = next,
                other => panic!("unexpected transition {other:?}"),
            }
        }
        assert_eq!(state, TokenizerState::BeforeAttributeName);
        assert_eq!(state.on_byte(input[skipped]), Transition::EmitTag);
    }

    #[test]
    fn data_transitions() {
        use TokenizerState::*;
        assert_eq!(Data.on_byte(b'<'), Transition::Next(TagOpen));
        assert_eq!(Data.on_byte(b'&'), Transition::Next(CharacterReference));
        assert_eq!(DataCarriageReturn.on_byte(b'\n'), Transition::Reconsume(Data));
        assert_eq!(TagOpen.on_byte(b' '), Transition::Reconsume(Data));
        assert_eq!(EndTagOpen.on_byte(b'>'), Transition::EmitTag);
        assert_eq!(EndTagOpen.on_byte(b'%'), Transition::Next(BogusComment));
        assert_eq!(NamedCharacterReference.on_byte(b';'), Transition::Reconsume(Data));
    }
}
