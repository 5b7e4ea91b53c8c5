//! Incremental UTF-8 decoding for chunked byte sources.
//!
//! The tokenizer consumes `&str` chunks, so a scalar value split across two
//! reads has to be held back until its remaining bytes arrive. Invalid
//! sequences become U+FFFD exactly as [`String::from_utf8_lossy`] would
//! produce them for the concatenated input.

const REPLACEMENT: char = '\u{FFFD}';

/// Longest UTF-8 sequence.
const MAX_SEQUENCE: usize = 4;

/// Append the decoded form of `bytes` to `text`.
///
/// `carry` holds an incomplete sequence from the previous call (at most three
/// bytes) and is updated with the incomplete tail of this one.
pub fn push_utf8_chunk(text: &mut String, carry: &mut Vec<u8>, bytes: &[u8]) {
    let mut rest = bytes;
    while !carry.is_empty() && !rest.is_empty() {
        let take = MAX_SEQUENCE.saturating_sub(carry.len()).min(rest.len());
        let mut pending = std::mem::take(carry);
        pending.extend_from_slice(&rest[..take]);
        rest = &rest[take..];
        decode_into(text, carry, &pending);
    }
    if !rest.is_empty() {
        decode_into(text, carry, rest);
    }
}

/// Flush a dangling incomplete sequence as one U+FFFD.
pub fn finish_utf8(text: &mut String, carry: &mut Vec<u8>) {
    if !carry.is_empty() {
        text.push(REPLACEMENT);
        carry.clear();
    }
}

fn decode_into(text: &mut String, carry: &mut Vec<u8>, bytes: &[u8]) {
    let mut chunks = bytes.utf8_chunks().peekable();
    while let Some(chunk) = chunks.next() {
        text.push_str(chunk.valid());
        let invalid = chunk.invalid();
        if invalid.is_empty() {
            continue;
        }
        if chunks.peek().is_none() && is_truncated(invalid) {
            carry.extend_from_slice(invalid);
        } else {
            text.push(REPLACEMENT);
        }
    }
}

/// A valid sequence prefix cut off by the end of the buffer.
fn is_truncated(bytes: &[u8]) -> bool {
    matches!(std::str::from_utf8(bytes), Err(err) if err.error_len().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_split(bytes: &[u8], cuts: &[usize]) -> String {
        let mut text = String::new();
        let mut carry = Vec::new();
        let mut last = 0;
        for &cut in cuts {
            push_utf8_chunk(&mut text, &mut carry, &bytes[last..cut]);
            last = cut;
        }
        push_utf8_chunk(&mut text, &mut carry, &bytes[last..]);
        finish_utf8(&mut text, &mut carry);
        text
    }

    #[test]
    fn split_multibyte_across_chunks() {
        let mut text = String::new();
        let mut carry = Vec::new();

        push_utf8_chunk(&mut text, &mut carry, &[0xC3]);
        assert_eq!(text, "");
        assert_eq!(carry, vec![0xC3]);

        push_utf8_chunk(&mut text, &mut carry, &[0x97, b'<']);
        assert_eq!(text, "\u{D7}<");
        assert!(carry.is_empty());
    }

    #[test]
    fn carry_is_recreated_from_trailing_sequence() {
        let mut text = String::new();
        let mut carry = Vec::new();

        // "\u{20AC}" is E2 82 AC.
        push_utf8_chunk(&mut text, &mut carry, &[0xE2]);
        push_utf8_chunk(&mut text, &mut carry, &[0x82, 0xAC, 0xE2]);
        assert_eq!(text, "\u{20AC}");
        assert_eq!(carry, vec![0xE2]);
    }

    #[test]
    fn invalid_bytes_make_progress() {
        assert_eq!(decode_split(&[0xFF, b'f'], &[]), "\u{FFFD}f");
        assert_eq!(decode_split(&[0xE0, 0x80, b'a'], &[1]), "\u{FFFD}\u{FFFD}a");
    }

    #[test]
    fn incomplete_suffix_is_flushed_once() {
        assert_eq!(decode_split(&[b'a', 0xF0, 0x9F, 0x98], &[2]), "a\u{FFFD}");
    }

    #[test]
    fn every_split_matches_lossy_decoding() {
        let bytes: Vec<u8> = [
            "a\u{D7}<p>".as_bytes(),
            &[0xF0, 0x9F, 0x98, 0x80],
            &[0xED, 0xA0, 0x80],
            &[0xC3, b'x', 0xFF],
            "&euro;\u{20AC}".as_bytes(),
            &[0xF4, 0x90],
        ]
        .concat();
        let expected = String::from_utf8_lossy(&bytes).into_owned();
        for i in 0..=bytes.len() {
            for j in i..=bytes.len() {
                assert_eq!(decode_split(&bytes, &[i, j]), expected, "cuts at {i} and {j}");
            }
        }
    }
}
