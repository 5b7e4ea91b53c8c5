//! Incremental HTML tokenizer.
//!
//! Input arrives as arbitrary `&str` chunks through [`Tokenizer::add_chunk`];
//! tokens are handed to a caller-supplied sink as soon as they are decided.
//! Anything that cannot be decided yet (a `<` that may open a tag, a `&` that
//! may start a reference, a lone `\r`, an unterminated tag) is kept verbatim in
//! the saved suffix and reprocessed with the next chunk.
//!
//! Invariants:
//! - Round trip: concatenating the `raw` of every emitted token reproduces the
//!   input exactly.
//! - Chunk invariance: after merging adjacent text tokens of the same kind,
//!   the token sequence and the final tokenizer state do not depend on how the
//!   input was split.

use crate::charref;
use crate::entities::MAX_NAME_LEN;
use crate::token::{RawToken, TextKind, is_html_whitespace};
use memchr::{memchr, memchr3};
use script::ScriptScanner;
use states::{Transition, attribute_run_len};

mod emit;
mod script;
mod states;
mod token_fmt;

pub use states::TokenizerState;
pub use token_fmt::{TokenTestFormatExt, escape_text};

/// Configuration for the tokenizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Treat `<noscript>` content as raw text, as a browser with scripting
    /// enabled does. When off, its content is tokenized as markup.
    pub scripting: bool,
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub chunks: u64,
    pub bytes: u64,
    pub tokens_emitted: u64,
    pub state_transitions: u64,
}

/// Elements whose content is not tokenized as markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialContent {
    Title,
    Textarea,
    Script,
    Style,
    Xmp,
    Iframe,
    Noembed,
    Noframes,
    Noscript,
    Plaintext,
}

impl SpecialContent {
    /// Look up a normalized (lowercase) tag name.
    pub fn from_tag_name(name: &str) -> Option<Self> {
        Some(match name {
            "title" => SpecialContent::Title,
            "textarea" => SpecialContent::Textarea,
            "script" => SpecialContent::Script,
            "style" => SpecialContent::Style,
            "xmp" => SpecialContent::Xmp,
            "iframe" => SpecialContent::Iframe,
            "noembed" => SpecialContent::Noembed,
            "noframes" => SpecialContent::Noframes,
            "noscript" => SpecialContent::Noscript,
            "plaintext" => SpecialContent::Plaintext,
            _ => return None,
        })
    }

    pub fn tag_name(self) -> &'static str {
        match self {
            SpecialContent::Title => "title",
            SpecialContent::Textarea => "textarea",
            SpecialContent::Script => "script",
            SpecialContent::Style => "style",
            SpecialContent::Xmp => "xmp",
            SpecialContent::Iframe => "iframe",
            SpecialContent::Noembed => "noembed",
            SpecialContent::Noframes => "noframes",
            SpecialContent::Noscript => "noscript",
            SpecialContent::Plaintext => "plaintext",
        }
    }

    pub fn text_kind(self) -> TextKind {
        match self {
            SpecialContent::Title | SpecialContent::Textarea => TextKind::Rcdata,
            _ => TextKind::Rawtext,
        }
    }
}

/// Resumable HTML tokenizer.
///
/// Cloning yields an independent snapshot. Equality compares everything that
/// influences future output and ignores [`TokenizerStats`].
#[derive(Clone, Debug, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
    state: TokenizerState,
    saved: String,
    special: Option<SpecialContent>,
    script: ScriptScanner,
    stats: TokenizerStats,
}

impl PartialEq for Tokenizer {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
            && self.state == other.state
            && self.saved == other.saved
            && self.special == other.special
            && self.script == other.script
    }
}

impl Eq for Tokenizer {}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> TokenizerConfig {
        self.config
    }

    pub fn state(&self) -> TokenizerState {
        self.state
    }

    /// Source text held back until more input decides it.
    pub fn saved(&self) -> &str {
        &self.saved
    }

    /// The element whose content is currently being lexed as text, if any.
    pub fn special_content(&self) -> Option<SpecialContent> {
        self.special
    }

    /// Return a copy of current instrumentation counters.
    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    /// Tokenize one chunk of input, passing every decided token to `emit` in
    /// source order.
    pub fn add_chunk(&mut self, chunk: &str, mut emit: impl FnMut(RawToken)) {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "html.tokenizer",
            "add_chunk: len={} state={:?} saved={} special={:?}",
            chunk.len(),
            self.state,
            self.saved.len(),
            self.special
        );

        let bytes = chunk.as_bytes();
        let len = bytes.len();
        let mut state = self.state;
        // `saved` followed by `chunk[base..]` is the undecided input.
        let mut base = 0;
        let mut i = 0;
        // End of the text run that may be flushed, once data has been seen.
        let mut text_end: Option<usize> = None;
        // Script content before this offset has been fed to the scanner.
        let mut script_pos = 0;
        let mut transitions: u64 = 0;

        loop {
            match state {
                TokenizerState::Data => text_end = Some(i),
                TokenizerState::TagOpen if self.special == Some(SpecialContent::Script) => {
                    self.script.feed(&bytes[script_pos..i]);
                    script_pos = i;
                    if self.script.is_double_escaped() {
                        state = TokenizerState::Data;
                        transitions += 1;
                        continue;
                    }
                }
                TokenizerState::TagName
                | TokenizerState::EndTagOpen
                | TokenizerState::BogusComment => {
                    if let Some(end) = text_end.take() {
                        self.flush_text(&chunk[base..end], &mut emit);
                        base = end;
                    }
                }
                _ => {}
            }
            if i >= len {
                break;
            }
            let b = bytes[i];

            if let Some(special) = self.special {
                match state {
                    TokenizerState::Data if special == SpecialContent::Plaintext && b == b'<' => {
                        i += 1;
                        continue;
                    }
                    TokenizerState::TagOpen if b != b'/' => {
                        state = TokenizerState::Data;
                        transitions += 1;
                        continue;
                    }
                    TokenizerState::EndTagOpen if !b.is_ascii_alphabetic() => {
                        state = TokenizerState::Data;
                        transitions += 1;
                        continue;
                    }
                    TokenizerState::TagName if is_end_tag_name_delimiter(b) => {
                        if !self.pending_end_tag_matches(&chunk[base..i], special) {
                            state = TokenizerState::Data;
                            transitions += 1;
                            continue;
                        }
                        #[cfg(any(test, feature = "debug-stats"))]
                        log::trace!(target: "html.tokenizer", "leaving {special:?} content");
                        self.special = None;
                        self.script = ScriptScanner::default();
                    }
                    TokenizerState::TagName if !b.is_ascii_alphabetic() => {
                        state = TokenizerState::Data;
                        transitions += 1;
                        continue;
                    }
                    _ => {}
                }
            }

            let skip = match state {
                TokenizerState::Data => memchr3(b'<', b'&', b'\r', &bytes[i..]).unwrap_or(len - i),
                TokenizerState::BeforeAttributeName => attribute_run_len(&bytes[i..]),
                TokenizerState::AttributeValueDoubleQuoted => {
                    memchr(b'"', &bytes[i..]).unwrap_or(len - i)
                }
                TokenizerState::AttributeValueSingleQuoted => {
                    memchr(b'\'', &bytes[i..]).unwrap_or(len - i)
                }
                TokenizerState::BogusComment => memchr(b'>', &bytes[i..]).unwrap_or(len - i),
                _ => 0,
            };
            if skip > 0 {
                i += skip;
                continue;
            }

            let next = match state.on_byte(b) {
                Transition::Next(next) => {
                    i += 1;
                    next
                }
                Transition::Reconsume(next) => next,
                Transition::EmitTag => {
                    i += 1;
                    let mut raw = std::mem::take(&mut self.saved);
                    raw.push_str(&chunk[base..i]);
                    base = i;
                    script_pos = i;
                    match self.emit_markup(raw, &mut emit) {
                        Some(unfinished) => {
                            self.saved = unfinished;
                            TokenizerState::BogusComment
                        }
                        None => TokenizerState::Data,
                    }
                }
            };
            if next != state {
                transitions += 1;
            }
            state = next;
        }

        if state == TokenizerState::NamedCharacterReference {
            let may_continue = match text_end {
                Some(end) => charref::may_continue_reference(&chunk[end..]),
                None => {
                    let upto = len.min(base + MAX_NAME_LEN + 1);
                    let mut pending = self.saved.clone();
                    pending.push_str(&chunk[base..upto]);
                    charref::may_continue_reference(&pending)
                }
            };
            if !may_continue {
                state = TokenizerState::Data;
                text_end = Some(len);
            }
        }
        if state.is_character_reference()
            && self.special.is_some_and(|s| s.text_kind() == TextKind::Rawtext)
        {
            // References are inert here; nothing to wait for.
            state = TokenizerState::Data;
            text_end = Some(len);
        }
        if self.special == Some(SpecialContent::Script) {
            self.script.feed(&bytes[script_pos..]);
        }
        match text_end {
            Some(end) => {
                self.flush_text(&chunk[base..end], &mut emit);
                self.saved.push_str(&chunk[end..]);
            }
            None => self.saved.push_str(&chunk[base..]),
        }

        #[cfg(any(test, feature = "debug-stats"))]
        if state != self.state {
            log::trace!(
                target: "html.tokenizer",
                "state {:?} -> {:?} after {} bytes",
                self.state,
                state,
                len
            );
        }
        self.state = state;
        self.stats.chunks = self.stats.chunks.saturating_add(1);
        self.stats.bytes = self.stats.bytes.saturating_add(len as u64);
        self.stats.state_transitions = self.stats.state_transitions.saturating_add(transitions);
    }

    /// Flush everything still pending and reset to the initial state.
    ///
    /// Pending text and undecided references come out as text (references
    /// are left as written). An unterminated tag becomes `Garbage`, or text
    /// inside RCDATA/RAWTEXT content. An unterminated declaration becomes a
    /// doctype or a comment.
    pub fn finish(&mut self, mut emit: impl FnMut(RawToken)) {
        let saved = std::mem::take(&mut self.saved);
        let kind = self.text_kind();
        let token = match self.state {
            TokenizerState::Data
            | TokenizerState::DataCarriageReturn
            | TokenizerState::TagOpen
            | TokenizerState::EndTagOpen
            | TokenizerState::CharacterReference
            | TokenizerState::NamedCharacterReference
            | TokenizerState::NumericCharacterReference
            | TokenizerState::HexadecimalCharacterReference
            | TokenizerState::DecimalCharacterReference => {
                (!saved.is_empty()).then(|| RawToken::text(saved, kind))
            }
            TokenizerState::TagName
            | TokenizerState::BeforeAttributeName
            | TokenizerState::AttributeName
            | TokenizerState::BeforeAttributeValue
            | TokenizerState::AttributeValueDoubleQuoted
            | TokenizerState::AttributeValueSingleQuoted
            | TokenizerState::AttributeValueUnquoted => Some(if self.special.is_some() {
                RawToken::text(saved, kind)
            } else {
                RawToken::Garbage { raw: saved }
            }),
            TokenizerState::BogusComment => {
                if starts_with_doctype(&saved) {
                    Some(RawToken::Doctype { raw: saved })
                } else {
                    (!saved.is_empty()).then_some(RawToken::Comment { raw: saved })
                }
            }
        };
        if let Some(token) = token {
            self.emit_token(token, &mut emit);
        }

        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html.tokenizer", "finish: reset from {:?}", self.state);
        self.state = TokenizerState::Data;
        self.special = None;
        self.script = ScriptScanner::default();
    }

    fn text_kind(&self) -> TextKind {
        self.special.map_or(TextKind::Data, SpecialContent::text_kind)
    }

    /// Classify and emit markup that just saw its `>`. Returns the raw text
    /// back when it is a comment that has not really ended yet.
    fn emit_markup<F: FnMut(RawToken)>(&mut self, raw: String, emit: &mut F) -> Option<String> {
        let bytes = raw.as_bytes();
        let token = if bytes.len() > 1 && bytes[1].is_ascii_alphabetic() {
            let token = RawToken::start_tag(raw);
            if let Some(special) = token.tag_name().and_then(SpecialContent::from_tag_name)
                && (special != SpecialContent::Noscript || self.config.scripting)
            {
                #[cfg(any(test, feature = "debug-stats"))]
                log::trace!(target: "html.tokenizer", "entering {special:?} content");
                self.special = Some(special);
                self.script = ScriptScanner::default();
            }
            token
        } else if bytes.len() > 2 && bytes[1] == b'/' && bytes[2].is_ascii_alphabetic() {
            RawToken::end_tag(raw)
        } else if raw.starts_with("<!--") {
            let closed = raw.ends_with("-->") || (raw.ends_with("--!>") && raw.len() >= 8);
            if !closed {
                return Some(raw);
            }
            RawToken::Comment { raw }
        } else if starts_with_doctype(&raw) {
            RawToken::Doctype { raw }
        } else if raw == "</>" {
            RawToken::Garbage { raw }
        } else {
            RawToken::Comment { raw }
        };
        self.emit_token(token, emit);
        None
    }

    /// Whether `saved + tail` is `</` followed by the name of the element
    /// whose content is being lexed, ignoring ASCII case.
    fn pending_end_tag_matches(&self, tail: &str, special: SpecialContent) -> bool {
        let name = special.tag_name().as_bytes();
        if self.saved.len() + tail.len() != name.len() + 2 {
            return false;
        }
        self.saved
            .bytes()
            .chain(tail.bytes())
            .skip(2)
            .zip(name)
            .all(|(b, &expected)| b.to_ascii_lowercase() == expected)
    }
}

fn is_end_tag_name_delimiter(b: u8) -> bool {
    is_html_whitespace(b) || b == b'/' || b == b'>'
}

fn starts_with_doctype(raw: &str) -> bool {
    raw.get(..9)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<!doctype"))
}
