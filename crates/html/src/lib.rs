//! Incremental HTML tokenizer.
//!
//! - [`tokenizer`]: the resumable state machine that turns chunks of text into
//!   [`RawToken`]s.
//! - [`token`]: the raw/parsed token model and the pure decoders that turn raw
//!   source into values.
//! - [`charref`] and [`entities`]: character reference resolution.

pub mod charref;
pub mod entities;
pub mod token;
pub mod tokenizer;

pub use crate::token::{Attributes, RawToken, TextKind, Token};
pub use crate::tokenizer::{
    SpecialContent, TokenTestFormatExt, Tokenizer, TokenizerConfig, TokenizerState,
    TokenizerStats,
};

/// Tokenize a complete document.
pub fn tokenize(input: &str, config: TokenizerConfig) -> Vec<RawToken> {
    tokenize_chunks([input], config)
}

/// Tokenize a document delivered as a sequence of chunks.
pub fn tokenize_chunks<I, S>(chunks: I, config: TokenizerConfig) -> Vec<RawToken>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokenizer = Tokenizer::new(config);
    let mut tokens = Vec::new();
    for chunk in chunks {
        tokenizer.add_chunk(chunk.as_ref(), |token| tokens.push(token));
    }
    tokenizer.finish(|token| tokens.push(token));
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_matches_chunked_round_trip() {
        let input = "<p class=a>x &amp; y</p><!-- z -->";
        let whole = tokenize(input, TokenizerConfig::default());
        let chunked = tokenize_chunks(input.split_inclusive('>'), TokenizerConfig::default());
        let rebuilt: String = chunked.iter().map(RawToken::raw).collect();
        assert_eq!(rebuilt, input);
        assert_eq!(whole, chunked);
        assert_eq!(
            whole.iter().map(|t| t.parse()).collect::<Vec<_>>(),
            vec![
                Token::StartTag {
                    tag_name: "p".to_string(),
                    attributes: Attributes::from([("class".to_string(), "a".to_string())]),
                },
                Token::Text {
                    value: "x & y".to_string()
                },
                Token::EndTag {
                    tag_name: "p".to_string()
                },
                Token::Comment {
                    value: " z ".to_string()
                },
            ]
        );
    }
}
