#![no_main]

use html::{RawToken, Tokenizer, TokenizerConfig, tokenize};
use libfuzzer_sys::fuzz_target;

fn merge_text(tokens: Vec<RawToken>) -> Vec<RawToken> {
    let mut out: Vec<RawToken> = Vec::new();
    for token in tokens {
        if let RawToken::Text { raw, kind } = &token
            && let Some(RawToken::Text {
                raw: last_raw,
                kind: last_kind,
            }) = out.last_mut()
            && last_kind == kind
        {
            last_raw.push_str(raw);
            continue;
        }
        out.push(token);
    }
    out
}

// First byte picks the config, the next two seed the split points; the rest is
// the document.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let config = TokenizerConfig {
        scripting: data[0] & 1 == 1,
    };
    let mut step = usize::from(data[1] % 16) + 1;
    let jitter = usize::from(data[2]);
    let input = String::from_utf8_lossy(&data[3..]);

    let whole = tokenize(&input, config);
    let rebuilt: String = whole.iter().map(RawToken::raw).collect();
    assert_eq!(rebuilt, input, "round trip");

    let mut tokenizer = Tokenizer::new(config);
    let mut chunked = Vec::new();
    let mut offset = 0;
    while offset < input.len() {
        let mut end = (offset + step).min(input.len());
        while !input.is_char_boundary(end) {
            end += 1;
        }
        tokenizer.add_chunk(&input[offset..end], |token| chunked.push(token));
        offset = end;
        step = (step + jitter) % 17 + 1;
    }
    tokenizer.finish(|token| chunked.push(token));
    assert_eq!(tokenizer, Tokenizer::new(config), "finish resets the tokenizer");

    let whole = merge_text(whole);
    let chunked = merge_text(chunked);
    assert_eq!(whole, chunked, "chunk invariance");
    for token in &whole {
        let _ = token.parse();
        let _ = token.split_whitespace();
    }
});
