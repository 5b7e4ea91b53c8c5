use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use html::{RawToken, Token, Tokenizer, TokenizerConfig, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

const BLOCK_TEMPLATE: &str =
    "<div class=box data-x='1 &amp; 2'><span>hello &copy; world</span><img src=x></div>\n";

fn make_blocks(blocks: usize) -> String {
    BLOCK_TEMPLATE.repeat(blocks)
}

fn make_script_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<script>");
    while body.len() < bytes {
        body.push_str("<!--<scri</scri<");
        body.push_str("pt -->");
    }
    body.push_str("</script>");
    body
}

fn make_entity_heavy(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 16);
    while body.len() < bytes {
        body.push_str("&amp;&notin;&not &#x41;&#65;&ampx &bogus; ");
    }
    body
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(&input), TokenizerConfig::default());
            black_box(tokens.len());
        });
    });
}

fn bench_tokenize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_tokenize_large", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(&input), TokenizerConfig::default());
            black_box(tokens.len());
        });
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let tokens = tokenize(&input, TokenizerConfig::default());
    c.bench_function("bench_parse_large", |b| {
        b.iter(|| {
            let parsed: usize = black_box(&tokens)
                .iter()
                .map(RawToken::parse)
                .filter(|token| !matches!(token, Token::Garbage { .. }))
                .count();
            black_box(parsed);
        });
    });
}

fn bench_streaming_chunked(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let chunk_sizes = [1usize, 2, 3, 7, 64, 128, 256, 1024];
    c.bench_function("bench_streaming_chunked", |b| {
        b.iter_batched(
            || Tokenizer::new(TokenizerConfig::default()),
            |mut tokenizer| {
                let mut count = 0usize;
                let mut offset = 0usize;
                let mut size_idx = 0usize;
                while offset < input.len() {
                    let size = chunk_sizes[size_idx % chunk_sizes.len()];
                    let mut end = (offset + size).min(input.len());
                    while !input.is_char_boundary(end) {
                        end += 1;
                    }
                    tokenizer.add_chunk(&input[offset..end], |_| count += 1);
                    offset = end;
                    size_idx += 1;
                }
                tokenizer.finish(|_| count += 1);
                black_box(count);
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_tokenize_script_adversarial(c: &mut Criterion) {
    let input = make_script_adversarial(512 * 1024);
    c.bench_function("bench_tokenize_script_adversarial", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(&input), TokenizerConfig::default());
            black_box(tokens.len());
        });
    });
}

fn bench_tokenize_entity_heavy(c: &mut Criterion) {
    let input = make_entity_heavy(256 * 1024);
    c.bench_function("bench_tokenize_entity_heavy", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(&input), TokenizerConfig::default());
            let text: usize = tokens
                .iter()
                .map(|token| match token.parse() {
                    Token::Text { value } => value.len(),
                    _ => 0,
                })
                .sum();
            black_box(text);
        });
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_tokenize_large,
    bench_parse_large,
    bench_streaming_chunked,
    bench_tokenize_script_adversarial,
    bench_tokenize_entity_heavy
);
criterion_main!(benches);
