use anyhow::{Context, Result, anyhow};
use html::{RawToken, TokenTestFormatExt, Tokenizer, TokenizerConfig};
use mimalloc::MiMalloc;
use simple_logger::SimpleLogger;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use tools::utf8::{finish_utf8, push_utf8_chunk};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEFAULT_CHUNK_SIZE: usize = 8192;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Raw,
    Parsed,
    Json,
    ParsedJson,
}

fn main() -> Result<()> {
    let matches = clap::Command::new("html-tokenize")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tokenize an HTML document incrementally and print one token per line")
        .arg(
            clap::Arg::new("file")
                .help("The file to tokenize (reads stdin when omitted or '-')")
                .index(1),
        )
        .arg(
            clap::Arg::new("chunk-size")
                .help("Bytes handed to the tokenizer per call")
                .long("chunk-size")
                .short('c')
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("scripting")
                .help("Treat <noscript> content as raw text")
                .long("scripting")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("parsed")
                .help("Print decoded tokens instead of raw source")
                .long("parsed")
                .short('p')
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("json")
                .help("Print tokens as JSON lines")
                .long("json")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("log-level")
                .help("Log level (off, error, warn, info, debug, trace)")
                .long("log-level")
                .default_value("warn"),
        )
        .get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map_or("warn", String::as_str);
    let level: log::LevelFilter = level
        .parse()
        .map_err(|_| anyhow!("invalid log level: {level}"))?;
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("failed to initialize logger")?;

    let chunk_size = matches
        .get_one::<usize>("chunk-size")
        .copied()
        .unwrap_or(DEFAULT_CHUNK_SIZE);
    if chunk_size == 0 {
        return Err(anyhow!("--chunk-size must be at least 1"));
    }
    let config = TokenizerConfig {
        scripting: matches.get_flag("scripting"),
    };
    let format = match (matches.get_flag("parsed"), matches.get_flag("json")) {
        (false, false) => OutputFormat::Raw,
        (true, false) => OutputFormat::Parsed,
        (false, true) => OutputFormat::Json,
        (true, true) => OutputFormat::ParsedJson,
    };

    let input: Box<dyn Read> = match matches.get_one::<String>("file").map(String::as_str) {
        None | Some("-") => Box::new(io::stdin().lock()),
        Some(path) => Box::new(File::open(path).with_context(|| format!("failed to open {path}"))?),
    };
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let tokenizer = run(input, &mut out, chunk_size, config, format)?;
    out.flush().context("failed to write output")?;

    let stats = tokenizer.stats();
    log::info!(
        "tokenized {} bytes in {} chunks: {} tokens, {} state transitions",
        stats.bytes,
        stats.chunks,
        stats.tokens_emitted,
        stats.state_transitions
    );
    Ok(())
}

/// Stream `input` through a tokenizer `chunk_size` bytes at a time.
fn run(
    mut input: impl Read,
    out: &mut impl Write,
    chunk_size: usize,
    config: TokenizerConfig,
    format: OutputFormat,
) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::new(config);
    let mut buf = vec![0u8; chunk_size];
    let mut text = String::with_capacity(chunk_size);
    let mut carry = Vec::new();
    let mut tokens = Vec::new();

    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).context("failed to read input"),
        };
        push_utf8_chunk(&mut text, &mut carry, &buf[..n]);
        if !text.is_empty() {
            tokenizer.add_chunk(&text, |token| tokens.push(token));
            text.clear();
        }
        write_tokens(out, tokens.drain(..), format)?;
    }

    finish_utf8(&mut text, &mut carry);
    if !text.is_empty() {
        tokenizer.add_chunk(&text, |token| tokens.push(token));
    }
    tokenizer.finish(|token| tokens.push(token));
    write_tokens(out, tokens.drain(..), format)?;
    Ok(tokenizer)
}

fn write_tokens(
    out: &mut impl Write,
    tokens: impl Iterator<Item = RawToken>,
    format: OutputFormat,
) -> Result<()> {
    for token in tokens {
        let line = match format {
            OutputFormat::Raw => token.to_test_string(),
            OutputFormat::Parsed => token.parse().to_test_string(),
            OutputFormat::Json => serde_json::to_string(&token)?,
            OutputFormat::ParsedJson => serde_json::to_string(&token.parse())?,
        };
        writeln!(out, "{line}").context("failed to write output")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string(input: &[u8], chunk_size: usize, format: OutputFormat) -> String {
        let mut out = Vec::new();
        run(input, &mut out, chunk_size, TokenizerConfig::default(), format).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn raw_output_is_one_line_per_token() {
        let out = run_to_string(b"<p>a &amp; b</p>", 3, OutputFormat::Raw);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.first(), Some(&"START name=p raw=\"<p>\""));
        assert_eq!(lines.last(), Some(&"END name=p raw=\"</p>\""));
        let text: String = lines
            .iter()
            .filter_map(|line| line.strip_prefix("CHAR kind=data raw=\""))
            .map(|rest| rest.trim_end_matches('"'))
            .collect();
        assert_eq!(text, "a &amp; b");
    }

    #[test]
    fn parsed_output_decodes_values() {
        let out = run_to_string(b"<a HREF='x&amp;y'>", 1, OutputFormat::Parsed);
        assert_eq!(out, "START name=a attrs=[href=\"x&y\"]\n");
    }

    #[test]
    fn multibyte_characters_survive_one_byte_reads() {
        let out = run_to_string("<b>\u{E9}\u{1F600}</b>".as_bytes(), 1, OutputFormat::Parsed);
        let text: String = out
            .lines()
            .filter_map(|line| line.strip_prefix("CHAR text=\""))
            .map(|rest| rest.trim_end_matches('"'))
            .collect();
        assert_eq!(text, "\u{E9}\u{1F600}");
    }

    #[test]
    fn json_lines_are_tagged() {
        let out = run_to_string(b"<!--x-->", 64, OutputFormat::Json);
        assert_eq!(out, "{\"type\":\"Comment\",\"raw\":\"<!--x-->\"}\n");
        let out = run_to_string(b"<!--x-->", 64, OutputFormat::ParsedJson);
        assert_eq!(out, "{\"type\":\"Comment\",\"value\":\"x\"}\n");
    }
}
