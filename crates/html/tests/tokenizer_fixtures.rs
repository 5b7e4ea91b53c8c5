use html::{RawToken, TokenTestFormatExt, TokenizerConfig, tokenize, tokenize_chunks};
use html_test_support::chunker::{ChunkPlan, build_chunk_plans, shrink_chunk_plan_with_stats};
use html_test_support::diff_lines;
use html_test_support::fixtures::{FixtureStatus, LoadedFixture, load_fixture_dir};
use std::env;
use std::path::{Path, PathBuf};

#[test]
fn tokenizer_fixtures_whole_input() {
    let fixtures = selected_fixtures();
    for fixture in &fixtures {
        if fixture.case.status == FixtureStatus::Skip {
            continue;
        }
        let tokens = run_whole(fixture);
        assert_round_trip(fixture, &tokens, "whole");
        enforce_expected(fixture, &merge_text(tokens), "whole");
    }
}

#[test]
fn tokenizer_fixtures_chunked_input() {
    let fixtures = selected_fixtures();
    let mut fuzz_runs = env_u64("HTML_TOKENIZER_FUZZ_RUNS", 4) as usize;
    if env::var("CI").is_ok() && fuzz_runs == 0 {
        fuzz_runs = 1;
    }
    let fuzz_seed = env_u64("HTML_TOKENIZER_FUZZ_SEED", 0xC0FFEE);
    for fixture in &fixtures {
        if fixture.case.status == FixtureStatus::Skip {
            continue;
        }
        let whole = snapshot(&merge_text(run_whole(fixture)));
        for case in build_chunk_plans(&fixture.case.input, fuzz_runs, fuzz_seed) {
            let tokens = run_chunked(fixture, &case.plan);
            assert_round_trip(fixture, &tokens, &case.label);
            let actual = snapshot(&merge_text(tokens));
            if actual != whole {
                let (shrunk, stats) =
                    shrink_chunk_plan_with_stats(&fixture.case.input, &case.plan, |candidate| {
                        snapshot(&merge_text(run_chunked(fixture, candidate))) != whole
                    });
                panic!(
                    "chunked output mismatch in fixture '{}'\nplan: {}\nshrunk: {}\nchunks: {:?}\nshrink stats: {:?}\n{}",
                    fixture.id,
                    case.label,
                    shrunk,
                    shrunk.chunks(&fixture.case.input),
                    stats,
                    diff_lines(&whole, &actual)
                );
            }
        }
    }
}

fn config(fixture: &LoadedFixture) -> TokenizerConfig {
    TokenizerConfig {
        scripting: fixture.case.scripting,
    }
}

fn run_whole(fixture: &LoadedFixture) -> Vec<RawToken> {
    tokenize(&fixture.case.input, config(fixture))
}

fn run_chunked(fixture: &LoadedFixture, plan: &ChunkPlan) -> Vec<RawToken> {
    tokenize_chunks(plan.chunks(&fixture.case.input), config(fixture))
}

/// Join adjacent text tokens of the same kind; text may be emitted in pieces.
fn merge_text(tokens: Vec<RawToken>) -> Vec<RawToken> {
    let mut out: Vec<RawToken> = Vec::with_capacity(tokens.len());
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

fn snapshot(tokens: &[RawToken]) -> Vec<String> {
    tokens.iter().map(RawToken::to_test_string).collect()
}

fn parsed_snapshot(tokens: &[RawToken]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| token.parse().to_test_string())
        .collect()
}

fn assert_round_trip(fixture: &LoadedFixture, tokens: &[RawToken], label: &str) {
    let rebuilt: String = tokens.iter().map(RawToken::raw).collect();
    assert_eq!(
        rebuilt, fixture.case.input,
        "round trip failed for fixture '{}' [{label}]",
        fixture.id
    );
}

fn enforce_expected(fixture: &LoadedFixture, tokens: &[RawToken], label: &str) {
    let raw = snapshot(tokens);
    let parsed = parsed_snapshot(tokens);
    let raw_mismatch = raw != fixture.case.tokens;
    let parsed_mismatch = fixture
        .case
        .parsed
        .as_ref()
        .is_some_and(|expected| *expected != parsed);
    match fixture.case.status {
        FixtureStatus::Active => {
            if raw_mismatch {
                panic!(
                    "raw token mismatch in fixture '{}' [{label}]\npath: {}\n{}",
                    fixture.id,
                    fixture.path.display(),
                    diff_lines(&fixture.case.tokens, &raw)
                );
            }
            if let Some(expected) = &fixture.case.parsed
                && parsed_mismatch
            {
                panic!(
                    "parsed token mismatch in fixture '{}' [{label}]\npath: {}\n{}",
                    fixture.id,
                    fixture.path.display(),
                    diff_lines(expected, &parsed)
                );
            }
        }
        FixtureStatus::Xfail => {
            if !raw_mismatch && !parsed_mismatch {
                panic!(
                    "fixture '{}' [{label}] matched expected tokens but is marked xfail; reason: {}\npath: {}",
                    fixture.id,
                    fixture.case.reason.as_deref().unwrap_or("<missing reason>"),
                    fixture.path.display()
                );
            }
        }
        FixtureStatus::Skip => {}
    }
}

fn selected_fixtures() -> Vec<LoadedFixture> {
    let filter = env::var("HTML_TOKENIZER_CASE").ok();
    let fixtures: Vec<LoadedFixture> = load_fixture_dir(&fixture_root())
        .into_iter()
        .filter(|fixture| filter.as_deref().is_none_or(|f| fixture.id.contains(f)))
        .collect();
    assert!(!fixtures.is_empty(), "no fixtures matched filter");
    fixtures
}

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("tokenizer")
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}
