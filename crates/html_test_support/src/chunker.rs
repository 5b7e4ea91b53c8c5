//! Chunk plans for streaming test harnesses.
//!
//! Provides deterministic plans plus seeded fuzz plans for reproducible
//! chunk-invariance coverage in CI, and a shrinker that minimizes a failing
//! plan before it is reported. All boundaries are UTF-8 aligned: the tokenizer
//! consumes `&str` chunks, and byte streams are decoded upstream.

use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChunkPlan {
    Fixed { size: usize },
    Sizes { sizes: Vec<usize> },
    Boundaries { indices: Vec<usize> },
}

impl fmt::Display for ChunkPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkPlan::Fixed { size } => write!(f, "fixed size={size}"),
            ChunkPlan::Sizes { sizes } => {
                write!(f, "sizes count={} sizes={sizes:?}", sizes.len())
            }
            ChunkPlan::Boundaries { indices } => {
                write!(f, "boundaries count={} indices={indices:?}", indices.len())
            }
        }
    }
}

impl ChunkPlan {
    pub fn fixed(size: usize) -> Self {
        ChunkPlan::Fixed { size }
    }

    pub fn sizes(sizes: impl Into<Vec<usize>>) -> Self {
        ChunkPlan::Sizes {
            sizes: sizes.into(),
        }
    }

    pub fn boundaries(indices: impl Into<Vec<usize>>) -> Self {
        ChunkPlan::Boundaries {
            indices: indices.into(),
        }
    }

    /// Split `input` according to the plan and hand each non-empty piece to `f`.
    ///
    /// Fixed and size-based plans round each cut up to the next character
    /// boundary. Explicit boundaries that fall inside a character are dropped.
    pub fn for_each_chunk<'a>(&self, input: &'a str, mut f: impl FnMut(&'a str)) {
        let len = input.len();
        match self {
            ChunkPlan::Fixed { size } => {
                assert!(*size > 0, "chunk size must be > 0");
                let mut offset = 0usize;
                while offset < len {
                    let end = ceil_char_boundary(input, offset + size);
                    f(&input[offset..end]);
                    offset = end;
                }
            }
            ChunkPlan::Sizes { sizes } => {
                let mut offset = 0usize;
                for size in sizes {
                    assert!(*size > 0, "chunk size must be > 0");
                    if offset >= len {
                        break;
                    }
                    let end = ceil_char_boundary(input, offset + size);
                    f(&input[offset..end]);
                    offset = end;
                }
                if offset < len {
                    f(&input[offset..]);
                }
            }
            ChunkPlan::Boundaries { indices } => {
                let mut last = 0usize;
                for idx in normalize_boundaries(input, indices) {
                    f(&input[last..idx]);
                    last = idx;
                }
                if last < len {
                    f(&input[last..]);
                }
            }
        }
    }

    /// Collect the chunks of `input` under this plan.
    pub fn chunks<'a>(&self, input: &'a str) -> Vec<&'a str> {
        let mut out = Vec::new();
        self.for_each_chunk(input, |chunk| out.push(chunk));
        out
    }

    /// Interior cut points this plan produces for `input`.
    pub fn cut_points(&self, input: &str) -> Vec<usize> {
        let mut points = Vec::new();
        let mut offset = 0usize;
        self.for_each_chunk(input, |chunk| {
            offset += chunk.len();
            if offset < input.len() {
                points.push(offset);
            }
        });
        points
    }
}

#[derive(Clone, Debug)]
pub struct ChunkPlanCase {
    pub label: String,
    pub plan: ChunkPlan,
}

/// Build deterministic + fuzz chunk plans for the given input.
///
/// - Deterministic plans include fixed sizes and splits around every byte the
///   tokenizer treats as a decision point (`<`, `/`, `>`, `&`, `;`, `#`, `-`,
///   `\r`, quotes).
/// - Fuzz plans are seeded for CI reproducibility.
pub fn build_chunk_plans(input: &str, fuzz_runs: usize, fuzz_seed: u64) -> Vec<ChunkPlanCase> {
    let mut plans = Vec::new();

    for size in [1usize, 2, 3, 4, 7, 8, 16, 64] {
        plans.push(ChunkPlanCase {
            label: format!("fixed size={size}"),
            plan: ChunkPlan::fixed(size),
        });
    }
    plans.push(ChunkPlanCase {
        label: "sizes mixed".to_string(),
        plan: ChunkPlan::sizes(vec![1, 1, 2, 1, 4, 8, 16, 3, 7]),
    });

    let token_boundaries = token_boundary_indices(input);
    if !token_boundaries.is_empty() {
        plans.push(ChunkPlanCase {
            label: format!("token-boundaries count={}", token_boundaries.len()),
            plan: ChunkPlan::boundaries(token_boundaries),
        });
    }

    if fuzz_runs > 0 {
        let mut candidates = char_boundaries(input);
        candidates.extend(token_boundary_indices(input));
        candidates.sort_unstable();
        candidates.dedup();
        for i in 0..fuzz_runs {
            let seed = fuzz_seed.wrapping_add(i as u64);
            let mut rng = Lcg::new(seed);
            let plan = if candidates.is_empty() {
                // Empty or single-character input.
                ChunkPlan::fixed(1)
            } else {
                let max = candidates.len().clamp(1, 32);
                let mut picks = candidates.clone();
                rng.shuffle(&mut picks);
                let count = 1 + rng.gen_range(max);
                picks.truncate(count);
                picks.sort_unstable();
                ChunkPlan::boundaries(picks)
            };
            plans.push(ChunkPlanCase {
                label: format!("fuzz boundaries seed=0x{seed:016x}"),
                plan,
            });
        }
    }

    plans
}

#[derive(Clone, Copy, Debug)]
pub struct ShrinkStats {
    pub original_boundaries: usize,
    pub minimized_boundaries: usize,
    pub checks: usize,
    pub budget_exhausted: bool,
}

/// Minimize a failing plan.
///
/// `fails` must return `true` for the original plan. The result is a
/// boundary plan that still fails and from which no single boundary can be
/// removed without the failure disappearing (unless the check budget ran out).
pub fn shrink_chunk_plan_with_stats(
    input: &str,
    plan: &ChunkPlan,
    mut fails: impl FnMut(&ChunkPlan) -> bool,
) -> (ChunkPlan, ShrinkStats) {
    let max_checks = shrink_budget();
    let mut checks = 0usize;
    let mut budget_exhausted = false;

    let mut boundaries = plan.cut_points(input);
    let original_boundaries = boundaries.len();

    // Coarse pass: drop halves, quarters, ... of the remaining boundaries.
    let mut granularity = 2usize;
    while boundaries.len() >= 2 && !budget_exhausted {
        let n = boundaries.len();
        let chunk = n.div_ceil(granularity);
        let mut reduced = false;
        let mut start = 0usize;
        while start < n {
            let end = (start + chunk).min(n);
            let mut candidate = Vec::with_capacity(n - (end - start));
            candidate.extend_from_slice(&boundaries[..start]);
            candidate.extend_from_slice(&boundaries[end..]);
            checks += 1;
            if checks >= max_checks {
                budget_exhausted = true;
                break;
            }
            if fails(&ChunkPlan::boundaries(candidate.clone())) {
                boundaries = candidate;
                reduced = true;
                break;
            }
            start = end;
        }
        if reduced {
            granularity = granularity.saturating_sub(1).max(2);
        } else if granularity >= n {
            break;
        } else {
            granularity = (granularity * 2).min(n);
        }
    }

    // Fine pass: one boundary at a time until a fixed point.
    let mut changed = !budget_exhausted;
    while changed {
        changed = false;
        let mut i = 0usize;
        while i < boundaries.len() {
            let mut candidate = boundaries.clone();
            candidate.remove(i);
            checks += 1;
            if checks >= max_checks {
                budget_exhausted = true;
                break;
            }
            if fails(&ChunkPlan::boundaries(candidate.clone())) {
                boundaries = candidate;
                changed = true;
            } else {
                i += 1;
            }
        }
        if budget_exhausted {
            break;
        }
    }

    let minimized_boundaries = boundaries.len();
    (
        ChunkPlan::boundaries(boundaries),
        ShrinkStats {
            original_boundaries,
            minimized_boundaries,
            checks,
            budget_exhausted,
        },
    )
}

fn shrink_budget() -> usize {
    std::env::var("HTML_TOKENIZER_SHRINK_BUDGET")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(4096)
}

fn ceil_char_boundary(input: &str, mut idx: usize) -> usize {
    if idx >= input.len() {
        return input.len();
    }
    while !input.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

fn normalize_boundaries(input: &str, indices: &[usize]) -> Vec<usize> {
    let len = input.len();
    let mut out: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&idx| idx > 0 && idx < len && input.is_char_boundary(idx))
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

fn token_boundary_indices(input: &str) -> Vec<usize> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    for (i, &b) in bytes.iter().enumerate() {
        if matches!(
            b,
            b'<' | b'/' | b'>' | b'&' | b';' | b'#' | b'-' | b'\r' | b'"' | b'\''
        ) {
            out.push(i);
            out.push(i + 1);
        }
    }
    normalize_boundaries(input, &out)
}

fn char_boundaries(input: &str) -> Vec<usize> {
    let len = input.len();
    input
        .char_indices()
        .map(|(idx, _)| idx)
        .filter(|&idx| idx != 0 && idx != len)
        .collect()
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        if items.len() < 2 {
            return;
        }
        for i in (1..items.len()).rev() {
            let j = self.gen_range(i + 1);
            items.swap(i, j);
        }
    }
}
