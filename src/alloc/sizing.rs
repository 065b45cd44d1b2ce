//! Group size optimization.
//!
//! For a cohort of `n` students we try every group count `k` from 1 to
//! `n / min_size`. Splitting `n` into `k` groups as evenly as possible gives
//! `n % k` groups of `n / k + 1` and the rest of `n / k`, so sizes never differ by
//! more than one. Candidates that break the size bounds are rejected; the rest
//! are scored by their average distance from the ideal size.
//!
//! The search is exhaustive and deterministic: ties keep the smallest `k`.

use crate::domain::{GroupPlan, SizingConfig};

/// A surviving candidate during the search (kept for diagnostics).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingCandidate {
    pub num_groups: usize,
    pub base: usize,
    pub remainder: usize,
    pub score: f64,
}

/// Compute the group count and sizes for `n` students.
///
/// Returns `None` when no group count satisfies the bounds. A cohort smaller
/// than `min_size` always yields a single group of `n`.
pub fn plan_groups(n: usize, sizing: &SizingConfig) -> Option<GroupPlan> {
    if n < sizing.min_size {
        return Some(GroupPlan::single(n));
    }

    let best = candidates(n, sizing).into_iter().fold(None, |best: Option<SizingCandidate>, c| match best {
        Some(b) if c.score >= b.score => Some(b),
        _ => Some(c),
    })?;

    Some(build_plan(&best))
}

/// Every group count that satisfies the size bounds, in increasing `k`.
pub fn candidates(n: usize, sizing: &SizingConfig) -> Vec<SizingCandidate> {
    if sizing.min_size == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    for k in 1..=(n / sizing.min_size) {
        let base = n / k;
        let remainder = n % k;

        if base < sizing.min_size || base > sizing.max_size {
            continue;
        }
        if remainder > 0 && base + 1 > sizing.max_size {
            continue;
        }

        out.push(SizingCandidate {
            num_groups: k,
            base,
            remainder,
            score: deviation_score(k, base, remainder, sizing.ideal_size),
        });
    }
    out
}

/// Average absolute deviation of group sizes from `ideal`.
fn deviation_score(k: usize, base: usize, remainder: usize, ideal: usize) -> f64 {
    let small = (k - remainder) as f64;
    let large = remainder as f64;
    let small_dev = base.abs_diff(ideal) as f64;
    let large_dev = (base + 1).abs_diff(ideal) as f64;
    (small * small_dev + large * large_dev) / k as f64
}

fn build_plan(c: &SizingCandidate) -> GroupPlan {
    let mut sizes = Vec::with_capacity(c.num_groups);
    sizes.extend(std::iter::repeat_n(c.base + 1, c.remainder));
    sizes.extend(std::iter::repeat_n(c.base, c.num_groups - c.remainder));
    GroupPlan { sizes }
}
