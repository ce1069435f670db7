//! Containment scoring over candidates described by sorted position lists.
//!
//! Both indexes reduce their vectors to sorted `u32` positions so an
//! intersection is a linear merge. Scans run on the rayon pool. Ordering rules
//! are applied at merge time, so results are the same as a sequential scan.

use rayon::prelude::*;
use std::cmp::Ordering;

/// A query reduced to the positions it shares with the universe.
///
/// `len` counts every query feature, including those the universe does not
/// know, so unknown features lower the score instead of being ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryPositions {
    pub positions: Vec<u32>,
    pub len: usize,
}

pub(crate) fn intersection_count(a: &[u32], b: &[u32]) -> usize {
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}

/// `|query ∩ candidate| / |query|`. The caller guarantees a non-empty query.
pub(crate) fn containment(query: &QueryPositions, candidate: &[u32]) -> f32 {
    intersection_count(&query.positions, candidate) as f32 / query.len as f32
}

/// Best candidate as `(index, score)`.
///
/// With `early_accept` set, the first candidate in order scoring above it is
/// returned without looking further. Otherwise the highest score wins and the
/// earliest candidate wins ties. Candidates scoring zero never match.
pub(crate) fn best_match<T, F>(
    candidates: &[T],
    positions: F,
    query: &QueryPositions,
    early_accept: Option<f32>,
) -> Option<(usize, f32)>
where
    T: Sync,
    F: Fn(&T) -> &[u32] + Sync,
{
    if query.len == 0 {
        return None;
    }
    let score = |(i, c): (usize, &T)| (i, containment(query, positions(c)));

    if let Some(threshold) = early_accept {
        let early = candidates
            .par_iter()
            .enumerate()
            .map(score)
            .find_first(|(_, s)| *s > threshold);
        if early.is_some() {
            return early;
        }
    }

    candidates
        .par_iter()
        .enumerate()
        .map(score)
        .filter(|(_, s)| *s > 0.0)
        .reduce_with(|a, b| if prefer(a, b) { a } else { b })
}

/// True when `a` ranks at least as well as `b`: higher score, then lower index.
fn prefer(a: (usize, f32), b: (usize, f32)) -> bool {
    match a.1.partial_cmp(&b.1) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Less) => false,
        _ => a.0 <= b.0,
    }
}

/// Every candidate scoring at least `better_than`, by descending score.
/// Equal scores keep candidate order.
pub(crate) fn matches_at_least<T, F>(
    candidates: &[T],
    positions: F,
    query: &QueryPositions,
    better_than: f32,
) -> Vec<(usize, f32)>
where
    T: Sync,
    F: Fn(&T) -> &[u32] + Sync,
{
    if query.len == 0 {
        return Vec::new();
    }
    let mut kept: Vec<(usize, f32)> = candidates
        .par_iter()
        .enumerate()
        .map(|(i, c)| (i, containment(query, positions(c))))
        .filter(|(_, s)| *s >= better_than)
        .collect();
    kept.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    kept
}
