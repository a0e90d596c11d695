//! Solution scoring
//!
//! Ranks competing selections within one search. Not a calibrated
//! confidence value.

use crate::edge::Edge;

/// Mean edge score plus relations recovered per connected component.
///
/// The empty selection scores 0; a graph with no vertices counts as one
/// component.
pub fn solution_score<'a, I>(edges: I, components: usize) -> f64
where
    I: IntoIterator<Item = &'a Edge>,
{
    let (total, len) = edges
        .into_iter()
        .fold((0.0, 0usize), |(total, len), e| (total + e.score, len + 1));
    if len == 0 {
        return 0.0;
    }
    total / len as f64 + len as f64 / components.max(1) as f64
}
