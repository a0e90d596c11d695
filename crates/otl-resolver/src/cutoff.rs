//! Adaptive statistical cutoff
//!
//! When plain edge removal has not produced a consistent graph by the time
//! the search is deep, weak hypotheses are dropped wholesale: those whose
//! pattern is ambiguous (high entropy) and rarely observed (low count).
//! The surviving share of entropy and count values shrinks with depth.

use std::collections::BTreeSet;

use otl_core::ResolverConfig;
use petgraph::stable_graph::EdgeIndex;

use crate::graph::RelationGraph;

/// Percent of distinct entropy values allowed to survive at `depth`
pub fn entropy_keep_percent(depth: usize, config: &ResolverConfig) -> f64 {
    keep_percent(depth, config.entropy_step, config.min_keep_percent)
}

/// Percent of distinct count values allowed to survive at `depth`
pub fn count_keep_percent(depth: usize, config: &ResolverConfig) -> f64 {
    keep_percent(depth, config.count_step, config.min_keep_percent)
}

fn keep_percent(depth: usize, step: f64, floor: f64) -> f64 {
    let lost = depth.saturating_sub(1) as f64 * step;
    (100.0 - lost).max(floor)
}

fn kept(len: usize, percent: f64) -> usize {
    ((len as f64) * percent / 100.0).ceil() as usize
}

/// Entropy at or above which an edge counts as ambiguous.
///
/// `values` must be sorted ascending and deduplicated. `None` means every
/// value survives.
pub fn entropy_cutoff(values: &[f64], depth: usize, config: &ResolverConfig) -> Option<f64> {
    let keep = kept(values.len(), entropy_keep_percent(depth, config));
    values.get(keep).copied()
}

/// Count below which an edge counts as rare.
///
/// `values` must be sorted ascending and deduplicated. `None` means every
/// value survives.
pub fn count_cutoff(values: &[u32], depth: usize, config: &ResolverConfig) -> Option<u32> {
    let keep = kept(values.len(), count_keep_percent(depth, config));
    if keep >= values.len() {
        return None;
    }
    values.get(values.len() - keep).copied()
}

/// Drop ambiguous, rare, low-scoring edges. Returns the number removed.
pub fn apply_adaptive_cutoff<V>(
    graph: &mut RelationGraph<V>,
    depth: usize,
    config: &ResolverConfig,
) -> usize {
    let edges: Vec<EdgeIndex> = graph.edge_ids();

    let mut entropies: Vec<f64> = edges
        .iter()
        .filter_map(|&e| graph.edge(e))
        .map(|e| e.entropy)
        .collect();
    entropies.sort_by(f64::total_cmp);
    entropies.dedup();

    let counts: Vec<u32> = edges
        .iter()
        .filter_map(|&e| graph.edge(e))
        .map(|e| e.count)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let (Some(max_entropy), Some(min_count)) = (
        entropy_cutoff(&entropies, depth, config),
        count_cutoff(&counts, depth, config),
    ) else {
        return 0;
    };

    let doomed: Vec<EdgeIndex> = edges
        .into_iter()
        .filter(|&e| {
            graph
                .edge(e)
                .map(|edge| {
                    !edge.fixed
                        && edge.entropy >= max_entropy
                        && edge.count < min_count
                        && edge.score < config.protected_score
                })
                .unwrap_or(false)
        })
        .collect();

    for &e in &doomed {
        graph.remove_edge(e);
    }
    doomed.len()
}
