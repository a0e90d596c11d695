//! Structural pruning of redundant hypotheses
//!
//! A vertex whose edges all leave from (or all arrive at) it and all reach
//! the same neighbour is a dead end: its own type is constrained by nothing
//! else, so among parallel edges that imply the same type for the neighbour
//! only the strongest one matters.

use std::collections::{BTreeSet, HashSet};

use petgraph::stable_graph::EdgeIndex;

use crate::edge::Side;
use crate::graph::RelationGraph;

/// Remove redundant parallel hypotheses at dead-end vertices.
///
/// Returns the number of edges removed. Fixed edges are never removed.
pub fn prune_dead_ends<V>(graph: &mut RelationGraph<V>) -> usize {
    let mut redundant: BTreeSet<EdgeIndex> = BTreeSet::new();

    for vertex in graph.vertex_ids() {
        let incident = graph.incident(vertex);
        let (outgoing, incoming): (Vec<_>, Vec<_>) = incident
            .into_iter()
            .partition(|(_, side)| *side == Side::Source);

        let (edges, side) = match (outgoing.is_empty(), incoming.is_empty()) {
            (false, true) => (outgoing, Side::Source),
            (true, false) => (incoming, Side::Target),
            _ => continue,
        };

        let neighbours: HashSet<_> = edges
            .iter()
            .filter_map(|(e, _)| graph.endpoints(*e))
            .map(|(source, target)| if source == vertex { target } else { source })
            .filter(|&n| n != vertex)
            .collect();
        if neighbours.len() != 1 {
            continue;
        }

        let mut ranked: Vec<_> = edges
            .iter()
            .filter_map(|(e, _)| graph.edge(*e).map(|edge| (*e, edge)))
            .collect();
        let far = side.opposite();
        ranked.sort_by(|(_, a), (_, b)| {
            a.type_at(far)
                .cmp(b.type_at(far))
                .then_with(|| a.priority_cmp(b))
        });

        let mut previous: Option<&str> = None;
        for (idx, edge) in ranked {
            let ty = edge.type_at(far);
            if previous == Some(ty) && !edge.fixed {
                redundant.insert(idx);
            } else {
                previous = Some(ty);
            }
        }
    }

    for &idx in &redundant {
        graph.remove_edge(idx);
    }
    redundant.len()
}

/// Collapse the parallel hypotheses of a two-vertex graph.
///
/// Every fixed edge is kept, plus the single best non-fixed edge.
pub fn collapse_parallel<V>(graph: &mut RelationGraph<V>) -> usize {
    if graph.vertex_count() != 2 {
        return 0;
    }

    let mut loose: Vec<EdgeIndex> = graph
        .edge_ids()
        .into_iter()
        .filter(|&e| graph.edge(e).map(|edge| !edge.fixed).unwrap_or(false))
        .collect();
    loose.sort_by(|&x, &y| match (graph.edge(x), graph.edge(y)) {
        (Some(a), Some(b)) => a.priority_cmp(b),
        _ => x.cmp(&y),
    });

    let doomed: Vec<EdgeIndex> = loose.into_iter().skip(1).collect();
    for &idx in &doomed {
        graph.remove_edge(idx);
    }
    doomed.len()
}
