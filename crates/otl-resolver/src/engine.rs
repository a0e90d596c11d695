//! Resolution engine
//!
//! Prunes the built graph, splits it into connected components and runs the
//! search controller on each one. Components share no vertices, so their
//! type assignments cannot interact and each [`Subproblem`] can be solved
//! on its own, including on another thread.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::hash::Hash;

use otl_core::ResolverConfig;

use crate::diagnostics::DiagnosticSink;
use crate::graph::RelationGraph;
use crate::prune::prune_dead_ends;
use crate::search::{SearchController, SearchResult};
use crate::DetectedRelation;

/// Frozen hypothesis graph plus the catalogue recorded while building it
#[derive(Debug, Clone)]
pub struct Engine<V> {
    graph: RelationGraph<V>,
    types: BTreeSet<String>,
    relations: BTreeMap<String, (String, String)>,
    config: ResolverConfig,
}

impl<V> Engine<V> {
    pub(crate) fn new(
        graph: RelationGraph<V>,
        types: BTreeSet<String>,
        relations: BTreeMap<String, (String, String)>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            graph,
            types,
            relations,
            config,
        }
    }

    /// The graph as built, before pruning
    pub fn graph(&self) -> &RelationGraph<V> {
        &self.graph
    }

    /// Every type named by any hypothesis
    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    /// Domain and range first recorded for `relation`
    pub fn relation_signature(&self, relation: &str) -> Option<(&str, &str)> {
        self.relations
            .get(relation)
            .map(|(domain, range)| (domain.as_str(), range.as_str()))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

impl<V: Clone + Eq + Hash> Engine<V> {
    /// Prune dead ends and split into independent components
    pub fn subproblems(&self, sink: &mut dyn DiagnosticSink) -> Vec<Subproblem<V>> {
        let mut pruned = self.graph.clone();
        let removed = prune_dead_ends(&mut pruned);
        sink.line(&format!(
            "pruned {removed} redundant hypotheses at dead ends ({} remain)",
            pruned.edge_count()
        ));

        let components = pruned.components();
        sink.line(&format!("split into {} component(s)", components.len()));

        components
            .into_iter()
            .map(|members| {
                let keep: HashSet<_> = members.into_iter().collect();
                let mut graph = pruned.clone();
                graph.retain_vertices(&keep);
                Subproblem {
                    graph,
                    config: self.config.clone(),
                }
            })
            .collect()
    }

    /// Resolve every component in turn and concatenate the results
    pub fn solve(&self, sink: &mut dyn DiagnosticSink) -> Vec<DetectedRelation<V>> {
        let subproblems = self.subproblems(sink);
        let total = subproblems.len();

        let mut relations = Vec::new();
        for (i, subproblem) in subproblems.iter().enumerate() {
            sink.line(&format!(
                "component {}/{}: {} mentions, {} hypotheses",
                i + 1,
                total,
                subproblem.graph.vertex_count(),
                subproblem.graph.edge_count()
            ));
            relations.extend(subproblem.solve(sink));
        }

        tracing::debug!(
            components = total,
            relations = relations.len(),
            "relation resolution finished"
        );
        relations
    }
}

/// One connected component of the pruned graph
#[derive(Debug, Clone)]
pub struct Subproblem<V> {
    graph: RelationGraph<V>,
    config: ResolverConfig,
}

impl<V: Clone + Eq + Hash> Subproblem<V> {
    pub fn graph(&self) -> &RelationGraph<V> {
        &self.graph
    }

    /// Run the search controller and keep its raw result
    pub fn search(&self, sink: &mut dyn DiagnosticSink) -> SearchResult {
        SearchController::new(self.config.clone()).search(&self.graph, sink)
    }

    /// Best type-consistent relations of this component (possibly none)
    pub fn solve(&self, sink: &mut dyn DiagnosticSink) -> Vec<DetectedRelation<V>> {
        self.search(sink)
            .selection
            .iter()
            .filter_map(|&e| DetectedRelation::from_graph(&self.graph, e))
            .collect()
    }
}
