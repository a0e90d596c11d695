//! Graph builder
//!
//! Accumulates hypothesis edges, the global type set and the
//! relation → (domain, range) table, then freezes them into an [`Engine`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::Hash;

use otl_core::ResolverConfig;
use petgraph::stable_graph::EdgeIndex;

use crate::edge::Hypothesis;
use crate::engine::Engine;
use crate::graph::{GraphError, RelationGraph};

/// Accumulates hypotheses between mentions of type `V`
#[derive(Debug)]
pub struct Builder<V> {
    graph: RelationGraph<V>,
    types: BTreeSet<String>,
    relations: BTreeMap<String, (String, String)>,
    next_ordinal: u64,
    rejected: usize,
    config: ResolverConfig,
}

impl<V> Default for Builder<V> {
    fn default() -> Self {
        Self {
            graph: RelationGraph::default(),
            types: BTreeSet::new(),
            relations: BTreeMap::new(),
            next_ordinal: 0,
            rejected: 0,
            config: ResolverConfig::default(),
        }
    }
}

impl<V: Clone + Eq + Hash + fmt::Debug> Builder<V> {
    /// Create a builder with default resolver settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom resolver settings
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a hypothesis that `left` relates to `right`
    pub fn add(mut self, left: V, right: V, hypothesis: Hypothesis) -> Self {
        self.insert(left, right, hypothesis);
        self
    }

    /// Add a hypothesis in place, returning the new edge if it was accepted
    pub fn insert(&mut self, left: V, right: V, hypothesis: Hypothesis) -> Option<EdgeIndex> {
        self.types.insert(hypothesis.domain_type.clone());
        self.types.insert(hypothesis.range_type.clone());
        self.relations
            .entry(hypothesis.relation.clone())
            .or_insert_with(|| {
                (
                    hypothesis.domain_type.clone(),
                    hypothesis.range_type.clone(),
                )
            });

        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        let edge = hypothesis.into_edge(ordinal);

        match self.graph.add_edge(left.clone(), right, edge) {
            Ok(idx) => Some(idx),
            Err(GraphError::SelfLoop) => {
                tracing::warn!(mention = ?left, ordinal, "rejected self-relation hypothesis");
                self.rejected += 1;
                None
            }
            Err(err @ GraphError::DuplicateEdge { .. }) => {
                tracing::error!(mention = ?left, ordinal, "failed to insert edge: {}", err);
                self.rejected += 1;
                None
            }
        }
    }

    /// Number of hypotheses refused so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Freeze into an engine
    pub fn build(self) -> Engine<V> {
        tracing::debug!(
            vertices = self.graph.vertex_count(),
            edges = self.graph.edge_count(),
            types = self.types.len(),
            rejected = self.rejected,
            "hypothesis graph built"
        );
        Engine::new(self.graph, self.types, self.relations, self.config)
    }
}
