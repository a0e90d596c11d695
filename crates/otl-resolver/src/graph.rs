//! Hypothesis multigraph
//!
//! An undirected multigraph over caller-supplied mention handles. Edges keep
//! their insertion orientation (source = left, target = right) so the
//! domain/range types of every hypothesis can be read back per endpoint.
//!
//! Indices are stable under removal, which lets the search controller clone
//! a component graph once and derive trial copies from it while still
//! referring to edges and vertices by the same ids.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::{Bfs, EdgeRef};
use thiserror::Error;

use crate::edge::{Edge, Side};

/// Reasons the graph refuses an edge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("self-relation on a single mention is not allowed")]
    SelfLoop,

    #[error("identical hypothesis already present: {dump}")]
    DuplicateEdge { dump: String },
}

/// Edges sharing source, target and pattern are removed together
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeSignature {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub pattern: String,
}

/// Undirected multigraph of hypothesis edges
#[derive(Clone)]
pub struct RelationGraph<V> {
    inner: StableUnGraph<V, Edge>,
    index: HashMap<V, NodeIndex>,
}

impl<V> Default for RelationGraph<V> {
    fn default() -> Self {
        Self {
            inner: StableUnGraph::default(),
            index: HashMap::new(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for RelationGraph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationGraph")
            .field("vertices", &self.inner.node_count())
            .field("edges", &self.inner.edge_count())
            .finish()
    }
}

impl<V: Clone + Eq + Hash> RelationGraph<V> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex, returning the existing index if already present
    pub fn add_vertex(&mut self, vertex: V) -> NodeIndex {
        if let Some(&idx) = self.index.get(&vertex) {
            return idx;
        }
        let idx = self.inner.add_node(vertex.clone());
        self.index.insert(vertex, idx);
        idx
    }

    /// Insert an edge oriented from `left` to `right`
    pub fn add_edge(&mut self, left: V, right: V, edge: Edge) -> Result<EdgeIndex, GraphError> {
        if left == right {
            return Err(GraphError::SelfLoop);
        }

        if let (Some(&source), Some(&target)) = (self.index.get(&left), self.index.get(&right)) {
            let duplicate = self.inner.edges(source).any(|e| {
                self.inner.edge_endpoints(e.id()) == Some((source, target))
                    && e.weight().same_hypothesis(&edge)
            });
            if duplicate {
                return Err(GraphError::DuplicateEdge {
                    dump: format!("{edge:?}"),
                });
            }
        }

        let source = self.add_vertex(left);
        let target = self.add_vertex(right);
        Ok(self.inner.add_edge(source, target, edge))
    }

    /// Remove a vertex and every edge touching it
    pub fn remove_vertex(&mut self, idx: NodeIndex) -> Option<V> {
        let vertex = self.inner.remove_node(idx)?;
        self.index.remove(&vertex);
        Some(vertex)
    }

    /// Keep only the given vertices
    pub fn retain_vertices(&mut self, keep: &HashSet<NodeIndex>) {
        let doomed: Vec<NodeIndex> = self
            .inner
            .node_indices()
            .filter(|n| !keep.contains(n))
            .collect();
        for idx in doomed {
            self.remove_vertex(idx);
        }
    }

    /// Remove vertices left without any incident edge
    pub fn remove_orphans(&mut self) -> usize {
        let orphans: Vec<NodeIndex> = self
            .inner
            .node_indices()
            .filter(|&n| self.inner.edges(n).next().is_none())
            .collect();
        for &idx in &orphans {
            self.remove_vertex(idx);
        }
        orphans.len()
    }
}

impl<V> RelationGraph<V> {
    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Vertex indices in insertion order
    pub fn vertex_ids(&self) -> Vec<NodeIndex> {
        self.inner.node_indices().collect()
    }

    /// Edge indices in insertion order
    pub fn edge_ids(&self) -> Vec<EdgeIndex> {
        self.inner.edge_indices().collect()
    }

    pub fn vertex(&self, idx: NodeIndex) -> Option<&V> {
        self.inner.node_weight(idx)
    }

    pub fn edge(&self, idx: EdgeIndex) -> Option<&Edge> {
        self.inner.edge_weight(idx)
    }

    /// Source and target of an edge, in insertion orientation
    pub fn endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.inner.edge_endpoints(idx)
    }

    /// All edges touching `idx` together with the side `idx` sits on
    pub fn incident(&self, idx: NodeIndex) -> Vec<(EdgeIndex, Side)> {
        let mut incident: Vec<(EdgeIndex, Side)> = self
            .inner
            .edges(idx)
            .filter_map(|e| {
                let (source, _) = self.inner.edge_endpoints(e.id())?;
                let side = if source == idx {
                    Side::Source
                } else {
                    Side::Target
                };
                Some((e.id(), side))
            })
            .collect();
        incident.sort_by_key(|(e, _)| *e);
        incident
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.inner.edges(idx).count()
    }

    pub fn remove_edge(&mut self, idx: EdgeIndex) -> Option<Edge> {
        self.inner.remove_edge(idx)
    }

    /// Removal key of an edge
    pub fn signature(&self, idx: EdgeIndex) -> Option<EdgeSignature> {
        let (source, target) = self.inner.edge_endpoints(idx)?;
        let edge = self.inner.edge_weight(idx)?;
        Some(EdgeSignature {
            source,
            target,
            pattern: edge.pattern.clone(),
        })
    }

    /// Distinct removal keys, ordered by their first edge
    pub fn distinct_signatures(&self) -> Vec<EdgeSignature> {
        let mut seen = HashSet::new();
        self.edge_ids()
            .into_iter()
            .filter_map(|e| self.signature(e))
            .filter(|sig| seen.insert(sig.clone()))
            .collect()
    }

    /// Remove every edge matching one of the signatures
    pub fn remove_signatures(&mut self, signatures: &[&EdgeSignature]) -> usize {
        let doomed: Vec<EdgeIndex> = self
            .edge_ids()
            .into_iter()
            .filter(|&e| {
                self.signature(e)
                    .map(|sig| signatures.iter().any(|s| **s == sig))
                    .unwrap_or(false)
            })
            .collect();
        for &e in &doomed {
            self.inner.remove_edge(e);
        }
        doomed.len()
    }

    /// Edges grouped by unordered vertex pair, each group in priority order
    pub fn pairs(&self) -> BTreeMap<(NodeIndex, NodeIndex), Vec<EdgeIndex>> {
        let mut pairs: BTreeMap<(NodeIndex, NodeIndex), Vec<EdgeIndex>> = BTreeMap::new();
        for e in self.inner.edge_indices() {
            if let Some((a, b)) = self.inner.edge_endpoints(e) {
                pairs.entry((a.min(b), a.max(b))).or_default().push(e);
            }
        }
        for edges in pairs.values_mut() {
            edges.sort_by(|&x, &y| match (self.edge(x), self.edge(y)) {
                (Some(ex), Some(ey)) => ex.priority_cmp(ey),
                _ => x.cmp(&y),
            });
        }
        pairs
    }

    /// Connected components, each listed in vertex order
    pub fn components(&self) -> Vec<Vec<NodeIndex>> {
        let mut visited = HashSet::new();
        let mut components = Vec::new();

        for start in self.inner.node_indices() {
            if visited.contains(&start) {
                continue;
            }
            let mut members = Vec::new();
            let mut bfs = Bfs::new(&self.inner, start);
            while let Some(n) = bfs.next(&self.inner) {
                visited.insert(n);
                members.push(n);
            }
            members.sort();
            components.push(members);
        }

        components
    }

    pub fn component_count(&self) -> usize {
        self.components().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Hypothesis;

    fn edge(ordinal: u64, pattern: &str, domain: &str, range: &str, score: f64) -> Edge {
        Hypothesis::new("rel", pattern, domain, range)
            .with_score(score)
            .into_edge(ordinal)
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut g = RelationGraph::new();
        let err = g.add_edge("a", "a", edge(0, "p", "A", "A", 0.5)).unwrap_err();
        assert_eq!(err, GraphError::SelfLoop);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.vertex_count(), 0);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut g = RelationGraph::new();
        g.add_edge("a", "b", edge(0, "p", "A", "B", 0.5)).unwrap();
        let err = g.add_edge("a", "b", edge(1, "p", "A", "B", 0.5)).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateEdge { .. }));

        // reversed orientation is a different hypothesis
        g.add_edge("b", "a", edge(2, "p", "A", "B", 0.5)).unwrap();
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.vertex_count(), 2);
    }

    #[test]
    fn test_incident_sides() {
        let mut g = RelationGraph::new();
        let e0 = g.add_edge("a", "b", edge(0, "p", "A", "B", 0.5)).unwrap();
        let e1 = g.add_edge("c", "a", edge(1, "q", "C", "A", 0.5)).unwrap();
        let a = g.add_vertex("a");

        assert_eq!(g.incident(a), vec![(e0, Side::Source), (e1, Side::Target)]);
        assert_eq!(g.degree(a), 2);
    }

    #[test]
    fn test_signatures_and_removal() {
        let mut g = RelationGraph::new();
        g.add_edge("a", "b", edge(0, "p", "A", "B", 0.5)).unwrap();
        g.add_edge("a", "b", edge(1, "p", "X", "Y", 0.4)).unwrap();
        g.add_edge("a", "b", edge(2, "q", "A", "B", 0.3)).unwrap();
        g.add_edge("b", "c", edge(3, "p", "B", "C", 0.3)).unwrap();

        let sigs = g.distinct_signatures();
        assert_eq!(sigs.len(), 3);

        assert_eq!(g.remove_signatures(&[&sigs[0]]), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.remove_orphans(), 0);

        assert_eq!(g.remove_signatures(&[&sigs[2]]), 1);
        assert_eq!(g.remove_orphans(), 1);
        assert_eq!(g.vertex_count(), 2);
    }

    #[test]
    fn test_pairs_sorted_by_priority() {
        let mut g = RelationGraph::new();
        let low = g.add_edge("a", "b", edge(0, "p", "A", "B", 0.2)).unwrap();
        let high = g.add_edge("b", "a", edge(1, "q", "B", "A", 0.8)).unwrap();
        let pairs = g.pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs.values().next().unwrap(), &vec![high, low]);
    }

    #[test]
    fn test_components() {
        let mut g = RelationGraph::new();
        g.add_edge("a", "b", edge(0, "p", "A", "B", 0.5)).unwrap();
        g.add_edge("c", "d", edge(1, "p", "C", "D", 0.5)).unwrap();
        g.add_edge("b", "e", edge(2, "p", "B", "E", 0.5)).unwrap();

        let components = g.components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].len(), 3);
        assert_eq!(components[1].len(), 2);

        let keep: HashSet<NodeIndex> = components[1].iter().copied().collect();
        let mut sub = g.clone();
        sub.retain_vertices(&keep);
        assert_eq!(sub.vertex_count(), 2);
        assert_eq!(sub.edge_count(), 1);
        // the source graph is untouched
        assert_eq!(g.vertex_count(), 5);
    }
}
