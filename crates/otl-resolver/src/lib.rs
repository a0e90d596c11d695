//! OTL Resolver - Type-consistent relation resolution
//!
//! Takes weighted, typed candidate relations between entity mentions and
//! selects a subset that is globally type-consistent (every mention gets a
//! single type compatible with each relation it keeps) and scores highest
//! among the consistent alternatives.
//!
//! Pipeline: [`Builder`] → dead-end pruning → component split →
//! per component, iterative-deepening edge removal ([`SearchController`])
//! driving a bounded finite-domain solver ([`TypeSolver`]).
//!
//! ```
//! use otl_resolver::{Builder, Hypothesis, NullSink};
//!
//! let engine = Builder::new()
//!     .add("Marie", "Pierre", Hypothesis::new("spouse", "married", "Person", "Person").with_score(0.8))
//!     .add("Marie", "Warsaw", Hypothesis::new("birthPlace", "born in", "Person", "City").with_score(0.6))
//!     .build();
//!
//! let relations = engine.solve(&mut NullSink);
//! assert_eq!(relations.len(), 2);
//! ```

use petgraph::stable_graph::EdgeIndex;
use serde::Serialize;

pub mod builder;
pub mod cutoff;
pub mod diagnostics;
pub mod edge;
pub mod engine;
pub mod graph;
pub mod prune;
pub mod score;
pub mod search;
pub mod solver;

pub use builder::Builder;
pub use diagnostics::{DiagnosticSink, NullSink, TracingSink};
pub use edge::{Edge, Hypothesis, Side};
pub use engine::{Engine, Subproblem};
pub use graph::{EdgeSignature, GraphError, RelationGraph};
pub use search::{RemovalCandidates, SearchController, SearchResult};
pub use solver::{SolveOutcome, TypeSolver};

/// One resolved relation instance; `left` is the domain side of `edge`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedRelation<V> {
    pub left: V,
    pub right: V,
    pub edge: Edge,
}

impl<V: Clone> DetectedRelation<V> {
    pub(crate) fn from_graph(graph: &RelationGraph<V>, idx: EdgeIndex) -> Option<Self> {
        let (source, target) = graph.endpoints(idx)?;
        Some(Self {
            left: graph.vertex(source)?.clone(),
            right: graph.vertex(target)?.clone(),
            edge: graph.edge(idx)?.clone(),
        })
    }
}
