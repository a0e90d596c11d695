//! Hypothesis edges
//!
//! An edge states that the mention on its source side stands in `relation`
//! to the mention on its target side, which in turn implies a type for each
//! endpoint (`domain_type` at the source, `range_type` at the target).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Which end of an edge a vertex sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Target,
            Self::Target => Self::Source,
        }
    }
}

/// A scored, typed relation hypothesis stored in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Insertion order, used as a tie-break
    pub ordinal: u64,
    /// Relation identifier
    pub relation: String,
    /// Surface pattern the hypothesis was derived from
    pub pattern: String,
    /// Type expected at the source endpoint
    pub domain_type: String,
    /// Type expected at the target endpoint
    pub range_type: String,
    /// Confidence score in [0, 1]
    pub score: f64,
    /// Pattern ambiguity, lower is more specific
    pub entropy: f64,
    /// Observed occurrences of the pattern
    pub count: u32,
    /// Pre-resolved with high confidence
    pub fixed: bool,
}

impl Edge {
    /// Type this edge implies for the endpoint on `side`
    pub fn type_at(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.domain_type,
            Side::Target => &self.range_type,
        }
    }

    /// Same hypothesis content, ignoring the insertion ordinal
    pub fn same_hypothesis(&self, other: &Edge) -> bool {
        self.relation == other.relation
            && self.pattern == other.pattern
            && self.domain_type == other.domain_type
            && self.range_type == other.range_type
            && self.score == other.score
            && self.entropy == other.entropy
            && self.count == other.count
            && self.fixed == other.fixed
    }

    /// Relation priority: descending score, then insertion order
    pub fn priority_cmp(&self, other: &Edge) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.ordinal.cmp(&other.ordinal))
    }
}

/// Caller-supplied hypothesis content, before the builder assigns an ordinal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub relation: String,
    pub pattern: String,
    pub domain_type: String,
    pub range_type: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub entropy: f64,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub fixed: bool,
}

fn default_count() -> u32 {
    1
}

impl Hypothesis {
    /// Create a hypothesis with zero score and entropy and a single occurrence
    pub fn new(
        relation: impl Into<String>,
        pattern: impl Into<String>,
        domain_type: impl Into<String>,
        range_type: impl Into<String>,
    ) -> Self {
        Self {
            relation: relation.into(),
            pattern: pattern.into(),
            domain_type: domain_type.into(),
            range_type: range_type.into(),
            score: 0.0,
            entropy: 0.0,
            count: default_count(),
            fixed: false,
        }
    }

    /// Set confidence score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Set pattern entropy
    pub fn with_entropy(mut self, entropy: f64) -> Self {
        self.entropy = entropy;
        self
    }

    /// Set occurrence count
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Mark as pre-resolved
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub(crate) fn into_edge(self, ordinal: u64) -> Edge {
        Edge {
            ordinal,
            relation: self.relation,
            pattern: self.pattern,
            domain_type: self.domain_type,
            range_type: self.range_type,
            score: self.score,
            entropy: self.entropy,
            count: self.count,
            fixed: self.fixed,
        }
    }
}
