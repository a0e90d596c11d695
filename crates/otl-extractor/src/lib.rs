//! OTL Extractor - Relation extraction pipeline
//!
//! Turns candidate mention pairs into typed hypotheses using a pattern
//! index and a relation type hierarchy, then hands them to the resolver to
//! pick a type-consistent set of relations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use otl_core::Result;
use otl_resolver::DetectedRelation;

/// Entity mention in a sentence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub text: String,
    /// Tag assigned by the entity tagger, if any
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
}

impl ExtractedEntity {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            entity_type: None,
            start,
            end,
        }
    }

    /// Set the tagger's type
    pub fn with_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }
}

/// Two mentions and the surface pattern connecting them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePair {
    pub subject: ExtractedEntity,
    pub object: ExtractedEntity,
    pub pattern: String,
}

/// Resolved relation between entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRelation {
    pub subject: ExtractedEntity,
    pub predicate: String,
    pub object: ExtractedEntity,
    pub confidence: f64,
    pub pattern: String,
    pub domain_type: String,
    pub range_type: String,
}

impl From<DetectedRelation<ExtractedEntity>> for ExtractedRelation {
    fn from(detected: DetectedRelation<ExtractedEntity>) -> Self {
        let edge = detected.edge;
        Self {
            subject: detected.left,
            predicate: edge.relation,
            object: detected.right,
            confidence: edge.score,
            pattern: edge.pattern,
            domain_type: edge.domain_type,
            range_type: edge.range_type,
        }
    }
}

/// Trait for relation extractors
#[async_trait]
pub trait RelationExtractor: Send + Sync {
    async fn extract(&self, candidates: &[CandidatePair]) -> Result<Vec<ExtractedRelation>>;
}

pub mod index;
pub mod metrics;
pub mod ontology;
pub mod relation;

pub use index::{InMemoryPatternIndex, PatternIndex, PatternMatch, RelationCount};
pub use metrics::{Evaluator, GoldRelation, RelationMetrics};
pub use ontology::{Ontology, RelationSignature, TypeHierarchy};
pub use relation::{
    engine_from_records, resolve_concurrently, ExpansionStats, HypothesisExpander,
    HypothesisRecord, ResolvingExtractor,
};
