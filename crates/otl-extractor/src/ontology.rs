//! Relation type hierarchy
//!
//! Supplies the domain and range a relation expects, plus broader types
//! that also satisfy them. Expansion uses the broader types to give the
//! resolver room to agree on a more general type when the specific ones
//! conflict.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use otl_core::{OtlError, Result};

/// Declared typing of one relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSignature {
    pub domain: String,
    pub range: String,
    /// Supertypes of `domain`, nearest first
    #[serde(default)]
    pub broader_domains: Vec<String>,
    /// Supertypes of `range`, nearest first
    #[serde(default)]
    pub broader_ranges: Vec<String>,
}

impl RelationSignature {
    pub fn new(domain: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            range: range.into(),
            broader_domains: Vec::new(),
            broader_ranges: Vec::new(),
        }
    }

    pub fn with_broader_domain(mut self, ty: impl Into<String>) -> Self {
        self.broader_domains.push(ty.into());
        self
    }

    pub fn with_broader_range(mut self, ty: impl Into<String>) -> Self {
        self.broader_ranges.push(ty.into());
        self
    }

    /// Candidate source types, base type first, without repeats
    pub fn domains(&self, include_broader: bool) -> Vec<&str> {
        widen(&self.domain, &self.broader_domains, include_broader)
    }

    /// Candidate target types, base type first, without repeats
    pub fn ranges(&self, include_broader: bool) -> Vec<&str> {
        widen(&self.range, &self.broader_ranges, include_broader)
    }
}

fn widen<'a>(base: &'a str, broader: &'a [String], include_broader: bool) -> Vec<&'a str> {
    let mut types = vec![base];
    if include_broader {
        for ty in broader {
            if !types.contains(&ty.as_str()) {
                types.push(ty.as_str());
            }
        }
    }
    types
}

/// Source of relation signatures
pub trait TypeHierarchy: Send + Sync {
    fn signature(&self, relation: &str) -> Option<RelationSignature>;
}

/// Relation signatures loaded from JSON
///
/// JSON form: `{ "<relation>": { "domain": .., "range": .., "broader_domains": [..] }, ... }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ontology {
    relations: BTreeMap<String, RelationSignature>,
}

impl Ontology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relation(mut self, relation: impl Into<String>, signature: RelationSignature) -> Self {
        self.relations.insert(relation.into(), signature);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let ontology: Self = serde_json::from_str(json)?;
        for (relation, signature) in &ontology.relations {
            if signature.domain.is_empty() || signature.range.is_empty() {
                return Err(OtlError::ValidationError(format!(
                    "relation '{relation}' has an empty domain or range"
                )));
            }
        }
        Ok(ontology)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

impl TypeHierarchy for Ontology {
    fn signature(&self, relation: &str) -> Option<RelationSignature> {
        self.relations.get(relation).cloned()
    }
}
