//! Pattern index
//!
//! Maps a surface pattern to the relations it has been observed with.
//! The production index is an external full-text service; the in-memory
//! implementation here backs the CLI and tests.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use otl_core::{OtlError, Result};

/// Relation observed with a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCount {
    pub relation: String,
    pub count: u32,
}

/// Index answer for one pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    /// Total occurrences of the pattern
    pub count: u32,
    /// Ambiguity of the pattern over relations, in bits
    pub entropy: f64,
    /// Relations, most frequent first
    pub relations: Vec<RelationCount>,
}

/// Trait for pattern search services
#[async_trait]
pub trait PatternIndex: Send + Sync {
    /// Look up a pattern; `None` when unknown or more ambiguous than `max_entropy`
    async fn lookup(&self, pattern: &str, max_entropy: f64) -> Result<Option<PatternMatch>>;

    /// Get index name for logging
    fn name(&self) -> &str;
}

/// Pattern index held in memory
///
/// JSON form: `{ "<pattern>": { "<relation>": <count>, ... }, ... }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryPatternIndex {
    patterns: BTreeMap<String, BTreeMap<String, u32>>,
}

impl InMemoryPatternIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` occurrences of `pattern` expressing `relation`.
    ///
    /// Counts saturate at `u32::MAX`; use [`from_json`](Self::from_json) for
    /// untrusted data.
    pub fn with_observation(
        mut self,
        pattern: impl Into<String>,
        relation: impl Into<String>,
        count: u32,
    ) -> Self {
        let observed = self
            .patterns
            .entry(normalize(&pattern.into()))
            .or_default()
            .entry(relation.into())
            .or_insert(0);
        *observed = observed.saturating_add(count);
        self
    }

    /// Record an observation, rejecting a pattern total beyond `u32::MAX`
    fn observe(&mut self, pattern: &str, relation: String, count: u32) -> Result<()> {
        let key = normalize(pattern);
        let relations = self.patterns.entry(key.clone()).or_default();
        let total: u64 = relations.values().map(|&c| u64::from(c)).sum();
        if total + u64::from(count) > u64::from(u32::MAX) {
            return Err(OtlError::ValidationError(format!(
                "occurrence count of pattern '{key}' exceeds {}",
                u32::MAX
            )));
        }
        *relations.entry(relation).or_insert(0) += count;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, u32>> = serde_json::from_str(json)?;
        let mut index = Self::new();
        for (pattern, relations) in raw {
            for (relation, count) in relations {
                index.observe(&pattern, relation, count)?;
            }
        }
        Ok(index)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn lookup_sync(&self, pattern: &str, max_entropy: f64) -> Result<Option<PatternMatch>> {
        let Some(observed) = self.patterns.get(&normalize(pattern)) else {
            return Ok(None);
        };
        let total: u64 = observed.values().map(|&c| u64::from(c)).sum();
        if total == 0 {
            return Ok(None);
        }
        let count = u32::try_from(total).map_err(|_| {
            OtlError::ValidationError(format!(
                "occurrence count of pattern '{pattern}' exceeds {}",
                u32::MAX
            ))
        })?;

        let entropy = shannon_entropy(observed.values().copied(), total);
        if entropy > max_entropy {
            tracing::debug!(pattern, entropy, max_entropy, "pattern too ambiguous");
            return Ok(None);
        }

        let mut relations: Vec<RelationCount> = observed
            .iter()
            .filter(|(_, &c)| c > 0)
            .map(|(relation, &count)| RelationCount {
                relation: relation.clone(),
                count,
            })
            .collect();
        relations.sort_by(|a, b| b.count.cmp(&a.count).then(a.relation.cmp(&b.relation)));

        Ok(Some(PatternMatch {
            count,
            entropy,
            relations,
        }))
    }
}

#[async_trait]
impl PatternIndex for InMemoryPatternIndex {
    async fn lookup(&self, pattern: &str, max_entropy: f64) -> Result<Option<PatternMatch>> {
        if max_entropy.is_nan() {
            return Err(OtlError::SearchError(
                "entropy ceiling must be a number".to_string(),
            ));
        }
        self.lookup_sync(pattern, max_entropy)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

fn normalize(pattern: &str) -> String {
    pattern
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn shannon_entropy(counts: impl Iterator<Item = u32>, total: u64) -> f64 {
    let total = total as f64;
    counts
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}
