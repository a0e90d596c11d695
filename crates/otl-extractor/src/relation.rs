//! Relation Extraction (RE) module
//!
//! Expands candidate mention pairs into typed hypotheses and resolves them
//! into a type-consistent set of relations.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use otl_core::{AppConfig, ExpansionConfig, OtlError, ResolverConfig, Result};
use otl_resolver::{Builder, Engine, Hypothesis, TracingSink};

use crate::index::{PatternIndex, PatternMatch};
use crate::ontology::TypeHierarchy;
use crate::{CandidatePair, ExtractedEntity, ExtractedRelation, RelationExtractor};

// ============================================================================
// Hypothesis expansion
// ============================================================================

/// Counters gathered while expanding candidates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionStats {
    /// Candidate pairs seen
    pub candidates: usize,
    /// Candidates whose pattern the index knew
    pub matched: usize,
    /// Candidates with an unknown or too ambiguous pattern
    pub unmatched: usize,
    /// Relations the type hierarchy had no signature for
    pub unknown_relations: usize,
    /// Relations dropped for scoring below the configured minimum
    pub low_score: usize,
    /// Hypotheses accepted by the builder
    pub hypotheses: usize,
    /// Hypotheses refused by the builder
    pub rejected: usize,
}

/// Turns candidate pairs into builder hypotheses
pub struct HypothesisExpander<I, H> {
    index: I,
    hierarchy: H,
    config: ExpansionConfig,
}

impl<I: PatternIndex, H: TypeHierarchy> HypothesisExpander<I, H> {
    pub fn new(index: I, hierarchy: H) -> Self {
        Self {
            index,
            hierarchy,
            config: ExpansionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExpansionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    /// Add one hypothesis per (relation, domain, range) the pattern supports
    ///
    /// Score is the share of the pattern's occurrences that express the
    /// relation. Only the declared domain/range pair can be marked fixed;
    /// supertype variants always stay open to removal.
    pub async fn expand(
        &self,
        candidates: &[CandidatePair],
        builder: &mut Builder<ExtractedEntity>,
    ) -> Result<ExpansionStats> {
        let mut stats = ExpansionStats::default();
        let mut lookups: HashMap<&str, Option<PatternMatch>> = HashMap::new();

        for candidate in candidates {
            stats.candidates += 1;

            let found = match lookups.get(candidate.pattern.as_str()) {
                Some(found) => found.clone(),
                None => {
                    let found = self
                        .index
                        .lookup(&candidate.pattern, self.config.max_entropy)
                        .await?;
                    lookups.insert(&candidate.pattern, found.clone());
                    found
                }
            };

            let Some(found) = found else {
                tracing::debug!(pattern = %candidate.pattern, index = self.index.name(), "no usable pattern match");
                stats.unmatched += 1;
                continue;
            };
            if found.count == 0 {
                tracing::debug!(pattern = %candidate.pattern, index = self.index.name(), "pattern match without occurrences");
                stats.unmatched += 1;
                continue;
            }
            stats.matched += 1;

            for observed in &found.relations {
                let Some(signature) = self.hierarchy.signature(&observed.relation) else {
                    tracing::warn!(relation = %observed.relation, "relation missing from type hierarchy");
                    stats.unknown_relations += 1;
                    continue;
                };

                let score = observed.count as f64 / found.count as f64;
                if score < self.config.min_score {
                    stats.low_score += 1;
                    continue;
                }
                let fixed = score > self.config.fixed_min_score
                    && found.entropy <= self.config.fixed_max_entropy
                    && found.count > self.config.fixed_min_count;

                let broader = self.config.expand_supertypes;
                for domain in signature.domains(broader) {
                    for range in signature.ranges(broader) {
                        let mut hypothesis =
                            Hypothesis::new(&observed.relation, &candidate.pattern, domain, range)
                                .with_score(score)
                                .with_entropy(found.entropy)
                                .with_count(found.count);
                        if fixed && domain == signature.domain && range == signature.range {
                            hypothesis = hypothesis.fixed();
                        }

                        match builder.insert(
                            candidate.subject.clone(),
                            candidate.object.clone(),
                            hypothesis,
                        ) {
                            Some(_) => stats.hypotheses += 1,
                            None => stats.rejected += 1,
                        }
                    }
                }
            }
        }

        tracing::debug!(
            candidates = stats.candidates,
            matched = stats.matched,
            hypotheses = stats.hypotheses,
            "hypothesis expansion finished"
        );
        Ok(stats)
    }
}

// ============================================================================
// Precomputed hypotheses
// ============================================================================

/// A hypothesis already attached to its two mentions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisRecord {
    pub subject: ExtractedEntity,
    pub object: ExtractedEntity,
    #[serde(flatten)]
    pub hypothesis: Hypothesis,
}

/// Build an engine straight from hypothesis records
pub fn engine_from_records(
    records: Vec<HypothesisRecord>,
    config: ResolverConfig,
) -> Engine<ExtractedEntity> {
    let mut builder = Builder::new().with_config(config);
    for record in records {
        builder.insert(record.subject, record.object, record.hypothesis);
    }
    builder.build()
}

/// Solve every component on the blocking pool, keeping component order
pub async fn resolve_concurrently(
    engine: &Engine<ExtractedEntity>,
) -> Result<Vec<ExtractedRelation>> {
    let subproblems = engine.subproblems(&mut TracingSink);

    let tasks = subproblems
        .into_iter()
        .map(|subproblem| tokio::task::spawn_blocking(move || subproblem.solve(&mut TracingSink)));
    let solved = try_join_all(tasks)
        .await
        .map_err(|e| OtlError::Other(anyhow::anyhow!("resolver task failed: {e}")))?;

    Ok(solved
        .into_iter()
        .flatten()
        .map(ExtractedRelation::from)
        .collect())
}

// ============================================================================
// End-to-end extractor
// ============================================================================

/// Expands candidates, then resolves them into consistent relations
pub struct ResolvingExtractor<I, H> {
    expander: HypothesisExpander<I, H>,
    resolver: ResolverConfig,
}

impl<I: PatternIndex, H: TypeHierarchy> ResolvingExtractor<I, H> {
    pub fn new(index: I, hierarchy: H) -> Self {
        Self {
            expander: HypothesisExpander::new(index, hierarchy),
            resolver: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.expander = self.expander.with_config(config.expansion.clone());
        self.resolver = config.resolver.clone();
        self
    }

    /// Expand candidates into a ready-to-solve engine
    pub async fn build_engine(
        &self,
        candidates: &[CandidatePair],
    ) -> Result<(Engine<ExtractedEntity>, ExpansionStats)> {
        let mut builder = Builder::new().with_config(self.resolver.clone());
        let stats = self.expander.expand(candidates, &mut builder).await?;
        Ok((builder.build(), stats))
    }
}

#[async_trait]
impl<I: PatternIndex, H: TypeHierarchy> RelationExtractor for ResolvingExtractor<I, H> {
    async fn extract(&self, candidates: &[CandidatePair]) -> Result<Vec<ExtractedRelation>> {
        let (engine, stats) = self.build_engine(candidates).await?;
        let relations = resolve_concurrently(&engine).await?;

        tracing::info!(
            candidates = stats.candidates,
            hypotheses = stats.hypotheses,
            relations = relations.len(),
            "relations resolved"
        );
        Ok(relations)
    }
}

// ============================================================================
// Tests
// ============================================================================
