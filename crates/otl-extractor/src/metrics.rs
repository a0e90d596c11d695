//! Quality Metrics module
//!
//! Precision, recall and F1 of resolved relations against a gold set.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use otl_core::Result;

use crate::ExtractedRelation;

// ============================================================================
// Relation Metrics
// ============================================================================

/// Metrics for relation extraction evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetrics {
    /// True positives (correctly identified relations)
    pub true_positives: usize,
    /// False positives (incorrectly identified relations)
    pub false_positives: usize,
    /// False negatives (missed relations)
    pub false_negatives: usize,
    /// Total relations in gold standard
    pub gold_total: usize,
    /// Total relations predicted
    pub predicted_total: usize,
}

impl RelationMetrics {
    /// Calculate precision (TP / (TP + FP))
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (TP / (TP + FN))
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Fold another evaluation into this one
    pub fn merge(&mut self, other: &RelationMetrics) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.gold_total += other.gold_total;
        self.predicted_total += other.predicted_total;
    }

    /// Print a summary report
    pub fn report(&self) -> String {
        format!(
            "Precision: {:.1}%\n\
             Recall:    {:.1}%\n\
             F1 Score:  {:.1}%\n\
             Gold: {} | Predicted: {} | TP: {} | FP: {} | FN: {}",
            self.precision() * 100.0,
            self.recall() * 100.0,
            self.f1_score() * 100.0,
            self.gold_total,
            self.predicted_total,
            self.true_positives,
            self.false_positives,
            self.false_negatives,
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// ============================================================================
// Gold Standard Types
// ============================================================================

/// A gold standard relation for evaluation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GoldRelation {
    pub subject_text: String,
    pub predicate: String,
    pub object_text: String,
}

impl GoldRelation {
    pub fn new(
        subject_text: impl Into<String>,
        predicate: impl Into<String>,
        object_text: impl Into<String>,
    ) -> Self {
        Self {
            subject_text: subject_text.into(),
            predicate: predicate.into(),
            object_text: object_text.into(),
        }
    }

    /// Load a JSON array of gold relations
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl From<&ExtractedRelation> for GoldRelation {
    fn from(r: &ExtractedRelation) -> Self {
        Self {
            subject_text: r.subject.text.clone(),
            predicate: r.predicate.clone(),
            object_text: r.object.text.clone(),
        }
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluator for extraction quality
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    /// Count a relation whose arguments are swapped as a match
    symmetric: bool,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore argument order when matching
    pub fn symmetric(mut self) -> Self {
        self.symmetric = true;
        self
    }

    /// Evaluate relation extraction
    pub fn evaluate_relations(
        &self,
        predicted: &[ExtractedRelation],
        gold: &[GoldRelation],
    ) -> RelationMetrics {
        let predicted_set: HashSet<GoldRelation> =
            predicted.iter().map(GoldRelation::from).collect();
        let gold_set: HashSet<GoldRelation> = gold.iter().cloned().collect();

        // each gold relation is matched at most once, exact matches first
        let mut matched: HashSet<&GoldRelation> = HashSet::new();
        let mut unmatched: Vec<&GoldRelation> = Vec::new();
        for p in &predicted_set {
            match gold_set.get(p) {
                Some(g) => {
                    matched.insert(g);
                }
                None => unmatched.push(p),
            }
        }
        if self.symmetric {
            for p in unmatched {
                if let Some(g) = gold_set.get(&swapped(p)) {
                    matched.insert(g);
                }
            }
        }

        let true_positives = matched.len();
        let false_positives = predicted_set.len() - true_positives;
        let false_negatives = gold_set.len() - true_positives;

        RelationMetrics {
            true_positives,
            false_positives,
            false_negatives,
            gold_total: gold_set.len(),
            predicted_total: predicted_set.len(),
        }
    }
}

fn swapped(r: &GoldRelation) -> GoldRelation {
    GoldRelation {
        subject_text: r.object_text.clone(),
        predicate: r.predicate.clone(),
        object_text: r.subject_text.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
