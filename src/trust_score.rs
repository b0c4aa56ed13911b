use crate::self_review::{ReviewNotes, Severity};
use serde::{Deserialize, Serialize};

/// Penalty weights for the risk-marker trust model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    /// Score given to notes without any risk marker
    pub baseline: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            baseline: 0.95,
            high: 0.6, // one high-risk marker lands below the default 0.5 threshold
            medium: 0.25,
            low: 0.1,
        }
    }
}

impl ScoringWeights {
    pub fn penalty(&self, severity: Severity) -> f64 {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Maps review notes to a trust score in `[0, 1]`.
pub trait TrustScorer: Send + Sync {
    fn score(&self, notes: &ReviewNotes) -> f64;
}

/// Subtracts a per-severity penalty from the baseline for every marker.
///
/// Penalties are non-negative, so adding a marker never raises the score.
#[derive(Debug, Clone, Default)]
pub struct WeightedTrustScorer {
    weights: ScoringWeights,
}

impl WeightedTrustScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }
}

impl TrustScorer for WeightedTrustScorer {
    fn score(&self, notes: &ReviewNotes) -> f64 {
        let penalty: f64 = notes
            .markers
            .iter()
            .map(|m| self.weights.penalty(m.severity).max(0.0))
            .sum();
        clamp_unit(self.weights.baseline - penalty)
    }
}

/// Clamp to `[0, 1]`; NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
