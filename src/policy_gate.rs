//! Policy gate: turns a trust score plus review notes into approve/deny.

use crate::self_review::{default_rules, ReviewNotes, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const APPROVE_REASON: &str = "score above threshold";
pub const DEFAULT_DENY_REASON: &str = "trust score below threshold";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Approve,
    Deny,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Approve => f.write_str("approve"),
            Outcome::Deny => f.write_str("deny"),
        }
    }
}

/// What the generate path does with a deny
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    /// Record the decision, return the output anyway
    Advisory,
    /// Withhold denied output
    Enforce,
}

impl EnforcementMode {
    pub fn withholds(&self, outcome: Outcome) -> bool {
        matches!(self, EnforcementMode::Enforce) && outcome == Outcome::Deny
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub approval_threshold: f64,
    /// Checked in declaration order; the first hit names the deny reason
    pub risk_patterns: Vec<String>,
    pub enforcement_mode: EnforcementMode,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            approval_threshold: 0.5,
            risk_patterns: default_rules()
                .into_iter()
                .filter(|r| r.severity == Severity::High)
                .map(|r| r.pattern)
                .collect(),
            enforcement_mode: EnforcementMode::Advisory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "decision")]
    pub outcome: Outcome,
    pub reason: String,
    #[serde(rename = "trust_score")]
    pub score: f64,
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        self.outcome == Outcome::Approve
    }
}

pub fn deny_reason_for(pattern: &str) -> String {
    format!("High-risk command pattern '{pattern}' detected.")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyGate;

impl PolicyGate {
    /// Approve when `score >= approval_threshold`; otherwise deny, citing the
    /// first configured risk pattern found in the notes.
    pub fn decide(&self, score: f64, notes: &ReviewNotes, config: &PolicyConfig) -> Decision {
        if score >= config.approval_threshold {
            return Decision {
                outcome: Outcome::Approve,
                reason: APPROVE_REASON.to_string(),
                score,
            };
        }

        let reason = config
            .risk_patterns
            .iter()
            .find(|p| notes.contains(p))
            .map(|p| deny_reason_for(p))
            .unwrap_or_else(|| DEFAULT_DENY_REASON.to_string());

        Decision {
            outcome: Outcome::Deny,
            reason,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::self_review::{PatternReviewer, SelfReviewer};

    fn clean_notes() -> ReviewNotes {
        PatternReviewer::default().review("list files")
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = PolicyConfig::default();
        let decision = PolicyGate.decide(0.5, &clean_notes(), &config);
        assert_eq!(decision.outcome, Outcome::Approve);
        assert_eq!(decision.reason, APPROVE_REASON);
    }

    #[test]
    fn deny_cites_first_matching_pattern() {
        let config = PolicyConfig {
            risk_patterns: vec!["mkfs".into(), "rm -rf".into(), "dd if=".into()],
            ..PolicyConfig::default()
        };
        let notes = PatternReviewer::default().review("rm -rf / && dd if=/dev/zero of=/dev/sda");
        let decision = PolicyGate.decide(0.1, &notes, &config);
        assert_eq!(decision.outcome, Outcome::Deny);
        assert_eq!(decision.reason, "High-risk command pattern 'rm -rf' detected.");
    }

    #[test]
    fn deny_without_pattern_uses_default_reason() {
        let config = PolicyConfig {
            risk_patterns: Vec::new(),
            ..PolicyConfig::default()
        };
        let notes = PatternReviewer::default().review("rm -rf /");
        let decision = PolicyGate.decide(0.35, &notes, &config);
        assert_eq!(decision.outcome, Outcome::Deny);
        assert_eq!(decision.reason, DEFAULT_DENY_REASON);
    }

    #[test]
    fn notes_scaffolding_is_never_cited() {
        let config = PolicyConfig {
            risk_patterns: vec!["review".into(), "high".into()],
            ..PolicyConfig::default()
        };
        let notes = PatternReviewer::default().review("shutdown now && reboot");
        let decision = PolicyGate.decide(0.45, &notes, &config);
        assert_eq!(decision.outcome, Outcome::Deny);
        assert_eq!(decision.reason, DEFAULT_DENY_REASON);
    }

    #[test]
    fn high_score_approves_even_with_markers() {
        let notes = PatternReviewer::default().review("sudo ls");
        let decision = PolicyGate.decide(0.85, &notes, &PolicyConfig::default());
        assert!(decision.is_approved());
    }

    #[test]
    fn decision_serializes_with_cli_field_names() {
        let decision = Decision {
            outcome: Outcome::Deny,
            reason: "r".into(),
            score: 0.25,
        };
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["decision"], "deny");
        assert_eq!(value["reason"], "r");
        assert_eq!(value["trust_score"], 0.25);
    }

    #[test]
    fn enforce_mode_only_withholds_denials() {
        assert!(EnforcementMode::Enforce.withholds(Outcome::Deny));
        assert!(!EnforcementMode::Enforce.withholds(Outcome::Approve));
        assert!(!EnforcementMode::Advisory.withholds(Outcome::Deny));
    }
}
