//! Self-review: the single content-inspection point of the pipeline.
//!
//! A reviewer reads model output (or a candidate command) and records every
//! known risk pattern it finds. The notes keep the matched pattern text
//! verbatim so the policy gate can find it again by substring search.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much a matched pattern should weigh against trust
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        };
        f.write_str(s)
    }
}

/// A pattern the reviewer looks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRule {
    pub pattern: String,
    pub severity: Severity,
}

impl RiskRule {
    pub fn new(pattern: impl Into<String>, severity: Severity) -> Self {
        Self {
            pattern: pattern.into(),
            severity,
        }
    }
}

/// A rule that matched during review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMarker {
    pub pattern: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub rules: Vec<RiskRule>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

/// Built-in rule set: destructive filesystem and system operations first.
pub fn default_rules() -> Vec<RiskRule> {
    use Severity::*;
    vec![
        RiskRule::new("rm -rf", High),
        RiskRule::new("rm -fr", High),
        RiskRule::new("mkfs", High),
        RiskRule::new("dd if=", High),
        RiskRule::new(":(){ :|:& };:", High),
        RiskRule::new("chmod -R 777 /", High),
        RiskRule::new("> /dev/sda", High),
        RiskRule::new("DROP TABLE", High),
        RiskRule::new("| sh", Medium),
        RiskRule::new("| bash", Medium),
        RiskRule::new("shutdown", Medium),
        RiskRule::new("reboot", Medium),
        RiskRule::new("sudo", Low),
    ]
}

/// Findings from one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewNotes {
    /// The text that was reviewed
    pub inspected: String,
    pub markers: Vec<RiskMarker>,
}

impl ReviewNotes {
    pub fn has_markers(&self) -> bool {
        !self.markers.is_empty()
    }

    /// Whether `pattern` was found: either a recorded marker or a substring of
    /// the inspected text. The rendered scaffolding is never searched.
    /// Case-insensitive; an empty pattern never matches.
    pub fn contains(&self, pattern: &str) -> bool {
        if pattern.is_empty() {
            return false;
        }
        if self
            .markers
            .iter()
            .any(|m| m.pattern.eq_ignore_ascii_case(pattern))
        {
            return true;
        }
        self.inspected
            .to_lowercase()
            .contains(&pattern.to_lowercase())
    }

    pub fn marker_patterns(&self) -> Vec<String> {
        self.markers.iter().map(|m| m.pattern.clone()).collect()
    }

    /// Stable text form stored in audit records.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ReviewNotes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Self-review notes for: {}", self.inspected)?;
        if self.markers.is_empty() {
            return write!(f, "\nno risk markers");
        }
        for marker in &self.markers {
            write!(f, "\nRISK[{}]: {}", marker.severity, marker.pattern)?;
        }
        Ok(())
    }
}

/// Inspects text and produces [`ReviewNotes`].
pub trait SelfReviewer: Send + Sync {
    fn review(&self, text: &str) -> ReviewNotes;
}

/// Case-insensitive substring reviewer over an ordered rule list.
#[derive(Debug, Clone)]
pub struct PatternReviewer {
    rules: Vec<RiskRule>,
}

impl PatternReviewer {
    pub fn new(rules: Vec<RiskRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(config.rules.clone())
    }
}

impl Default for PatternReviewer {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl SelfReviewer for PatternReviewer {
    fn review(&self, text: &str) -> ReviewNotes {
        let haystack = text.to_lowercase();
        let mut markers: Vec<RiskMarker> = Vec::new();

        for rule in &self.rules {
            if rule.pattern.is_empty() || markers.iter().any(|m| m.pattern == rule.pattern) {
                continue;
            }
            if haystack.contains(&rule.pattern.to_lowercase()) {
                markers.push(RiskMarker {
                    pattern: rule.pattern.clone(),
                    severity: rule.severity,
                });
            }
        }

        ReviewNotes {
            inspected: text.to_string(),
            markers,
        }
    }
}
