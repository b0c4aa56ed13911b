//! Prompt transformation: raw user input to the policy-aware prompt sent to the model.

use serde::{Deserialize, Serialize};

/// Wraps raw user input before it reaches the model.
///
/// Implementations must be pure: the same input always yields the same prompt,
/// so an audit record can be reproduced from its `raw_input` alone.
pub trait PromptTransformer: Send + Sync {
    fn transform(&self, raw_input: &str) -> String;
}

/// Text placed around user input and model output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    /// Prefix for every prompt sent to the model
    pub preamble: String,
    /// Prefix for every response surfaced to a caller
    pub output_marker: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            preamble: "Ethical prompt for: ".to_string(),
            output_marker: "Checked: ".to_string(),
        }
    }
}

/// Default transformer: prefixes the configured ethical preamble.
#[derive(Debug, Clone)]
pub struct EthicalPromptTransformer {
    preamble: String,
}

impl EthicalPromptTransformer {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
        }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        Self::new(config.preamble.clone())
    }
}

impl Default for EthicalPromptTransformer {
    fn default() -> Self {
        Self::from_config(&PromptConfig::default())
    }
}

impl PromptTransformer for EthicalPromptTransformer {
    fn transform(&self, raw_input: &str) -> String {
        format!("{}{}", self.preamble, raw_input)
    }
}
