//! Process configuration, loaded once at startup.
//!
//! Layering: built-in defaults, then a TOML file, then `ETHOS_`-prefixed
//! environment variables (`__` separates nested keys, for example
//! `ETHOS_POLICY__APPROVAL_THRESHOLD=0.7`).

use crate::audit::AuditConfig;
use crate::errors::{EthosError, EthosResult};
use crate::model_backend::ModelConfig;
use crate::policy_gate::PolicyConfig;
use crate::prompt::PromptConfig;
use crate::self_review::ReviewConfig;
use crate::trust_score::ScoringWeights;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "quanta_ethos.toml";
pub const CONFIG_PATH_ENV: &str = "ETHOS_CONFIG_PATH";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EthosConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub policy: PolicyConfig,
    pub review: ReviewConfig,
    pub scoring: ScoringWeights,
    pub audit: AuditConfig,
    pub prompt: PromptConfig,
}

impl EthosConfig {
    /// Defaults merged with the TOML file at `path` and the environment
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(EthosConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ETHOS_").split("__"))
    }

    /// Parse from TOML text over the defaults, without touching the environment
    pub fn from_toml_str(toml: &str) -> EthosResult<Self> {
        let config: EthosConfig = Figment::from(Serialized::defaults(EthosConfig::default()))
            .merge(Toml::string(toml))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EthosResult<()> {
        let threshold = self.policy.approval_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(EthosError::config(format!(
                "policy.approval_threshold must be within [0, 1], got {threshold}"
            )));
        }

        if self.policy.risk_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(EthosError::config("policy.risk_patterns must not contain empty patterns"));
        }

        if self.review.rules.iter().any(|r| r.pattern.trim().is_empty()) {
            return Err(EthosError::config("review.rules must not contain empty patterns"));
        }

        let w = &self.scoring;
        for (name, value) in [("baseline", w.baseline), ("high", w.high), ("medium", w.medium), ("low", w.low)] {
            if !value.is_finite() || value < 0.0 {
                return Err(EthosError::config(format!(
                    "scoring.{name} must be a finite, non-negative number"
                )));
            }
        }

        if self.audit.structured_path.as_os_str().is_empty()
            || self.audit.tabular_path.as_os_str().is_empty()
        {
            return Err(EthosError::config("audit sink paths cannot be empty"));
        }

        Ok(())
    }
}

/// Resolve the config file: explicit path, then `ETHOS_CONFIG_PATH`, then
/// `quanta_ethos.toml` in the working directory. A missing file is not an
/// error; defaults and environment still apply.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

pub fn load_config(explicit: Option<&Path>) -> EthosResult<EthosConfig> {
    let path = resolve_config_path(explicit);
    let config: EthosConfig = EthosConfig::figment(&path).extract()?;
    config.validate()?;
    Ok(config)
}
