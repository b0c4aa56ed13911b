//! Library root for the `quanta_ethos` crate
//!
//! Trust-scoring and policy-gating pipeline between user instructions and a
//! generative model, with an auditable record of every interaction.

// Core error handling
pub mod api_errors;
pub mod errors;

// Pipeline stages
pub mod model_backend;
pub mod output_filter;
pub mod policy_gate;
pub mod prompt;
pub mod self_review;
pub mod trust_score;

// Audit
pub mod audit;

// Orchestration
pub mod core_engine;

// Configuration & CLI
pub mod cli;
pub mod config;

// Web server interface
pub mod ethos_web;

// Logging
pub mod telemetry;

pub use audit::{AuditRecorder, Interaction};
pub use config::EthosConfig;
pub use core_engine::{CoreEngine, Generation};
pub use errors::{EthosError, EthosResult};
pub use policy_gate::{Decision, Outcome, PolicyConfig};
