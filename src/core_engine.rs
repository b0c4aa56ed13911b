//! core_engine.rs
//! The request pipeline: prompt transform, model call, filter, self-review,
//! trust scoring, policy decision and audit, in that order.

use crate::audit::{AuditRecorder, Interaction, InteractionKind};
use crate::config::EthosConfig;
use crate::errors::EthosResult;
use crate::model_backend::{build_backend, ModelBackend};
use crate::output_filter::{OutputFilter, TrustworthinessFilter};
use crate::policy_gate::{Decision, PolicyConfig, PolicyGate};
use crate::prompt::{EthicalPromptTransformer, PromptTransformer};
use crate::self_review::{PatternReviewer, SelfReviewer};
use crate::trust_score::{TrustScorer, WeightedTrustScorer};

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of a generate run
#[derive(Debug, Clone)]
pub struct Generation {
    /// Text for the caller: filtered output, or a withheld notice in enforce mode
    pub response: String,
    pub decision: Decision,
    pub interaction_id: Uuid,
}

pub struct CoreEngine {
    transformer: Box<dyn PromptTransformer>,
    backend: Arc<dyn ModelBackend>,
    filter: Box<dyn OutputFilter>,
    reviewer: Box<dyn SelfReviewer>,
    scorer: Box<dyn TrustScorer>,
    gate: PolicyGate,
    policy: PolicyConfig,
    recorder: AuditRecorder,
}

impl CoreEngine {
    pub fn new(config: &EthosConfig, backend: Arc<dyn ModelBackend>, recorder: AuditRecorder) -> Self {
        info!(
            backend = backend.id(),
            threshold = config.policy.approval_threshold,
            enforcement = ?config.policy.enforcement_mode,
            "CoreEngine initialized"
        );
        Self {
            transformer: Box::new(EthicalPromptTransformer::from_config(&config.prompt)),
            backend,
            filter: Box::new(TrustworthinessFilter::new(config.prompt.output_marker.clone())),
            reviewer: Box::new(PatternReviewer::from_config(&config.review)),
            scorer: Box::new(WeightedTrustScorer::new(config.scoring.clone())),
            gate: PolicyGate,
            policy: config.policy.clone(),
            recorder,
        }
    }

    /// Engine with the backend and audit sinks named in configuration
    pub fn from_config(config: &EthosConfig) -> Self {
        Self::new(
            config,
            build_backend(&config.model),
            AuditRecorder::from_config(&config.audit),
        )
    }

    pub fn with_transformer(mut self, transformer: impl PromptTransformer + 'static) -> Self {
        self.transformer = Box::new(transformer);
        self
    }

    pub fn with_filter(mut self, filter: impl OutputFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn with_reviewer(mut self, reviewer: impl SelfReviewer + 'static) -> Self {
        self.reviewer = Box::new(reviewer);
        self
    }

    pub fn with_scorer(mut self, scorer: impl TrustScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Run the full pipeline for a generation request.
    ///
    /// A model failure aborts before scoring, is recorded as a
    /// `model_unavailable` interaction and returned to the caller.
    pub fn generate(&self, raw_input: &str) -> EthosResult<Generation> {
        let prompt = self.transformer.transform(raw_input);

        let model_output = match self.backend.invoke(&prompt) {
            Ok(output) => output,
            Err(e) => {
                warn!(backend = self.backend.id(), error = %e, "model invocation failed");
                self.recorder.record(&Interaction::model_failure(raw_input, &prompt, &e));
                return Err(e);
            }
        };

        let filtered = self.filter.filter(&model_output);
        let notes = self.reviewer.review(&model_output);
        let score = self.scorer.score(&notes);
        let decision = self.gate.decide(score, &notes, &self.policy);
        debug!(markers = ?notes.marker_patterns(), score, "generation reviewed");

        let interaction = Interaction::completed(
            InteractionKind::Generate,
            raw_input,
            &prompt,
            &model_output,
            &notes,
            &decision,
        );
        self.recorder.record(&interaction);
        info!(id = %interaction.id, outcome = %decision.outcome, score, "generation decided");

        let response = if self.policy.enforcement_mode.withholds(decision.outcome) {
            format!("Response withheld: {}", decision.reason)
        } else {
            filtered
        };

        Ok(Generation {
            response,
            decision,
            interaction_id: interaction.id,
        })
    }

    /// Review, score and gate a candidate command. No model is involved.
    pub fn validate_command(&self, candidate: &str) -> Decision {
        let notes = self.reviewer.review(candidate);
        let score = self.scorer.score(&notes);
        let decision = self.gate.decide(score, &notes, &self.policy);

        let interaction =
            Interaction::completed(InteractionKind::Validate, candidate, "", "", &notes, &decision);
        self.recorder.record(&interaction);
        info!(id = %interaction.id, outcome = %decision.outcome, score, "command validated");

        decision
    }

    pub fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "backend": self.backend.id(),
            "approval_threshold": self.policy.approval_threshold,
            "enforcement_mode": self.policy.enforcement_mode,
            "risk_patterns": self.policy.risk_patterns.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditSink, InteractionStatus, MemorySink};
    use crate::errors::EthosError;
    use crate::model_backend::EchoBackend;
    use crate::policy_gate::{EnforcementMode, Outcome, DEFAULT_DENY_REASON};
    use crate::self_review::{ReviewNotes, RiskRule, Severity};

    struct Shared(Arc<MemorySink>);

    impl AuditSink for Shared {
        fn name(&self) -> &str {
            "shared"
        }
        fn append(&self, interaction: &Interaction) -> EthosResult<()> {
            self.0.append(interaction)
        }
    }

    struct DownBackend;

    impl ModelBackend for DownBackend {
        fn id(&self) -> &str {
            "down"
        }
        fn invoke(&self, _prompt: &str) -> EthosResult<String> {
            Err(EthosError::model_unavailable("down", "connection refused"))
        }
    }

    fn engine(config: &EthosConfig, backend: Arc<dyn ModelBackend>) -> (CoreEngine, Arc<MemorySink>, Arc<MemorySink>) {
        let structured = Arc::new(MemorySink::new());
        let tabular = Arc::new(MemorySink::new());
        let recorder = AuditRecorder::new(Box::new(Shared(structured.clone())), Box::new(Shared(tabular.clone())));
        (CoreEngine::new(config, backend, recorder), structured, tabular)
    }

    #[test]
    fn benign_prompt_is_approved() {
        let (engine, structured, tabular) = engine(&EthosConfig::default(), Arc::new(EchoBackend));
        let generation = engine.generate("list files").unwrap();

        assert_eq!(generation.decision.outcome, Outcome::Approve);
        assert_eq!(generation.decision.reason, "score above threshold");
        assert_eq!(generation.response, "Checked: Ethical prompt for: list files");
        assert_eq!(structured.records().unwrap().len(), 1);
        assert_eq!(tabular.records().unwrap().len(), 1);
        assert_eq!(structured.records().unwrap()[0].id, generation.interaction_id);
    }

    #[test]
    fn scoring_sees_unfiltered_output() {
        let (engine, structured, _) = engine(&EthosConfig::default(), Arc::new(EchoBackend));
        let engine = engine.with_filter(TrustworthinessFilter::new("[safe] "));
        engine.generate("list files").unwrap();

        let records = structured.records().unwrap();
        let record = &records[0];
        assert_eq!(record.model_output, "Ethical prompt for: list files");
        assert!(!record.review_notes.contains("[safe]"));
    }

    #[test]
    fn enforce_mode_withholds_denied_output() {
        let mut config = EthosConfig::default();
        config.policy.enforcement_mode = EnforcementMode::Enforce;
        let (engine, _, _) = engine(&config, Arc::new(EchoBackend));

        let generation = engine.generate("rm -rf /").unwrap();
        assert_eq!(generation.decision.outcome, Outcome::Deny);
        assert_eq!(
            generation.response,
            "Response withheld: High-risk command pattern 'rm -rf' detected."
        );
    }

    #[test]
    fn advisory_mode_returns_denied_output() {
        let (engine, _, _) = engine(&EthosConfig::default(), Arc::new(EchoBackend));
        let generation = engine.generate("rm -rf /").unwrap();
        assert_eq!(generation.decision.outcome, Outcome::Deny);
        assert_eq!(generation.response, "Checked: Ethical prompt for: rm -rf /");
    }

    #[test]
    fn model_failure_is_recorded_and_returned() {
        let (engine, structured, tabular) = engine(&EthosConfig::default(), Arc::new(DownBackend));
        let err = engine.generate("hello").unwrap_err();

        assert!(err.is_model_unavailable());
        let records = structured.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, InteractionStatus::ModelUnavailable);
        assert_eq!(records[0].transformed_prompt, "Ethical prompt for: hello");
        assert_eq!(tabular.records().unwrap().len(), 1);
    }

    #[test]
    fn validate_command_denies_rm_rf() {
        let (engine, structured, _) = engine(&EthosConfig::default(), Arc::new(DownBackend));
        let decision = engine.validate_command("rm -rf /");

        assert_eq!(decision.outcome, Outcome::Deny);
        assert_eq!(decision.reason, "High-risk command pattern 'rm -rf' detected.");
        assert!(decision.score < 0.5);

        let records = structured.records().unwrap();
        let record = &records[0];
        assert_eq!(record.kind, InteractionKind::Validate);
        assert_eq!(record.model_output, "");
    }

    struct Shouting;

    impl PromptTransformer for Shouting {
        fn transform(&self, raw_input: &str) -> String {
            format!("SYS: {}", raw_input.to_uppercase())
        }
    }

    struct FixedScore(f64);

    impl TrustScorer for FixedScore {
        fn score(&self, _notes: &ReviewNotes) -> f64 {
            self.0
        }
    }

    #[test]
    fn injected_strategies_drive_the_pipeline() {
        let mut config = EthosConfig::default();
        config.policy.risk_patterns = vec!["deploy".into()];
        let (engine, structured, _) = engine(&config, Arc::new(EchoBackend));
        let engine = engine
            .with_transformer(Shouting)
            .with_reviewer(PatternReviewer::new(vec![RiskRule::new("deploy", Severity::Low)]))
            .with_scorer(FixedScore(0.2));

        let generation = engine.generate("deploy now").unwrap();
        assert_eq!(generation.decision.outcome, Outcome::Deny);
        assert_eq!(generation.decision.score, 0.2);
        assert_eq!(generation.decision.reason, "High-risk command pattern 'deploy' detected.");
        assert_eq!(generation.response, "Checked: SYS: DEPLOY NOW");

        let decision = engine.validate_command("list files");
        assert_eq!(decision.score, 0.2);
        assert_eq!(decision.reason, DEFAULT_DENY_REASON);

        let records = structured.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].transformed_prompt, "SYS: DEPLOY NOW");
        assert_eq!(records[0].risk_markers, vec!["deploy".to_string()]);
        assert_eq!(records[0].trust_score, 0.2);
        assert!(records[1].risk_markers.is_empty());
    }

    #[test]
    fn status_reports_policy() {
        let (engine, _, _) = engine(&EthosConfig::default(), Arc::new(EchoBackend));
        let status = engine.status();
        assert_eq!(status["backend"], "echo");
        assert_eq!(status["approval_threshold"], 0.5);
        assert_eq!(status["enforcement_mode"], "advisory");
    }
}
