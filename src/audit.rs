//! Interaction audit trail.
//!
//! Every pipeline run produces one [`Interaction`]. The [`AuditRecorder`]
//! fans it out to a structured sink (one JSON object per line) and a tabular
//! sink (one CSV row). The sinks fail independently; a failure is logged and
//! never reaches the caller.

use crate::errors::{EthosError, EthosResult, SafeLock};
use crate::policy_gate::{Decision, Outcome};
use crate::self_review::ReviewNotes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Generate,
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    Completed,
    ModelUnavailable,
}

/// Full account of one pipeline run. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub kind: InteractionKind,
    pub status: InteractionStatus,
    pub raw_input: String,
    pub transformed_prompt: String,
    pub model_output: String,
    pub review_notes: String,
    pub risk_markers: Vec<String>,
    pub trust_score: f64,
    pub decision: Option<Outcome>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl Interaction {
    pub fn completed(
        kind: InteractionKind,
        raw_input: &str,
        transformed_prompt: &str,
        model_output: &str,
        notes: &ReviewNotes,
        decision: &Decision,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: InteractionStatus::Completed,
            raw_input: raw_input.to_string(),
            transformed_prompt: transformed_prompt.to_string(),
            model_output: model_output.to_string(),
            review_notes: notes.render(),
            risk_markers: notes.marker_patterns(),
            trust_score: decision.score,
            decision: Some(decision.outcome),
            reason: decision.reason.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Record for a generate run whose model call failed. Scoring never ran,
    /// so the score is 0 and there is no decision.
    pub fn model_failure(raw_input: &str, transformed_prompt: &str, error: &EthosError) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: InteractionKind::Generate,
            status: InteractionStatus::ModelUnavailable,
            raw_input: raw_input.to_string(),
            transformed_prompt: transformed_prompt.to_string(),
            model_output: format!("<model unavailable: {error}>"),
            review_notes: String::new(),
            risk_markers: Vec::new(),
            trust_score: 0.0,
            decision: None,
            reason: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Paths of the two audit sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub structured_path: PathBuf,
    pub tabular_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            structured_path: PathBuf::from("logs/interactions.jsonl"),
            tabular_path: PathBuf::from("logs/interactions.csv"),
        }
    }
}

/// Append-only destination for interaction records.
///
/// Implementations serialize their own writes; one append must land as one
/// complete record even under concurrent callers.
pub trait AuditSink: Send + Sync {
    fn name(&self) -> &str;
    fn append(&self, interaction: &Interaction) -> EthosResult<()>;
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// A target whose length can be read and rolled back.
trait Truncate: Write {
    fn current_len(&self) -> std::io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()>;
}

impl Truncate for File {
    fn current_len(&self) -> std::io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }
}

/// Write `line` in full or cut the target back to where it started, so a
/// failed append never leaves a partial record in front of the next one.
fn append_whole_line<T: Truncate>(target: &mut T, line: &[u8]) -> std::io::Result<()> {
    let start = target.current_len()?;
    let written = target.write_all(line).and_then(|_| target.flush());
    if let Err(e) = written {
        if let Err(rollback) = target.truncate_to(start) {
            warn!(error = %rollback, "failed to roll back partial audit line");
        }
        return Err(e);
    }
    Ok(())
}

/// One JSON object per line.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }
}

impl AuditSink for JsonLinesSink {
    fn name(&self) -> &str {
        "structured"
    }

    fn append(&self, interaction: &Interaction) -> EthosResult<()> {
        let mut line = serde_json::to_string(interaction)
            .map_err(|e| EthosError::serialization("structured audit record", e))?;
        line.push('\n');

        let mut guard = self.file.safe_lock("structured audit sink")?;
        if guard.is_none() {
            let file = open_append(&self.path)
                .map_err(|e| EthosError::io(format!("opening {}", self.path.display()), e))?;
            *guard = Some(file);
        }
        if let Some(file) = guard.as_mut() {
            let written = append_whole_line(file, line.as_bytes());
            if let Err(e) = written {
                // Reopen on the next append.
                *guard = None;
                return Err(EthosError::io(format!("appending to {}", self.path.display()), e));
            }
        }
        Ok(())
    }
}

pub const CSV_HEADER: [&str; 9] = [
    "id",
    "timestamp",
    "kind",
    "status",
    "raw_input",
    "trust_score",
    "decision",
    "reason",
    "risk_markers",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    id: String,
    timestamp: String,
    kind: InteractionKind,
    status: InteractionStatus,
    raw_input: &'a str,
    trust_score: f64,
    decision: Option<Outcome>,
    reason: &'a str,
    risk_markers: String,
}

impl<'a> From<&'a Interaction> for CsvRow<'a> {
    fn from(i: &'a Interaction) -> Self {
        Self {
            id: i.id.to_string(),
            timestamp: i.timestamp.to_rfc3339(),
            kind: i.kind,
            status: i.status,
            raw_input: &i.raw_input,
            trust_score: i.trust_score,
            decision: i.decision,
            reason: &i.reason,
            risk_markers: i.risk_markers.join(";"),
        }
    }
}

/// One CSV row per interaction; the header is written when the file is empty.
pub struct CsvSink {
    path: PathBuf,
    writer: Mutex<Option<csv::Writer<File>>>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(None),
        }
    }

    fn open(&self) -> EthosResult<csv::Writer<File>> {
        let file = open_append(&self.path)
            .map_err(|e| EthosError::io(format!("opening {}", self.path.display()), e))?;
        let empty = file
            .metadata()
            .map_err(|e| EthosError::io(format!("inspecting {}", self.path.display()), e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if empty {
            writer
                .write_record(CSV_HEADER)
                .map_err(|e| EthosError::persistence(self.name(), e.to_string()))?;
        }
        Ok(writer)
    }
}

impl AuditSink for CsvSink {
    fn name(&self) -> &str {
        "tabular"
    }

    fn append(&self, interaction: &Interaction) -> EthosResult<()> {
        let mut guard = self.writer.safe_lock("tabular audit sink")?;
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        if let Some(writer) = guard.as_mut() {
            let written = writer
                .serialize(CsvRow::from(interaction))
                .map_err(|e| e.to_string())
                .and_then(|_| writer.flush().map_err(|e| e.to_string()));
            if let Err(message) = written {
                *guard = None;
                return Err(EthosError::persistence(self.name(), message));
            }
        }
        Ok(())
    }
}

/// In-memory sink, for embedding and tests.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<Interaction>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> EthosResult<Vec<Interaction>> {
        Ok(self.records.safe_lock("memory audit sink")?.clone())
    }
}

impl AuditSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn append(&self, interaction: &Interaction) -> EthosResult<()> {
        self.records
            .safe_lock("memory audit sink")?
            .push(interaction.clone());
        Ok(())
    }
}

/// Which sinks accepted a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditReport {
    pub structured: bool,
    pub tabular: bool,
}

impl AuditReport {
    pub fn all_written(&self) -> bool {
        self.structured && self.tabular
    }
}

pub struct AuditRecorder {
    structured: Box<dyn AuditSink>,
    tabular: Box<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(structured: Box<dyn AuditSink>, tabular: Box<dyn AuditSink>) -> Self {
        Self { structured, tabular }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(
            Box::new(JsonLinesSink::new(&config.structured_path)),
            Box::new(CsvSink::new(&config.tabular_path)),
        )
    }

    /// Append to both sinks. Each sink is attempted regardless of the other;
    /// failures are logged and reported, never returned as errors.
    pub fn record(&self, interaction: &Interaction) -> AuditReport {
        AuditReport {
            structured: Self::append_logged(self.structured.as_ref(), interaction),
            tabular: Self::append_logged(self.tabular.as_ref(), interaction),
        }
    }

    fn append_logged(sink: &dyn AuditSink, interaction: &Interaction) -> bool {
        match sink.append(interaction) {
            Ok(()) => {
                debug!(sink = sink.name(), id = %interaction.id, "audit record written");
                true
            }
            Err(e) => {
                warn!(sink = sink.name(), id = %interaction.id, error = %e, "audit write failed");
                false
            }
        }
    }
}
