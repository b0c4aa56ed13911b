#![allow(dead_code)]

use quanta_ethos::audit::{AuditConfig, AuditRecorder, Interaction};
use quanta_ethos::config::EthosConfig;
use quanta_ethos::core_engine::CoreEngine;
use quanta_ethos::model_backend::ModelBackend;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Engine wired to audit files inside a private temp dir
pub struct TestEnv {
    _tmp: TempDir,
    pub root: PathBuf,
    pub config: EthosConfig,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().to_path_buf();
        let mut config = EthosConfig::default();
        config.audit = AuditConfig {
            structured_path: root.join("audit/interactions.jsonl"),
            tabular_path: root.join("audit/interactions.csv"),
        };
        Self {
            _tmp: tmp,
            root,
            config,
        }
    }

    pub fn engine(&self, backend: Arc<dyn ModelBackend>) -> CoreEngine {
        CoreEngine::new(&self.config, backend, AuditRecorder::from_config(&self.config.audit))
    }

    pub fn structured_records(&self) -> Vec<Interaction> {
        read_jsonl(&self.config.audit.structured_path)
    }

    pub fn tabular_rows(&self) -> Vec<csv::StringRecord> {
        read_csv(&self.config.audit.tabular_path)
    }

    /// Write the current config as TOML for the CLI binaries
    pub fn write_config_file(&self) -> PathBuf {
        let path = self.root.join("quanta_ethos.toml");
        let toml = format!(
            "[audit]\nstructured_path = {:?}\ntabular_path = {:?}\n",
            self.config.audit.structured_path.display().to_string(),
            self.config.audit.tabular_path.display().to_string(),
        );
        fs::write(&path, toml).expect("write config");
        path
    }
}

pub fn read_jsonl(path: &Path) -> Vec<Interaction> {
    match fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(|l| serde_json::from_str(l).expect("each line is a full record"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

pub fn read_csv(path: &Path) -> Vec<csv::StringRecord> {
    if !path.exists() {
        return Vec::new();
    }
    let mut reader = csv::Reader::from_path(path).expect("open csv");
    reader
        .records()
        .map(|r| r.expect("each row is complete"))
        .collect()
}
