// tests/config.rs
use quanta_ethos::config::load_config;
use quanta_ethos::model_backend::BackendKind;
use quanta_ethos::policy_gate::EnforcementMode;
use quanta_ethos::self_review::Severity;
use std::fs;

#[test]
pub fn toml_file_loads_successfully() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quanta_ethos.toml");
    fs::write(
        &path,
        r#"
[server]
port = 9090

[model]
backend = "http"
endpoint = "http://10.0.0.5:8081/completion"
timeout_secs = 5

[policy]
approval_threshold = 0.7
risk_patterns = ["DROP TABLE", "rm -rf"]
enforcement_mode = "enforce"

[[review.rules]]
pattern = "DROP TABLE"
severity = "high"

[[review.rules]]
pattern = "rm -rf"
severity = "medium"

[audit]
structured_path = "/var/log/ethos/audit.jsonl"
tabular_path = "/var/log/ethos/audit.csv"
"#,
    )
    .unwrap();

    let cfg = load_config(Some(&path)).expect("config should load");
    assert_eq!(cfg.server.port, 9090);
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.model.backend, BackendKind::Http);
    assert_eq!(cfg.model.timeout_secs, 5);
    assert_eq!(cfg.policy.approval_threshold, 0.7);
    assert_eq!(cfg.policy.risk_patterns, vec!["DROP TABLE".to_string(), "rm -rf".to_string()]);
    assert_eq!(cfg.policy.enforcement_mode, EnforcementMode::Enforce);
    assert_eq!(cfg.review.rules.len(), 2);
    assert_eq!(cfg.review.rules[1].severity, Severity::Medium);
    assert_eq!(cfg.audit.tabular_path.to_str(), Some("/var/log/ethos/audit.csv"));
}

#[test]
pub fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config(Some(&dir.path().join("absent.toml"))).expect("defaults apply");
    assert_eq!(cfg.policy.approval_threshold, 0.5);
    assert_eq!(cfg.model.backend, BackendKind::Sample);
}

#[test]
pub fn invalid_threshold_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[policy]\napproval_threshold = -0.1\n").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("approval_threshold"));
}

#[test]
pub fn wrong_type_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[server]\nport = \"eighty\"\n").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}
