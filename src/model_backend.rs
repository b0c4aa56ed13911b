//! Model backends: the opaque prompt-in, text-out capability behind the pipeline.
//!
//! Backends are synchronous. The HTTP surface runs the whole pipeline on a
//! blocking thread, so a slow model never stalls the async runtime.

use crate::errors::{EthosError, EthosResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A generative model invoked as prompt in, text out.
pub trait ModelBackend: Send + Sync {
    /// Short identifier used in logs, status output and error messages
    fn id(&self) -> &str;

    /// Run the model. Any failure must be reported as
    /// [`EthosError::ModelUnavailable`].
    fn invoke(&self, prompt: &str) -> EthosResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Echo,
    Sample,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: BackendKind,
    /// Completion endpoint for the `http` backend
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sample,
            endpoint: "http://127.0.0.1:8081/completion".to_string(),
            timeout_secs: 30,
            max_tokens: 256,
        }
    }
}

/// Build the backend selected in configuration
pub fn build_backend(config: &ModelConfig) -> Arc<dyn ModelBackend> {
    match config.backend {
        BackendKind::Echo => Arc::new(EchoBackend),
        BackendKind::Sample => Arc::new(SampleBackend),
        BackendKind::Http => Arc::new(HttpBackend::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
            config.max_tokens,
        )),
    }
}

/// Returns the prompt unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoBackend;

impl ModelBackend for EchoBackend {
    fn id(&self) -> &str {
        "echo"
    }

    fn invoke(&self, prompt: &str) -> EthosResult<String> {
        Ok(prompt.to_string())
    }
}

/// Canned answer used when no real model is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleBackend;

impl ModelBackend for SampleBackend {
    fn id(&self) -> &str {
        "sample"
    }

    fn invoke(&self, prompt: &str) -> EthosResult<String> {
        Ok(format!("This is a sample answer based on the prompt: {prompt}"))
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

/// Client for a llama.cpp-style `/completion` server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    endpoint: String,
    timeout: Duration,
    max_tokens: u32,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, max_tokens: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            max_tokens,
        }
    }

    fn unavailable(&self, message: impl std::fmt::Display) -> EthosError {
        EthosError::model_unavailable(self.id(), message.to_string())
    }
}

impl ModelBackend for HttpBackend {
    fn id(&self) -> &str {
        "http"
    }

    fn invoke(&self, prompt: &str) -> EthosResult<String> {
        // Built per call so the blocking client is always created and dropped
        // on the calling (blocking) thread.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| self.unavailable(e))?;

        debug!(endpoint = %self.endpoint, "invoking completion endpoint");
        let res = client
            .post(&self.endpoint)
            .json(&CompletionRequest {
                prompt,
                n_predict: self.max_tokens,
                stream: false,
            })
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.unavailable(e))?;

        let parsed = res
            .json::<CompletionResponse>()
            .map_err(|e| self.unavailable(format!("invalid completion body: {e}")))?;
        Ok(parsed.content)
    }
}
