//! Error handling for the QuantaEthos pipeline
//!
//! Every fallible operation in the crate returns [`EthosResult`]. The scoring
//! components themselves are total; errors only come from the model boundary,
//! request parsing, configuration and the audit sinks.

use thiserror::Error;

/// Main error type for the QuantaEthos pipeline
#[derive(Error, Debug)]
pub enum EthosError {
    #[error("Model backend '{backend}' unavailable: {message}")]
    ModelUnavailable { backend: String, message: String },

    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    #[error("Audit sink '{sink}' failed: {message}")]
    Persistence { sink: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Mutex lock failed: {resource}")]
    MutexPoisoned { resource: String },
}

/// Type alias for Result with EthosError
pub type EthosResult<T> = Result<T, EthosError>;

impl EthosError {
    /// Create a model-unavailable error
    pub fn model_unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-request error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Create a persistence error for the named sink
    pub fn persistence(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Self::ModelUnavailable { .. })
    }
}

/// Safe mutex locking that reports poisoning as an [`EthosError`]
pub trait SafeLock<T: ?Sized> {
    fn safe_lock(&self, resource: &str) -> EthosResult<std::sync::MutexGuard<'_, T>>;
}

impl<T: ?Sized> SafeLock<T> for std::sync::Mutex<T> {
    fn safe_lock(&self, resource: &str) -> EthosResult<std::sync::MutexGuard<'_, T>> {
        self.lock().map_err(|_| EthosError::MutexPoisoned {
            resource: resource.to_string(),
        })
    }
}

impl From<serde_json::Error> for EthosError {
    fn from(err: serde_json::Error) -> Self {
        EthosError::serialization("json_operation", err)
    }
}

impl From<std::io::Error> for EthosError {
    fn from(err: std::io::Error) -> Self {
        EthosError::io("io_operation", err)
    }
}

impl From<figment::Error> for EthosError {
    fn from(err: figment::Error) -> Self {
        EthosError::config(err.to_string())
    }
}
