//! Model invoker port
//!
//! Defines the interface for invoking a single named model. One call, one
//! outcome: retries and fallbacks are the chain's responsibility, never
//! the adapter's.

use async_trait::async_trait;
use foresight_domain::Model;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single model invocation
///
/// Every variant names the model so a chain's aggregate error reads
/// without unwrapping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvokeError {
    #[error("authentication rejected for {model}")]
    Authentication { model: String },

    #[error("rate limited by provider for {model}")]
    RateLimited { model: String },

    #[error("call to {model} timed out after {timeout_secs}s")]
    Timeout { model: String, timeout_secs: u64 },

    #[error("provider failure for {model}: {message}")]
    Provider { model: String, message: String },

    #[error("malformed response from {model}: {message}")]
    MalformedResponse { model: String, message: String },
}

impl InvokeError {
    /// Stable kind label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            InvokeError::Authentication { .. } => "authentication",
            InvokeError::RateLimited { .. } => "rate_limited",
            InvokeError::Timeout { .. } => "timeout",
            InvokeError::Provider { .. } => "provider",
            InvokeError::MalformedResponse { .. } => "malformed_response",
        }
    }
}

/// Shared invocation parameters for one chain
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeParams {
    /// Sampling temperature
    pub temperature: f64,
    /// Per-call timeout; the only bound on how long a stuck call can hold
    /// a concurrency-gate slot
    pub timeout: Duration,
    /// Optional completion-length cap
    pub max_tokens: Option<u32>,
}

impl Default for InvokeParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            timeout: Duration::from_secs(120),
            max_tokens: None,
        }
    }
}

impl InvokeParams {
    /// Deterministic parameters for extraction and rating calls
    pub fn deterministic() -> Self {
        Self {
            temperature: 0.0,
            ..Self::default()
        }
    }
}

/// Port for invoking one named model with a prompt
///
/// Implementations (adapters) live in the infrastructure layer. Each call
/// must emit a structured log event recording the model identifier,
/// prompt length, elapsed time and outcome, with credentials redacted.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(
        &self,
        model: &Model,
        prompt: &str,
        params: &InvokeParams,
    ) -> Result<String, InvokeError>;
}
