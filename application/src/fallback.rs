//! Fallback chain over an ordered model list
//!
//! The chain tries each model in order until one succeeds. A single model
//! failure stays inside the chain; only when every model has failed does
//! the caller see an aggregate error naming each attempted model and its
//! failure reason. The structured mode re-descends the same chain when a
//! response cannot be parsed into the expected shape, not just when the
//! call itself fails.

use crate::ports::model_invoker::{InvokeParams, ModelInvoker};
use foresight_domain::{Model, extract_json_block};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Declarative retry policy applied around each per-model call.
///
/// The default of one attempt keeps chain traversal as the primary
/// resilience mechanism; raising `max_attempts` adds a fixed-delay retry
/// for transient failures before the chain advances.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::from_secs(1),
        }
    }
}

/// One failed attempt in a chain traversal, kept for the aggregate error
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    /// Model identifier
    pub model: String,
    /// 1-based attempt number within this model's retry budget
    pub attempt: u32,
    /// Failure kind label (see `InvokeError::kind`)
    pub kind: &'static str,
    /// Human-readable failure description
    pub error: String,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (attempt {}): {}", self.model, self.attempt, self.error)
    }
}

/// The ordered log of every failed attempt in one traversal
#[derive(Debug, Clone, Default)]
pub struct AttemptLog(pub Vec<AttemptFailure>);

impl std::fmt::Display for AttemptLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|a| a.to_string()).collect();
        write!(f, "[{}]", parts.join("; "))
    }
}

/// Chain-level errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("model chain must contain at least one model")]
    EmptyChain,

    #[error("all models in the chain failed: {0}")]
    AllFailed(AttemptLog),
}

impl ChainError {
    /// Every failed attempt, in order, when the whole chain failed
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            ChainError::EmptyChain => &[],
            ChainError::AllFailed(log) => &log.0,
        }
    }
}

/// A successful chain invocation, tagged with the model that answered
#[derive(Debug, Clone)]
pub struct ChainResponse {
    pub model: Model,
    pub text: String,
}

/// An ordered, non-empty sequence of models with shared invocation
/// parameters
#[derive(Debug, Clone)]
pub struct FallbackChain {
    models: Vec<Model>,
    params: InvokeParams,
    retry: RetryPolicy,
}

impl FallbackChain {
    /// Construct a chain; an empty model list is a configuration error
    pub fn new(models: Vec<Model>) -> Result<Self, ChainError> {
        if models.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        Ok(Self {
            models,
            params: InvokeParams::default(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_params(mut self, params: InvokeParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Invoke down the chain until one model succeeds.
    ///
    /// Each model gets `retry.max_attempts` tries (default one) before the
    /// chain advances. Every failure is logged with its kind and attempt
    /// index so a full fallback trace can be reconstructed afterwards.
    pub async fn invoke(
        &self,
        invoker: &dyn ModelInvoker,
        prompt: &str,
    ) -> Result<ChainResponse, ChainError> {
        let mut attempts = AttemptLog::default();
        for (index, model) in self.models.iter().enumerate() {
            if let Some(text) = self
                .try_model(invoker, model, index, prompt, &mut attempts)
                .await
            {
                return Ok(ChainResponse {
                    model: model.clone(),
                    text,
                });
            }
        }
        warn!(
            models = self.models.len(),
            failures = %attempts,
            "every model in the chain failed"
        );
        Err(ChainError::AllFailed(attempts))
    }

    /// Invoke down the chain, validating each response against the
    /// expected schema.
    ///
    /// A response that cannot be parsed counts as a failure for that
    /// model and the chain advances, exactly as if the call itself had
    /// failed.
    pub async fn invoke_structured<T: DeserializeOwned>(
        &self,
        invoker: &dyn ModelInvoker,
        prompt: &str,
    ) -> Result<(Model, T), ChainError> {
        let mut attempts = AttemptLog::default();
        for (index, model) in self.models.iter().enumerate() {
            let Some(text) = self
                .try_model(invoker, model, index, prompt, &mut attempts)
                .await
            else {
                continue;
            };
            match parse_structured::<T>(&text) {
                Ok(value) => return Ok((model.clone(), value)),
                Err(message) => {
                    warn!(
                        model = %model,
                        chain_index = index,
                        error = %message,
                        "structured parse failed; advancing down the chain"
                    );
                    attempts.0.push(AttemptFailure {
                        model: model.as_str().to_string(),
                        attempt: 1,
                        kind: "malformed_response",
                        error: format!("structured parse failed: {}", message),
                    });
                }
            }
        }
        Err(ChainError::AllFailed(attempts))
    }

    /// Run one model through its retry budget, recording failures.
    /// Returns the response text on success.
    async fn try_model(
        &self,
        invoker: &dyn ModelInvoker,
        model: &Model,
        chain_index: usize,
        prompt: &str,
        attempts: &mut AttemptLog,
    ) -> Option<String> {
        for attempt in 1..=self.retry.max_attempts {
            debug!(
                model = %model,
                chain_index,
                attempt,
                prompt_len = prompt.len(),
                "invoking model"
            );
            match invoker.invoke(model, prompt, &self.params).await {
                Ok(text) => {
                    info!(model = %model, chain_index, attempt, "model answered");
                    return Some(text);
                }
                Err(e) => {
                    warn!(
                        model = %model,
                        chain_index,
                        attempt,
                        kind = e.kind(),
                        error = %e,
                        "model call failed"
                    );
                    attempts.0.push(AttemptFailure {
                        model: model.as_str().to_string(),
                        attempt,
                        kind: e.kind(),
                        error: e.to_string(),
                    });
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }
        None
    }
}

/// Locate and deserialize the JSON object inside a model response
fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let block = extract_json_block(text).ok_or_else(|| "no JSON object in response".to_string())?;
    serde_json::from_str(block).map_err(|e| e.to_string())
}
