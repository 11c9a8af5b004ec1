//! Application layer for foresight
//!
//! Use cases orchestrate the forecasting pipeline; ports define the
//! interfaces that infrastructure adapters implement. The layer owns the
//! resilience machinery: the fallback chain over ordered model lists and
//! the injected concurrency limits.

pub mod config;
pub mod fallback;
pub mod limits;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{IdentityConfig, PanelConfig, PipelineConfig, ResearchConfig};
pub use fallback::{AttemptFailure, ChainError, ChainResponse, FallbackChain, RetryPolicy};
pub use limits::{ConcurrencyLimits, GovernedInvoker};
pub use ports::model_invoker::{InvokeError, InvokeParams, ModelInvoker};
pub use ports::search_provider::{SearchError, SearchProvider};
pub use use_cases::forecast_question::{ForecastPipeline, PipelineError};
pub use use_cases::run_research::ResearchBrief;
