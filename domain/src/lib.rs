//! Domain layer for foresight
//!
//! This crate contains the core business logic, entities, and value objects
//! of the ensemble forecasting pipeline. It has no dependencies on
//! infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Ensemble Forecasting
//!
//! A panel of forecaster identities, each bound to a fallback chain of
//! models, independently reasons about a question. Their predictions are
//! reconciled into one final answer by a synthesis step, with deterministic
//! averaging as the fallback when synthesis itself fails.
//!
//! ## Research
//!
//! Before forecasting, evidence is gathered from multiple search sources,
//! scored for relevance, and condensed into a bounded research brief.

pub mod core;
pub mod forecast;
pub mod prompt;
pub mod research;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    model::Model,
    question::{NumericRange, Question, QuestionKind},
};
pub use forecast::{
    parsing::{
        ParseError, extract_json_block, extract_option_probabilities, extract_percentiles,
        extract_probability, extract_relevance_score,
    },
    prediction::{OptionProbability, PERCENTILE_LEVELS, Percentiles, Prediction},
    result::{EnsembleResult, FinalMethod, IdentityOutcome},
    run::{ForecasterRun, select_representative},
};
pub use prompt::{PromptTemplate, QUERY_DELIMITER};
pub use research::evidence::{
    EvidenceRecord, dedup_records, placeholder_records, sort_by_relevance,
};
