//! Forecast types and aggregation logic
//!
//! - [`prediction`] - the typed prediction union and its aggregation rules
//! - [`parsing`] - fixed-pattern extraction from free-form model output
//! - [`run`] - individual forecaster attempts and median-representative selection
//! - [`result`] - the externally visible ensemble result with full provenance

pub mod parsing;
pub mod prediction;
pub mod result;
pub mod run;
