//! Pipeline use cases, in data-flow order
//!
//! Question -> [`generate_queries`] -> [`run_research`] ->
//! [`run_ensemble`] -> [`synthesize`], wired together end-to-end by
//! [`forecast_question`]. Structured-prediction extraction shared by the
//! ensemble and synthesis stages lives in [`extract`].

pub mod extract;
pub mod forecast_question;
pub mod generate_queries;
pub mod run_ensemble;
pub mod run_research;
pub mod synthesize;
