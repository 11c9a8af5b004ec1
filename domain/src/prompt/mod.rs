//! Prompt templates for every model call in the pipeline

mod template;

pub use template::{PromptTemplate, QUERY_DELIMITER};
