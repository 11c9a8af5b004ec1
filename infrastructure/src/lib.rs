//! Infrastructure layer for foresight
//!
//! Adapters for the application layer's ports: the HTTP chat-completions
//! model invoker, the evidence-source search providers, and the config
//! loading that turns a TOML file into a wired pipeline configuration.

pub mod config;
pub mod providers;
pub mod question;
pub mod search;

pub use config::{ConfigError, ConfigLoader, FileConfig};
pub use providers::openrouter::OpenRouterInvoker;
pub use question::{QuestionFileError, load_question};
