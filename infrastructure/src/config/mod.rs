//! Configuration loading and conversion
//!
//! [`FileConfig`] mirrors the TOML structure; [`ConfigLoader`] merges the
//! file sources; conversion into the application layer's wired types
//! happens on [`FileConfig::pipeline_config`], where chains are validated
//! and credentials resolved.

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileIdentityConfig, FileLimitsConfig, FileModelsConfig, FilePanelConfig,
    FileProviderConfig, FileResearchConfig, FileRetryConfig, FileSourcesConfig,
};
pub use loader::ConfigLoader;

use thiserror::Error;

/// Configuration errors, all fatal at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("environment variable {env} is not set (required for the model provider)")]
    MissingCredential { env: String },

    #[error("model chain '{name}' is empty")]
    EmptyChain { name: String },
}
