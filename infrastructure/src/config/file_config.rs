//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the config file. They
//! deserialize directly and convert into the application layer's wired
//! types, resolving credentials from the environment at that point.

use crate::config::ConfigError;
use foresight_application::{
    ConcurrencyLimits, FallbackChain, IdentityConfig, PanelConfig, PipelineConfig, ResearchConfig,
    RetryPolicy,
};
use foresight_domain::Model;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model provider settings
    pub provider: FileProviderConfig,
    /// Shared model chains for non-forecasting calls
    pub models: FileModelsConfig,
    /// Forecaster panel composition
    pub panel: FilePanelConfig,
    /// Research stage tunables
    pub research: FileResearchConfig,
    /// Concurrency gates
    pub limits: FileLimitsConfig,
    /// Per-model-call retry policy
    pub retry: FileRetryConfig,
    /// Evidence source settings
    pub sources: FileSourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Environment variable holding the provider API key
    pub api_key_env: String,
    /// Override for the chat-completions endpoint
    pub api_url: Option<String>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            api_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Chain for query generation, relevance rating and summaries
    pub utility: Vec<Model>,
    /// Chain for the synthesis step
    pub synthesis: Vec<Model>,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        Self {
            utility: Model::default_utility_chain(),
            synthesis: Model::default_chain(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePanelConfig {
    /// Independent runs per identity (clamped to 1-5)
    pub runs_per_identity: usize,
    /// Identities, in report order
    pub identities: Vec<FileIdentityConfig>,
}

impl Default for FilePanelConfig {
    fn default() -> Self {
        Self {
            runs_per_identity: 1,
            identities: (1..=4)
                .map(|i| FileIdentityConfig {
                    name: format!("forecaster{}", i),
                    chain: Model::default_chain(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileIdentityConfig {
    pub name: String,
    pub chain: Vec<Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileResearchConfig {
    pub queries_per_strategy: usize,
    pub max_queries: usize,
    pub relevance_threshold: u8,
    pub summary_top_k: usize,
    pub summary_word_budget: usize,
}

impl Default for FileResearchConfig {
    fn default() -> Self {
        let defaults = ResearchConfig::default();
        Self {
            queries_per_strategy: defaults.queries_per_strategy,
            max_queries: defaults.max_queries,
            relevance_threshold: defaults.relevance_threshold,
            summary_top_k: defaults.summary_top_k,
            summary_word_budget: defaults.summary_word_budget,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimitsConfig {
    /// Questions forecast concurrently
    pub max_questions: usize,
    /// Model calls in flight across the whole process
    pub max_model_calls: usize,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        Self {
            max_questions: 1,
            max_model_calls: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    /// Attempts per model before the chain advances (1 = no retry)
    pub max_attempts: u32,
    /// Fixed delay between attempts, in seconds
    pub delay_secs: u64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSourcesConfig {
    /// Environment variable holding the NewsAPI key; the source is
    /// disabled when the variable is unset
    pub newsapi_key_env: String,
}

impl Default for FileSourcesConfig {
    fn default() -> Self {
        Self {
            newsapi_key_env: "NEWSAPI_KEY".to_string(),
        }
    }
}

impl FileConfig {
    /// Resolve the provider API key from the environment.
    ///
    /// The model provider is load-bearing, so a missing key is fatal.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.provider.api_key_env).map_err(|_| ConfigError::MissingCredential {
            env: self.provider.api_key_env.clone(),
        })
    }

    /// Resolve the NewsAPI key; `None` just disables the source
    pub fn resolve_newsapi_key(&self) -> Option<String> {
        std::env::var(&self.sources.newsapi_key_env).ok()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            delay: Duration::from_secs(self.retry.delay_secs),
        }
    }

    pub fn concurrency_limits(&self) -> ConcurrencyLimits {
        ConcurrencyLimits::new(self.limits.max_questions, self.limits.max_model_calls)
    }

    /// Build the wired pipeline configuration, validating every chain
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let retry = self.retry_policy();
        let identities = self
            .panel
            .identities
            .iter()
            .map(|identity| {
                let chain = build_chain(&identity.name, &identity.chain)?
                    .with_retry(retry.clone());
                Ok(IdentityConfig::new(identity.name.clone(), chain))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let panel = PanelConfig::new(identities).with_runs(self.panel.runs_per_identity);
        let research = ResearchConfig {
            queries_per_strategy: self.research.queries_per_strategy,
            max_queries: self.research.max_queries,
            relevance_threshold: self.research.relevance_threshold,
            summary_top_k: self.research.summary_top_k,
            summary_word_budget: self.research.summary_word_budget,
            ..ResearchConfig::default()
        };

        Ok(PipelineConfig {
            panel,
            research,
            utility_chain: build_chain("utility", &self.models.utility)?
                .with_retry(retry.clone()),
            synthesis_chain: build_chain("synthesis", &self.models.synthesis)?.with_retry(retry),
        })
    }
}

fn build_chain(name: &str, models: &[Model]) -> Result<FallbackChain, ConfigError> {
    FallbackChain::new(models.to_vec()).map_err(|_| ConfigError::EmptyChain {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[provider]
api_key_env = "MY_KEY"

[models]
utility = ["openai/gpt-5-mini"]
synthesis = ["anthropic/claude-sonnet-4.5", "openai/gpt-5"]

[panel]
runs_per_identity = 3
identities = [
    { name = "optimist", chain = ["openai/gpt-5"] },
    { name = "skeptic", chain = ["anthropic/claude-sonnet-4.5", "google/gemini-2.5-pro"] },
]

[research]
max_queries = 4
relevance_threshold = 5

[limits]
max_model_calls = 10

[retry]
max_attempts = 2
delay_secs = 3
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.api_key_env, "MY_KEY");
        assert_eq!(config.models.utility, vec![Model::Gpt5Mini]);
        assert_eq!(config.panel.identities.len(), 2);
        assert_eq!(config.panel.identities[1].name, "skeptic");
        assert_eq!(config.research.max_queries, 4);
        assert_eq!(config.limits.max_model_calls, 10);
        assert_eq!(config.retry.max_attempts, 2);

        let pipeline = config.pipeline_config().unwrap();
        assert_eq!(pipeline.panel.runs_per_identity, 3);
        assert_eq!(pipeline.panel.identities[1].chain.models().len(), 2);
        assert_eq!(
            pipeline.synthesis_chain.models(),
            &[Model::ClaudeSonnet45, Model::Gpt5]
        );
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert_eq!(config.panel.identities.len(), 4);
        assert_eq!(config.panel.identities[0].name, "forecaster1");
        assert_eq!(config.provider.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.retry.max_attempts, 1);
        assert!(config.pipeline_config().is_ok());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[limits]\nmax_questions = 2\n").unwrap();
        assert_eq!(config.limits.max_questions, 2);
        // Everything else keeps its defaults
        assert_eq!(config.limits.max_model_calls, 5);
        assert_eq!(config.panel.identities.len(), 4);
    }

    #[test]
    fn test_empty_chain_rejected() {
        let toml_str = r#"
[panel]
identities = [{ name = "hollow", chain = [] }]
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.pipeline_config(),
            Err(ConfigError::EmptyChain { .. })
        ));
    }

    #[test]
    fn test_retry_policy_floor() {
        let config: FileConfig = toml::from_str("[retry]\nmax_attempts = 0\n").unwrap();
        assert_eq!(config.retry_policy().max_attempts, 1);
    }
}
