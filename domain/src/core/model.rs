//! Model value object representing an LLM model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Available LLM models (Value Object)
///
/// A model is one entry in a fallback chain. Identifiers follow the
/// `provider/model` convention of OpenRouter-style gateways so that a
/// single invoker endpoint can route them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    // OpenAI models
    Gpt5,
    Gpt5Mini,
    Gpt41,
    O3,
    // Anthropic models
    ClaudeSonnet45,
    ClaudeHaiku45,
    ClaudeOpus41,
    // Google models
    Gemini25Pro,
    Gemini25Flash,
    // DeepSeek models
    DeepseekR1,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt5 => "openai/gpt-5",
            Model::Gpt5Mini => "openai/gpt-5-mini",
            Model::Gpt41 => "openai/gpt-4.1",
            Model::O3 => "openai/o3",
            Model::ClaudeSonnet45 => "anthropic/claude-sonnet-4.5",
            Model::ClaudeHaiku45 => "anthropic/claude-haiku-4.5",
            Model::ClaudeOpus41 => "anthropic/claude-opus-4.1",
            Model::Gemini25Pro => "google/gemini-2.5-pro",
            Model::Gemini25Flash => "google/gemini-2.5-flash",
            Model::DeepseekR1 => "deepseek/deepseek-r1",
            Model::Custom(s) => s,
        }
    }

    /// Default fallback chain for a forecaster identity
    pub fn default_chain() -> Vec<Model> {
        vec![Model::Gpt5, Model::ClaudeSonnet45, Model::Gemini25Pro]
    }

    /// Default chain for cheap utility calls (query generation, relevance
    /// rating, summarization, structured extraction)
    pub fn default_utility_chain() -> Vec<Model> {
        vec![Model::Gpt5Mini, Model::ClaudeHaiku45, Model::Gemini25Flash]
    }

    /// Check if this is an OpenAI model
    pub fn is_openai(&self) -> bool {
        matches!(
            self,
            Model::Gpt5 | Model::Gpt5Mini | Model::Gpt41 | Model::O3
        )
    }

    /// Check if this is an Anthropic model
    pub fn is_anthropic(&self) -> bool {
        matches!(
            self,
            Model::ClaudeSonnet45 | Model::ClaudeHaiku45 | Model::ClaudeOpus41
        )
    }

    /// Provider prefix of the identifier (e.g., "openai")
    pub fn provider(&self) -> &str {
        self.as_str().split('/').next().unwrap_or("unknown")
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Gpt5
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "openai/gpt-5" => Model::Gpt5,
            "openai/gpt-5-mini" => Model::Gpt5Mini,
            "openai/gpt-4.1" => Model::Gpt41,
            "openai/o3" => Model::O3,
            "anthropic/claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "anthropic/claude-haiku-4.5" => Model::ClaudeHaiku45,
            "anthropic/claude-opus-4.1" => Model::ClaudeOpus41,
            "google/gemini-2.5-pro" => Model::Gemini25Pro,
            "google/gemini-2.5-flash" => Model::Gemini25Flash,
            "deepseek/deepseek-r1" => Model::DeepseekR1,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or(Model::Custom(s)))
    }
}
