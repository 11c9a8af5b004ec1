//! Pipeline configuration types
//!
//! These are the process-lifetime, read-only values the caller injects
//! into the pipeline entry point. Parsing them from files is the
//! infrastructure layer's job.

use crate::fallback::FallbackChain;

/// One forecaster identity: a named voice bound to a fallback chain
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Identity key (e.g., "forecaster2")
    pub name: String,
    /// The ordered models this identity speaks through
    pub chain: FallbackChain,
}

impl IdentityConfig {
    pub fn new(name: impl Into<String>, chain: FallbackChain) -> Self {
        Self {
            name: name.into(),
            chain,
        }
    }
}

/// Panel composition for the ensemble
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Identities, in the order they appear in reports
    pub identities: Vec<IdentityConfig>,
    /// Independent runs per identity (1-5)
    pub runs_per_identity: usize,
}

impl PanelConfig {
    pub fn new(identities: Vec<IdentityConfig>) -> Self {
        Self {
            identities,
            runs_per_identity: 1,
        }
    }

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs_per_identity = runs.clamp(1, 5);
        self
    }
}

/// Tunables for the research stage
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Queries requested from each generation strategy
    pub queries_per_strategy: usize,
    /// Cap on the final query list
    pub max_queries: usize,
    /// Queries shorter than this are dropped as noise
    pub min_query_len: usize,
    /// Minimum relevance score a record needs to reach the summarizer
    pub relevance_threshold: u8,
    /// How many top records the summarizer sees
    pub summary_top_k: usize,
    /// Word budget the summarizer is instructed to respect
    pub summary_word_budget: usize,
    /// Character budget of the naive concatenation fallback
    pub fallback_char_budget: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            queries_per_strategy: 5,
            max_queries: 6,
            min_query_len: 4,
            relevance_threshold: 4,
            summary_top_k: 12,
            summary_word_budget: 400,
            fallback_char_budget: 1500,
        }
    }
}

/// Everything the pipeline needs beyond its injected adapters
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub panel: PanelConfig,
    pub research: ResearchConfig,
    /// Cheap chain for query generation, relevance rating and summaries
    pub utility_chain: FallbackChain,
    /// Chain for the synthesis step
    pub synthesis_chain: FallbackChain,
}
