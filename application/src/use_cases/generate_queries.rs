//! Query generation use case
//!
//! Runs the three prompting strategies concurrently, parses their
//! semicolon-delimited output, and merges the results preserving
//! first-seen order across strategies. A strategy whose call fails or
//! whose output cannot be parsed contributes zero queries; the step as a
//! whole never fails.

use crate::config::ResearchConfig;
use crate::fallback::FallbackChain;
use crate::ports::model_invoker::ModelInvoker;
use foresight_domain::{PromptTemplate, QUERY_DELIMITER, Question};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Use case for deriving search queries from a question
pub struct GenerateQueries {
    invoker: Arc<dyn ModelInvoker>,
    chain: FallbackChain,
    config: ResearchConfig,
}

impl GenerateQueries {
    pub fn new(
        invoker: Arc<dyn ModelInvoker>,
        chain: FallbackChain,
        config: ResearchConfig,
    ) -> Self {
        Self {
            invoker,
            chain,
            config,
        }
    }

    pub async fn execute(&self, question: &Question) -> Vec<String> {
        let count = self.config.queries_per_strategy;
        let prompts = [
            PromptTemplate::query_direct(question, count),
            PromptTemplate::query_decompose(question, count),
            PromptTemplate::query_trends(question, count),
        ];

        let mut join_set = JoinSet::new();
        for (strategy, prompt) in prompts.into_iter().enumerate() {
            let invoker = Arc::clone(&self.invoker);
            let chain = self.chain.clone();
            let min_len = self.config.min_query_len;
            join_set.spawn(async move {
                let queries = match chain.invoke(invoker.as_ref(), &prompt).await {
                    Ok(response) => parse_query_list(&response.text, min_len),
                    Err(e) => {
                        warn!(
                            strategy,
                            error = %e,
                            "query strategy failed; contributing zero queries"
                        );
                        Vec::new()
                    }
                };
                (strategy, queries)
            });
        }

        // Reassemble in strategy order so merging is deterministic
        let mut per_strategy: [Vec<String>; 3] = Default::default();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((strategy, queries)) => per_strategy[strategy] = queries,
                Err(e) => warn!("task join error: {}", e),
            }
        }

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for queries in per_strategy {
            for query in queries {
                if merged.len() >= self.config.max_queries {
                    break;
                }
                if seen.insert(query.to_lowercase()) {
                    merged.push(query);
                }
            }
        }

        if merged.is_empty() {
            warn!("no strategy produced queries; falling back to the question title");
            merged.push(question.title.clone());
        }

        info!(count = merged.len(), "generated search queries");
        debug!(queries = ?merged);
        merged
    }
}

/// Parse one strategy's semicolon-delimited output.
///
/// Entries are trimmed of whitespace and quoting; empty or too-short
/// entries are dropped.
pub fn parse_query_list(text: &str, min_len: usize) -> Vec<String> {
    text.split(QUERY_DELIMITER)
        .map(|part| part.trim().trim_matches(['"', '\'', '`']).trim())
        .filter(|part| part.len() >= min_len)
        .map(|part| part.to_string())
        .collect()
}
