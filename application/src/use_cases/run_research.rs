//! Research use case: search, rate, summarize
//!
//! Fans each query out to every enabled source concurrently, merges and
//! deduplicates the results, rates each record's relevance through the
//! utility chain, and condenses the best-rated evidence into a bounded
//! brief. The stage is designed to never fail and never return an empty
//! brief: exhausted sources fall back to placeholder records, and a
//! failed summarization call falls back to naive concatenation.

use crate::config::ResearchConfig;
use crate::fallback::FallbackChain;
use crate::ports::model_invoker::ModelInvoker;
use crate::ports::search_provider::SearchProvider;
use foresight_domain::{
    EvidenceRecord, PromptTemplate, Question, dedup_records, extract_relevance_score,
    placeholder_records, sort_by_relevance,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Output of the research stage
#[derive(Debug, Clone)]
pub struct ResearchBrief {
    /// The condensed brief handed to every forecaster
    pub brief: String,
    /// All deduplicated records, rated and sorted by relevance
    pub records: Vec<EvidenceRecord>,
    /// The queries that were executed
    pub queries: Vec<String>,
}

/// Use case for turning queries into a research brief
pub struct RunResearch {
    invoker: Arc<dyn ModelInvoker>,
    chain: FallbackChain,
    sources: Vec<Arc<dyn SearchProvider>>,
    config: ResearchConfig,
}

impl RunResearch {
    pub fn new(
        invoker: Arc<dyn ModelInvoker>,
        chain: FallbackChain,
        sources: Vec<Arc<dyn SearchProvider>>,
        config: ResearchConfig,
    ) -> Self {
        Self {
            invoker,
            chain,
            sources,
            config,
        }
    }

    pub async fn execute(&self, question: &Question, queries: Vec<String>) -> ResearchBrief {
        let mut records = self.search_all(&queries).await;
        if records.is_empty() {
            warn!("every source returned nothing; using placeholder records");
            records = placeholder_records(&queries);
        }
        info!(records = records.len(), "gathered evidence");

        self.rate_all(question, &mut records).await;
        sort_by_relevance(&mut records);

        let brief = self.summarize(question, &records).await;
        ResearchBrief {
            brief,
            records,
            queries,
        }
    }

    /// Run every (query, enabled source) pair concurrently and merge.
    ///
    /// Results are reassembled in (query, source) order before
    /// deduplication so the surviving record for a duplicate is
    /// deterministic.
    async fn search_all(&self, queries: &[String]) -> Vec<EvidenceRecord> {
        let mut join_set = JoinSet::new();
        let mut branch = 0usize;
        for query in queries.iter().take(self.config.max_queries) {
            for source in &self.sources {
                if !source.is_enabled() {
                    debug!(source = source.name(), "source disabled; skipping");
                    continue;
                }
                let source = Arc::clone(source);
                let query = query.clone();
                let index = branch;
                branch += 1;
                join_set.spawn(async move {
                    let records = match source.search(&query).await {
                        Ok(records) => records,
                        Err(e) => {
                            warn!(
                                source = source.name(),
                                query = %query,
                                error = %e,
                                "search branch failed; contributing zero records"
                            );
                            Vec::new()
                        }
                    };
                    (index, records)
                });
            }
        }

        let mut per_branch: Vec<Vec<EvidenceRecord>> = vec![Vec::new(); branch];
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((index, records)) => per_branch[index] = records,
                Err(e) => warn!("task join error: {}", e),
            }
        }
        dedup_records(per_branch.into_iter().flatten().collect())
    }

    /// Rate every record's relevance concurrently through the utility
    /// chain. A failed rating call leaves the record at the neutral 3.
    /// The shared model-call gate bounds how many calls are in flight.
    async fn rate_all(&self, question: &Question, records: &mut [EvidenceRecord]) {
        let mut join_set = JoinSet::new();
        for (index, record) in records.iter().enumerate() {
            let invoker = Arc::clone(&self.invoker);
            let chain = self.chain.clone();
            let prompt = PromptTemplate::relevance_prompt(question, record);
            join_set.spawn(async move {
                let score = match chain.invoke(invoker.as_ref(), &prompt).await {
                    Ok(response) => extract_relevance_score(&response.text),
                    Err(e) => {
                        warn!(error = %e, "relevance rating failed; defaulting to 3");
                        3
                    }
                };
                (index, score)
            });
        }
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((index, score)) => records[index].rate(score),
                Err(e) => warn!("task join error: {}", e),
            }
        }
    }

    /// Condense the best evidence through the utility chain, with the
    /// naive concatenation fallback when summarization fails.
    async fn summarize(&self, question: &Question, records: &[EvidenceRecord]) -> String {
        let relevant: Vec<EvidenceRecord> = records
            .iter()
            .filter(|r| r.relevance.unwrap_or(3) >= self.config.relevance_threshold)
            .take(self.config.summary_top_k)
            .cloned()
            .collect();
        if relevant.is_empty() {
            warn!("no record met the relevance threshold; using naive brief");
            return self.naive_brief(records);
        }

        let prompt =
            PromptTemplate::summary_prompt(question, &relevant, self.config.summary_word_budget);
        match self.chain.invoke(self.invoker.as_ref(), &prompt).await {
            Ok(response) if !response.text.trim().is_empty() => response.text,
            Ok(_) => {
                warn!("summarizer returned empty text; using naive brief");
                self.naive_brief(&relevant)
            }
            Err(e) => {
                warn!(error = %e, "summarization failed; using naive brief");
                self.naive_brief(&relevant)
            }
        }
    }

    /// Concatenate the top records, truncated to the character budget
    fn naive_brief(&self, records: &[EvidenceRecord]) -> String {
        if records.is_empty() {
            return "No research was available for this question.".to_string();
        }
        let mut brief = records
            .iter()
            .take(3)
            .map(|r| format!("{}: {}", r.title, r.summary))
            .collect::<Vec<_>>()
            .join("\n\n");
        if brief.len() > self.config.fallback_char_budget {
            let mut cut = self.config.fallback_char_budget;
            while !brief.is_char_boundary(cut) {
                cut -= 1;
            }
            brief.truncate(cut);
        }
        brief
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedInvoker, StaticSource};
    use foresight_domain::{Model, QuestionKind};

    fn question() -> Question {
        Question::new("q1", "Will inflation fall below 2%?", QuestionKind::Binary).unwrap()
    }

    fn utility_chain() -> FallbackChain {
        FallbackChain::new(vec![Model::Custom("util".to_string())]).unwrap()
    }

    fn record(title: &str, url: Option<&str>) -> EvidenceRecord {
        let mut r = EvidenceRecord::new(title, format!("{} summary", title), "test", "");
        if let Some(u) = url {
            r = r.with_url(u);
        }
        r
    }

    fn research(invoker: Arc<ScriptedInvoker>, sources: Vec<Arc<dyn SearchProvider>>) -> RunResearch {
        RunResearch::new(invoker, utility_chain(), sources, ResearchConfig::default())
    }

    #[tokio::test]
    async fn test_overlapping_sources_deduplicate() {
        // Five sources: two empty, three overlapping on one shared url.
        // One query means 3 producing branches; the shared url survives
        // exactly once.
        let shared = record("Shared story", Some("https://news.example/shared"));
        let sources: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(StaticSource::with_records("s1", vec![])),
            Arc::new(StaticSource::with_records(
                "s2",
                vec![shared.clone(), record("Only s2", Some("https://news.example/s2"))],
            )),
            Arc::new(StaticSource::with_records("s3", vec![shared.clone()])),
            Arc::new(StaticSource::with_records(
                "s4",
                vec![shared, record("Only s4", Some("https://news.example/s4"))],
            )),
            Arc::new(StaticSource::with_records("s5", vec![])),
        ];
        let invoker = Arc::new(ScriptedInvoker::new().respond("5"));
        let brief = research(invoker, sources)
            .execute(&question(), vec!["inflation".to_string()])
            .await;
        assert_eq!(brief.records.len(), 3);
        let shared_count = brief
            .records
            .iter()
            .filter(|r| r.url.as_deref() == Some("https://news.example/shared"))
            .count();
        assert_eq!(shared_count, 1);
    }

    #[tokio::test]
    async fn test_empty_results_become_placeholders() {
        let sources: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(StaticSource::with_records("s1", vec![])),
            Arc::new(StaticSource::failing("s2", "rate limited")),
            Arc::new(StaticSource::disabled("s3")),
        ];
        let invoker = Arc::new(ScriptedInvoker::new().respond("3"));
        let brief = research(invoker, sources)
            .execute(&question(), vec!["cpi report".to_string()])
            .await;
        assert_eq!(brief.records.len(), 1);
        assert_eq!(brief.records[0].source, "placeholder");
        assert!(!brief.brief.is_empty());
    }

    #[tokio::test]
    async fn test_rating_failure_defaults_to_neutral() {
        let sources: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(StaticSource::with_records(
            "s1",
            vec![record("Story", Some("https://a.example/1"))],
        ))];
        let invoker = Arc::new(ScriptedInvoker::new().fail_model("util", "provider down"));
        let brief = research(invoker, sources)
            .execute(&question(), vec!["inflation".to_string()])
            .await;
        assert_eq!(brief.records[0].relevance, Some(3));
        // Neutral 3 is below the threshold, so the brief is the naive one
        assert!(brief.brief.contains("Story"));
    }

    #[tokio::test]
    async fn test_high_relevance_records_are_summarized() {
        let sources: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(StaticSource::with_records(
            "s1",
            vec![record("Key report", Some("https://a.example/1"))],
        ))];
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .respond_when("Rate how relevant", "6")
                .respond_when("research brief", "Condensed brief text."),
        );
        let brief = research(invoker, sources)
            .execute(&question(), vec!["inflation".to_string()])
            .await;
        assert_eq!(brief.records[0].relevance, Some(6));
        assert_eq!(brief.brief, "Condensed brief text.");
    }

    #[tokio::test]
    async fn test_every_record_is_rated_even_in_a_large_batch() {
        // 25 records; only the last one is genuinely relevant. It must
        // still get its own rating call and reach the summarizer.
        let mut records: Vec<EvidenceRecord> = (0..24)
            .map(|i| {
                record(&format!("Filler {}", i), None)
                    .with_url(format!("https://a.example/{}", i))
            })
            .collect();
        records.push(record("Decisive report", Some("https://a.example/decisive")));
        let sources: Vec<Arc<dyn SearchProvider>> =
            vec![Arc::new(StaticSource::with_records("s1", records))];
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .respond_when("research brief", "Condensed brief text.")
                .respond_when("Decisive report", "6")
                .respond("2"),
        );
        let brief = research(invoker, sources)
            .execute(&question(), vec!["inflation".to_string()])
            .await;
        assert!(brief.records.iter().all(|r| r.relevance.is_some()));
        assert_eq!(brief.records[0].title, "Decisive report");
        assert_eq!(brief.records[0].relevance, Some(6));
        assert_eq!(brief.brief, "Condensed brief text.");
    }

    #[tokio::test]
    async fn test_naive_brief_respects_char_budget() {
        let long = "x".repeat(2000);
        let sources: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(StaticSource::with_records(
            "s1",
            vec![EvidenceRecord::new("Long", long, "test", "")
                .with_url("https://a.example/long")],
        ))];
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .respond_when("Rate how relevant", "6")
                .fail_when("research brief", "summarizer down"),
        );
        let brief = research(invoker, sources)
            .execute(&question(), vec!["inflation".to_string()])
            .await;
        assert!(brief.brief.len() <= ResearchConfig::default().fallback_char_budget);
        assert!(brief.brief.starts_with("Long:"));
    }
}
