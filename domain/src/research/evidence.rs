//! Evidence records gathered by the research stage
//!
//! Records are created by the search executor, scored once by the
//! relevance rater, and never mutated afterwards. Deduplication keys on
//! the url when present, otherwise on the lower-cased title.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One piece of evidence retrieved from a search source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Headline or page title
    pub title: String,
    /// Snippet or abstract text
    pub summary: String,
    /// Which source produced this record
    pub source: String,
    /// Link to the underlying document, when the source provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Publish date as reported by the source (ISO 8601 when available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// The query that retrieved this record
    pub query: String,
    /// Relevance score on the 1-6 scale, unset until rated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u8>,
}

impl EvidenceRecord {
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        source: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            source: source.into(),
            url: None,
            published: None,
            query: query.into(),
            relevance: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = Some(published.into());
        self
    }

    /// Set the relevance score, clamped to the 1-6 scale
    pub fn rate(&mut self, score: u8) {
        self.relevance = Some(score.clamp(1, 6));
    }

    /// Deduplication key: url when present, else lower-cased title
    fn dedup_key(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => self.title.to_lowercase(),
        }
    }
}

/// Merge records, dropping duplicates while preserving first-seen order.
///
/// Idempotent: applying it to an already-deduplicated list is a no-op.
pub fn dedup_records(records: Vec<EvidenceRecord>) -> Vec<EvidenceRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect()
}

/// Synthesize placeholder "topic" records from the queries themselves.
///
/// Degraded-mode policy: when every source returned nothing, downstream
/// stages still receive a non-empty, well-typed list.
pub fn placeholder_records(queries: &[String]) -> Vec<EvidenceRecord> {
    queries
        .iter()
        .map(|q| {
            EvidenceRecord::new(
                format!("Topic: {}", q),
                format!(
                    "No search results were retrieved for '{}'. \
                     Treat this topic as unresearched background.",
                    q
                ),
                "placeholder",
                q.clone(),
            )
        })
        .collect()
}

/// Sort records by relevance, highest first. Stable: ties keep their
/// original order. Unrated records sort as neutral (3).
pub fn sort_by_relevance(records: &mut [EvidenceRecord]) {
    records.sort_by_key(|r| std::cmp::Reverse(r.relevance.unwrap_or(3)));
}
