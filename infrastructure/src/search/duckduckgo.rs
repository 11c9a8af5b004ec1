//! DuckDuckGo Instant Answer source
//!
//! Requires no API key. The instant-answer API returns abstracts and
//! related topics rather than full result listings; both are normalized
//! into evidence records. A query with no instant answer yields an empty
//! list, which is a valid outcome, not an error.

use async_trait::async_trait;
use foresight_application::{SearchError, SearchProvider};
use foresight_domain::EvidenceRecord;
use tracing::debug;

const DDG_API_URL: &str = "https://api.duckduckgo.com/";
const SOURCE_NAME: &str = "duckduckgo";

/// Maximum related topics taken per query
const MAX_TOPICS: usize = 10;

pub struct DuckDuckGoSource {
    client: reqwest::Client,
    api_url: String,
}

impl DuckDuckGoSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            api_url: DDG_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn search(&self, query: &str) -> Result<Vec<EvidenceRecord>, SearchError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .header("User-Agent", "foresight/0.3 (research pipeline)")
            .send()
            .await
            .map_err(|e| SearchError::Request {
                provider: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SearchError::Request {
                provider: SOURCE_NAME.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let body: serde_json::Value =
            response.json().await.map_err(|e| SearchError::Malformed {
                provider: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;

        let records = parse_instant_answer(query, &body);
        debug!(query = %query, records = records.len(), "duckduckgo answered");
        Ok(records)
    }
}

/// Normalize an instant-answer payload: the abstract first, then related
/// topics. Nested topic groups are skipped.
fn parse_instant_answer(query: &str, data: &serde_json::Value) -> Vec<EvidenceRecord> {
    let mut records = Vec::new();

    if let Some(abstract_text) = data["AbstractText"].as_str()
        && !abstract_text.is_empty()
    {
        let heading = data["Heading"].as_str().unwrap_or(query);
        let mut record = EvidenceRecord::new(heading, abstract_text, SOURCE_NAME, query);
        if let Some(url) = data["AbstractURL"].as_str()
            && !url.is_empty()
        {
            record = record.with_url(url);
        }
        records.push(record);
    }

    if let Some(topics) = data["RelatedTopics"].as_array() {
        for topic in topics {
            let Some(text) = topic["Text"].as_str() else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            // The part before the first " - " is the topic title
            let (title, summary) = match text.split_once(" - ") {
                Some((title, rest)) => (title, rest),
                None => (text, text),
            };
            let mut record = EvidenceRecord::new(title, summary, SOURCE_NAME, query);
            if let Some(url) = topic["FirstURL"].as_str()
                && !url.is_empty()
            {
                record = record.with_url(url);
            }
            records.push(record);
            if records.len() >= MAX_TOPICS {
                break;
            }
        }
    }

    records
}
