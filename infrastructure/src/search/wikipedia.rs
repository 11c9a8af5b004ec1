//! Wikipedia search source
//!
//! Uses the MediaWiki search API, which requires no key. Snippets come
//! back with `<span class="searchmatch">` highlighting; the tags are
//! stripped before the text enters an evidence record.

use async_trait::async_trait;
use foresight_application::{SearchError, SearchProvider};
use foresight_domain::EvidenceRecord;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::debug;

const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const SOURCE_NAME: &str = "wikipedia";

/// Results requested per query
const RESULT_LIMIT: u32 = 5;

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
    snippet: String,
    #[serde(default)]
    timestamp: Option<String>,
}

pub struct WikipediaSource {
    client: reqwest::Client,
    api_url: String,
}

impl WikipediaSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            api_url: WIKIPEDIA_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl SearchProvider for WikipediaSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn search(&self, query: &str) -> Result<Vec<EvidenceRecord>, SearchError> {
        let limit = RESULT_LIMIT.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
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

        let parsed: SearchResponse =
            response.json().await.map_err(|e| SearchError::Malformed {
                provider: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;

        let hits = parsed.query.map(|q| q.search).unwrap_or_default();
        let records: Vec<EvidenceRecord> = hits
            .into_iter()
            .map(|hit| {
                let url = format!(
                    "https://en.wikipedia.org/wiki/{}",
                    hit.title.replace(' ', "_")
                );
                let mut record = EvidenceRecord::new(
                    hit.title,
                    strip_tags(&hit.snippet),
                    SOURCE_NAME,
                    query,
                )
                .with_url(url);
                if let Some(timestamp) = hit.timestamp {
                    record = record.with_published(timestamp);
                }
                record
            })
            .collect();
        debug!(query = %query, records = records.len(), "wikipedia answered");
        Ok(records)
    }
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex"))
}

/// Remove HTML tags and unescape the entities MediaWiki snippets use
fn strip_tags(snippet: &str) -> String {
    tag_re()
        .replace_all(snippet, "")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        let snippet = r#"The <span class="searchmatch">election</span> was held &quot;early&quot;"#;
        assert_eq!(strip_tags(snippet), "The election was held \"early\"");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "query": {
                "search": [
                    {"title": "General election", "snippet": "A <b>vote</b>", "timestamp": "2026-01-15T00:00:00Z"}
                ]
            }
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let hits = parsed.query.unwrap().search;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "General election");
        assert_eq!(hits[0].timestamp.as_deref(), Some("2026-01-15T00:00:00Z"));
    }

    #[test]
    fn test_missing_query_section_parses_as_empty() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"batchcomplete": ""}"#).unwrap();
        assert!(parsed.query.is_none());
    }
}
