//! NewsAPI source
//!
//! Keyed source for recent news coverage. A missing key does not fail
//! construction: the source stays disabled and the search executor skips
//! it, so the pipeline degrades to the keyless sources.

use async_trait::async_trait;
use foresight_application::{SearchError, SearchProvider};
use foresight_domain::EvidenceRecord;
use serde::Deserialize;
use tracing::{debug, info};

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";
const SOURCE_NAME: &str = "newsapi";

/// Articles requested per query
const PAGE_SIZE: u32 = 10;

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

pub struct NewsApiSource {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl NewsApiSource {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            info!("newsapi key not configured; source disabled");
        }
        Self {
            client,
            api_url: NEWSAPI_URL.to_string(),
            api_key,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl SearchProvider for NewsApiSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &str) -> Result<Vec<EvidenceRecord>, SearchError> {
        let Some(api_key) = &self.api_key else {
            return Ok(vec![]);
        };

        let page_size = PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .header("X-Api-Key", api_key)
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

        let parsed: NewsResponse =
            response.json().await.map_err(|e| SearchError::Malformed {
                provider: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;

        let records: Vec<EvidenceRecord> = parsed
            .articles
            .into_iter()
            .filter_map(|article| {
                let title = article.title?;
                let mut record = EvidenceRecord::new(
                    title,
                    article.description.unwrap_or_default(),
                    SOURCE_NAME,
                    query,
                );
                if let Some(url) = article.url {
                    record = record.with_url(url);
                }
                if let Some(published) = article.published_at {
                    record = record.with_published(published);
                }
                Some(record)
            })
            .collect();
        debug!(query = %query, records = records.len(), "newsapi answered");
        Ok(records)
    }
}
