//! Search provider port
//!
//! One implementation per evidence source. A source that failed to
//! initialize (e.g., missing credential) stays constructed but reports
//! `is_enabled() == false`, so the executor can skip it without per-call
//! overhead.

use async_trait::async_trait;
use foresight_domain::EvidenceRecord;
use thiserror::Error;

/// Failure of a single search call
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    #[error("request to {provider} failed: {message}")]
    Request { provider: String, message: String },

    #[error("unexpected response from {provider}: {message}")]
    Malformed { provider: String, message: String },
}

/// Port for one evidence source
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable source name, stamped on every record it produces
    fn name(&self) -> &str;

    /// Whether this source initialized successfully
    fn is_enabled(&self) -> bool {
        true
    }

    /// Run one query, returning normalized evidence records
    async fn search(&self, query: &str) -> Result<Vec<EvidenceRecord>, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_name_the_provider() {
        let request = SearchError::Request {
            provider: "newsapi".to_string(),
            message: "429 Too Many Requests".to_string(),
        };
        assert_eq!(
            request.to_string(),
            "request to newsapi failed: 429 Too Many Requests"
        );

        let malformed = SearchError::Malformed {
            provider: "wikipedia".to_string(),
            message: "missing query.search".to_string(),
        };
        assert!(malformed.to_string().contains("wikipedia"));
        assert!(std::error::Error::source(&malformed).is_none());
    }
}
