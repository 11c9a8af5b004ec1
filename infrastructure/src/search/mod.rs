//! Evidence-source adapters
//!
//! One module per source, each implementing the application layer's
//! [`SearchProvider`](foresight_application::SearchProvider) port. Sources
//! normalize their responses into [`EvidenceRecord`]s; they never rate
//! relevance themselves.
//!
//! [`EvidenceRecord`]: foresight_domain::EvidenceRecord

pub mod duckduckgo;
pub mod newsapi;
pub mod wikipedia;

pub use duckduckgo::DuckDuckGoSource;
pub use newsapi::NewsApiSource;
pub use wikipedia::WikipediaSource;
