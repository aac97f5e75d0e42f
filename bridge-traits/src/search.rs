//! Remote catalogue search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single search result as returned by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Platform stream id.
    pub id: String,
    pub title: String,
    /// Channel or uploader name, used as the display artist.
    pub channel: String,
    pub thumbnail: Option<String>,
    /// Duration in seconds, 0 when the platform did not report one.
    pub duration_secs: f64,
}

/// Search failures.
///
/// Only the quota category is distinguished; everything else is a generic
/// failure carrying a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Search failed: {0}")]
    Failed(String),
}

impl SearchError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, SearchError::QuotaExceeded(_))
    }
}

/// Remote search provider.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search the catalogue. A blank query may return an empty list without
    /// contacting the platform.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}
