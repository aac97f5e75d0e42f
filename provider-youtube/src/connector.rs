//! YouTube Data API connector implementation
//!
//! Implements the `SearchProvider` trait for YouTube Data API v3.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::search::{SearchError, SearchHit, SearchProvider};
use core_runtime::logging::redact_if_sensitive;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, YouTubeError};
use crate::types::{
    parse_iso8601_duration, ApiErrorResponse, SearchListResponse, VideoListResponse,
};

/// YouTube Data API base URL
const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Results per search (API maximum is 50)
const MAX_RESULTS: u32 = 20;

/// Video category "Music"
const MUSIC_CATEGORY_ID: &str = "10";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// YouTube search connector
///
/// # Example
///
/// ```ignore
/// use provider_youtube::YouTubeSearchProvider;
/// use bridge_traits::search::SearchProvider;
///
/// let provider = YouTubeSearchProvider::new(http_client, api_key);
/// let hits = provider.search("lofi beats").await?;
/// ```
pub struct YouTubeSearchProvider {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl YouTubeSearchProvider {
    /// Create a provider against the public API endpoint.
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `api_key` - Data API key with YouTube Data API v3 enabled
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: YOUTUBE_API_BASE.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Point the provider at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?part=snippet&type=video&videoCategoryId={}&maxResults={}&q={}&key={}",
            self.base_url,
            MUSIC_CATEGORY_ID,
            MAX_RESULTS,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        )
    }

    fn videos_url(&self, ids: &[&str]) -> String {
        format!(
            "{}/videos?part=contentDetails&id={}&key={}",
            self.base_url,
            urlencoding::encode(&ids.join(",")),
            urlencoding::encode(&self.api_key)
        )
    }

    /// GET `url` and classify the response.
    ///
    /// 403 with a quota reason and 429 become `QuotaExceeded`; any other
    /// non-success status is an `ApiError` carrying the API's message.
    #[instrument(skip(self, url), fields(url = %redact_if_sensitive("url", &url)))]
    async fn get(&self, url: String) -> Result<HttpResponse> {
        let request = HttpRequest::get(url)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self
            .http_client
            .execute_with_retry(request, self.retry_policy)
            .await
            .map_err(|e| YouTubeError::NetworkError(e.to_string()))?;

        if response.is_success() {
            debug!("API request succeeded: status={}", response.status);
            return Ok(response);
        }

        let status = response.status;
        let api_error = response.json::<ApiErrorResponse>().ok().map(|r| r.error);

        if status == 429 {
            warn!("API request rate limited");
            return Err(YouTubeError::QuotaExceeded {
                reason: "rateLimitExceeded".to_string(),
            });
        }

        if status == 403 {
            if let Some(reason) = api_error.as_ref().and_then(|e| e.quota_reason()) {
                warn!(reason, "API quota exhausted");
                return Err(YouTubeError::QuotaExceeded {
                    reason: reason.to_string(),
                });
            }
        }

        let message = match api_error {
            Some(error) if !error.message.is_empty() => error.message,
            _ => String::from_utf8_lossy(&response.body).to_string(),
        };
        warn!("API request failed: status={}", status);
        Err(YouTubeError::ApiError {
            status_code: status,
            message,
        })
    }

    /// Resolve durations for `ids`. Unknown ids are simply absent.
    async fn fetch_durations(&self, ids: &[&str]) -> Result<HashMap<String, f64>> {
        let response = self.get(self.videos_url(ids)).await?;
        let videos: VideoListResponse = response
            .json()
            .map_err(|e| YouTubeError::ParseError(e.to_string()))?;

        Ok(videos
            .items
            .into_iter()
            .map(|video| {
                let secs = parse_iso8601_duration(&video.content_details.duration);
                (video.id, secs)
            })
            .collect())
    }

    async fn run_search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response = self.get(self.search_url(query)).await?;
        let listing: SearchListResponse = response
            .json()
            .map_err(|e| YouTubeError::ParseError(e.to_string()))?;

        // Channel and playlist results have no video id.
        let items: Vec<_> = listing
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id.map(|id| (id, item.snippet)))
            .collect();

        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = items.iter().map(|(id, _)| id.as_str()).collect();
        let durations = self.fetch_durations(&ids).await?;

        Ok(items
            .into_iter()
            .map(|(id, snippet)| SearchHit {
                duration_secs: durations.get(&id).copied().unwrap_or(0.0),
                thumbnail: snippet.thumbnails.best_url(),
                title: snippet.title,
                channel: snippet.channel_title,
                id,
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for YouTubeSearchProvider {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> std::result::Result<Vec<SearchHit>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        info!("Searching YouTube");
        let hits = self.run_search(query).await?;
        info!(results = hits.len(), "YouTube search completed");
        Ok(hits)
    }
}
