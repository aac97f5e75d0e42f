//! YouTube Data API response types
//!
//! Data structures for deserializing YouTube Data API v3 responses, plus the
//! duration parser for `contentDetails.duration`.

use serde::Deserialize;

/// `search.list` response
///
/// See: https://developers.google.com/youtube/v3/docs/search/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub id: SearchItemId,
    pub snippet: Snippet,
}

/// Search results are typed; only video results carry `videoId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

impl Thumbnails {
    /// `high`, then `medium`.
    pub fn best_url(&self) -> Option<String> {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .map(|thumb| thumb.url.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// `videos.list` response
///
/// See: https://developers.google.com/youtube/v3/docs/videos/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
pub struct ContentDetails {
    /// ISO-8601 duration, e.g. `PT4M13S`
    pub duration: String,
}

/// Error envelope returned with 4xx/5xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub reason: String,
}

impl ApiErrorBody {
    /// First reason that marks quota exhaustion, if any.
    pub fn quota_reason(&self) -> Option<&str> {
        self.errors
            .iter()
            .map(|detail| detail.reason.as_str())
            .find(|reason| matches!(*reason, "quotaExceeded" | "dailyLimitExceeded"))
    }
}

/// Parse an ISO-8601 video duration (`PT#H#M#S`) into seconds.
///
/// Missing components count as zero. Anything that does not start with `PT`
/// or carries an unknown designator yields 0.
pub fn parse_iso8601_duration(value: &str) -> f64 {
    let Some(rest) = value.strip_prefix("PT") else {
        return 0.0;
    };

    let mut total: u64 = 0;
    let mut digits = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let amount: u64 = match digits.parse() {
            Ok(amount) => amount,
            Err(_) => return 0.0,
        };
        digits.clear();

        let unit = match ch {
            'H' => 3600,
            'M' => 60,
            'S' => 1,
            _ => return 0.0,
        };
        total = total.saturating_add(amount.saturating_mul(unit));
    }

    if !digits.is_empty() {
        return 0.0;
    }

    total as f64
}
