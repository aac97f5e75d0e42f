//! Error types for the YouTube provider

use bridge_traits::search::SearchError;
use thiserror::Error;

/// YouTube provider errors
#[derive(Error, Debug)]
pub enum YouTubeError {
    /// Daily quota or rate limit exhausted
    #[error("YouTube quota exceeded: {reason}")]
    QuotaExceeded { reason: String },

    /// API request returned a non-success status
    #[error("YouTube API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transport failure before a response arrived
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for YouTube operations
pub type Result<T> = std::result::Result<T, YouTubeError>;

impl From<YouTubeError> for SearchError {
    fn from(error: YouTubeError) -> Self {
        match error {
            YouTubeError::QuotaExceeded { reason } => SearchError::QuotaExceeded(reason),
            other => SearchError::Failed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = YouTubeError::ApiError {
            status_code: 400,
            message: "Bad request".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "YouTube API error (status 400): Bad request"
        );
    }

    #[test]
    fn test_quota_maps_to_quota_category() {
        let search: SearchError = YouTubeError::QuotaExceeded {
            reason: "quotaExceeded".to_string(),
        }
        .into();
        assert!(search.is_quota_exceeded());

        let generic: SearchError = YouTubeError::NetworkError("reset".to_string()).into();
        assert!(!generic.is_quota_exceeded());
        assert!(matches!(generic, SearchError::Failed(_)));
    }
}
