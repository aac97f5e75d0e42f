use bridge_traits::search::SearchError;
use core_library::LibraryError;
use core_playback::PlaybackError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Feature disabled: {0}")]
    FeatureDisabled(String),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

/// Coarse classification the UI uses to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMessageCategory {
    /// Search quota exhausted; retrying now will not help.
    QuotaExceeded,
    /// The source could not be reached or loaded; retrying may help.
    SourceUnavailable,
    /// What the user picked or typed was rejected.
    InvalidInput,
    Storage,
    Configuration,
    Internal,
}

impl CoreError {
    pub fn user_message_category(&self) -> UserMessageCategory {
        match self {
            CoreError::InitializationFailed(_)
            | CoreError::CapabilityMissing { .. }
            | CoreError::FeatureDisabled(_) => UserMessageCategory::Configuration,
            CoreError::Search(e) if e.is_quota_exceeded() => UserMessageCategory::QuotaExceeded,
            CoreError::Search(_) => UserMessageCategory::SourceUnavailable,
            CoreError::Library(e) if e.is_user_error() => UserMessageCategory::InvalidInput,
            CoreError::Library(LibraryError::Download(_)) => UserMessageCategory::SourceUnavailable,
            CoreError::Library(LibraryError::Unavailable(_)) => UserMessageCategory::Configuration,
            CoreError::Library(_) => UserMessageCategory::Storage,
            CoreError::Playback(PlaybackError::InvalidSettings(_)) => {
                UserMessageCategory::InvalidInput
            }
            CoreError::Playback(PlaybackError::TrackNotFound(_))
            | CoreError::Playback(PlaybackError::Library(_)) => UserMessageCategory::Storage,
            CoreError::Playback(e) if e.is_transient() => UserMessageCategory::SourceUnavailable,
            CoreError::Playback(_) => UserMessageCategory::Internal,
        }
    }
}

impl From<core_runtime::Error> for CoreError {
    fn from(error: core_runtime::Error) -> Self {
        match error {
            core_runtime::Error::CapabilityMissing {
                capability,
                message,
            } => CoreError::CapabilityMissing {
                capability,
                message,
            },
            other => CoreError::InitializationFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_has_its_own_category() {
        let quota = CoreError::from(SearchError::QuotaExceeded("daily".into()));
        let generic = CoreError::from(SearchError::Failed("timeout".into()));
        assert_eq!(quota.user_message_category(), UserMessageCategory::QuotaExceeded);
        assert_eq!(
            generic.user_message_category(),
            UserMessageCategory::SourceUnavailable
        );
    }

    #[test]
    fn test_import_rejections_are_user_errors() {
        let too_large = CoreError::from(LibraryError::TooLarge {
            size: 600,
            limit: 500,
        });
        assert_eq!(too_large.user_message_category(), UserMessageCategory::InvalidInput);

        let storage = CoreError::from(LibraryError::Bridge(
            bridge_traits::BridgeError::Storage("disk full".into()),
        ));
        assert_eq!(storage.user_message_category(), UserMessageCategory::Storage);
    }

    #[test]
    fn test_runtime_capability_error_is_preserved() {
        let err = CoreError::from(core_runtime::Error::CapabilityMissing {
            capability: "BlobStore".into(),
            message: "required".into(),
        });
        assert!(matches!(err, CoreError::CapabilityMissing { ref capability, .. } if capability == "BlobStore"));
        assert_eq!(err.user_message_category(), UserMessageCategory::Configuration);
    }
}
