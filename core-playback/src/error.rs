//! # Playback Error Types
//!
//! Error types for the playback engine, its backend adapters and the cache
//! manager.

use bridge_traits::error::BridgeError;
use core_library::error::LibraryError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Track has no blob in the local store.
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// The backend could not resolve or load the media.
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The session was superseded by a newer selection before it was ready.
    #[error("Playback session cancelled")]
    Cancelled,

    /// The live session failed and nothing is attached; select the track
    /// again to resume.
    #[error("Playback session failed; the track must be reattached")]
    SessionFailed,

    /// Another backend still holds the output device.
    #[error("Output device is held by the {holder} backend")]
    OutputBusy { holder: String },

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,

    /// A backend rejected a transport command.
    #[error("Playback operation failed: {0}")]
    PlaybackFailed(String),

    // ========================================================================
    // Cache Errors
    // ========================================================================
    #[error("Invalid cache settings: {0}")]
    InvalidSettings(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if selecting the track again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::SourceUnavailable(_)
                | PlaybackError::OutputBusy { .. }
                | PlaybackError::SessionFailed
                | PlaybackError::PlaybackFailed(_)
                | PlaybackError::Bridge(_)
        )
    }

    /// Returns `true` for the benign outcome of a superseded selection.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PlaybackError::Cancelled)
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(PlaybackError::SourceUnavailable("offline".into()).is_transient());
        assert!(PlaybackError::Bridge(BridgeError::Media("stalled".into())).is_transient());
        assert!(!PlaybackError::TrackNotFound("local_1".into()).is_transient());
        assert!(!PlaybackError::Cancelled.is_transient());
        assert!(PlaybackError::Cancelled.is_cancelled());
    }
}
