//! Playback backend bridges.
//!
//! The core drives two kinds of host media backends:
//!
//! - an [`EmbeddedPlayer`]: the video platform's embeddable player, addressed
//!   by stream id, which resolves and buffers the stream itself;
//! - a [`MediaElementFactory`]: turns a locally stored blob into a
//!   [`MediaElement`], a playable element bound to a revocable handle (an
//!   object URL in a browser, a temp file or memory mapping elsewhere).
//!
//! Neither backend pushes continuous position updates, so both expose a
//! pollable [`MediaStatus`] snapshot through [`MediaTransport::status`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::storage::BlobRecord;

/// Coarse lifecycle state reported by a media backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    /// Nothing loaded or not yet started.
    Idle,
    /// Waiting for data.
    Buffering,
    Playing,
    Paused,
    /// Reached the end of the media.
    Ended,
}

/// Point-in-time snapshot of a backend's transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaStatus {
    pub state: MediaState,
    /// Current playback position.
    pub position: Duration,
    /// Duration as resolved by the backend, once known.
    pub duration: Option<Duration>,
}

impl MediaStatus {
    pub fn idle() -> Self {
        Self {
            state: MediaState::Idle,
            position: Duration::ZERO,
            duration: None,
        }
    }
}

/// Transport controls shared by every media backend.
///
/// Calls are expected to be cheap and non-blocking; they only forward a
/// command to the host media primitive.
pub trait MediaTransport: Send + Sync {
    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    /// Move the playhead to an absolute position.
    fn seek_to(&self, position: Duration) -> Result<()>;

    /// Volume on a 0-100 scale.
    fn set_volume(&self, volume: u8) -> Result<()>;

    fn status(&self) -> MediaStatus;
}

/// Embeddable third-party stream player.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::playback::EmbeddedPlayer;
///
/// async fn start(player: &dyn EmbeddedPlayer, id: &str) -> Result<()> {
///     player.load(id).await?;
///     player.set_volume(80)?;
///     player.play()
/// }
/// ```
#[async_trait]
pub trait EmbeddedPlayer: MediaTransport {
    /// Load `stream_id` and resolve once the player reports ready.
    ///
    /// May take unbounded time (network). Fails when the stream id cannot be
    /// resolved.
    async fn load(&self, stream_id: &str) -> Result<()>;

    /// Stop playback and unload the current stream. Idempotent.
    fn stop(&self) -> Result<()>;
}

/// A playable element bound to a revocable handle over a local blob.
pub trait MediaElement: MediaTransport {
    /// Identifier of the underlying handle (object URL, temp path, ...).
    fn handle(&self) -> &str;

    /// Stop output and release the handle. Idempotent.
    fn revoke(&self);
}

/// Creates [`MediaElement`]s from stored blobs.
#[async_trait]
pub trait MediaElementFactory: Send + Sync {
    /// Create a handle for `record` and resolve once enough data is loaded to
    /// start playback. Implementations release the handle themselves when
    /// they fail after creating it.
    async fn open(&self, record: BlobRecord) -> Result<Arc<dyn MediaElement>>;
}
