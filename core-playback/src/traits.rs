//! # Core Playback Traits
//!
//! Abstractions the engine uses to drive its two media backends.
//!
//! ## Sessions
//!
//! Every selection opens a [`Session`]. Its [`SessionToken`] travels with
//! every callback an adapter produces, and its cancellation token is the
//! hard stop signal for whatever the adapter started on its behalf. The
//! engine only folds in events whose token matches the live session.
//!
//! ## Callbacks
//!
//! Adapters never call back into the engine directly. They publish
//! [`AdapterEvent`]s on an unbounded channel that the owner of the engine
//! drains, so no adapter lock is ever held while engine state changes.

use crate::error::Result;
use async_trait::async_trait;
use core_library::{SourceKind, TrackId, TrackMetadata};
use std::fmt;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

// ============================================================================
// Sessions
// ============================================================================

/// Identity of one selection. Later selections have larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A playback session: the token, the track it was opened for and the
/// cancellation signal shared with everything started on its behalf.
#[derive(Debug, Clone)]
pub struct Session {
    token: SessionToken,
    track_id: TrackId,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(token: SessionToken, track_id: TrackId) -> Self {
        Self {
            token,
            track_id,
            cancel: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    /// Cancel the session. Clones observe it too.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the session is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Build an event tagged with this session.
    pub fn event(&self, kind: AdapterEventKind) -> AdapterEvent {
        AdapterEvent {
            session: self.token,
            kind,
        }
    }
}

// ============================================================================
// Adapter callbacks
// ============================================================================

/// What an adapter observed.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEventKind {
    /// Position as a percentage of the resolved duration.
    Progress(f64),
    Buffering(bool),
    PlayingChanged(bool),
    Ended,
    /// The backend failed after it was attached.
    Failed(String),
}

/// A callback from an adapter, tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterEvent {
    pub session: SessionToken,
    pub kind: AdapterEventKind,
}

// ============================================================================
// Playable
// ============================================================================

/// Result of a successful attach.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attached {
    /// Duration reported by the backend, when it resolved one.
    pub duration_secs: Option<f64>,
}

/// Capability set shared by the remote-stream and local-blob backends.
///
/// Transport commands are synchronous and only forward to the host media
/// primitive. `attach` may take unbounded time and must give up with
/// [`PlaybackError::Cancelled`](crate::PlaybackError::Cancelled) once the
/// session is cancelled.
#[async_trait]
pub trait Playable: Send + Sync {
    /// The source kind this adapter serves.
    fn kind(&self) -> SourceKind;

    /// Resolve `track` and prepare it for output without starting it.
    async fn attach(&self, track: &TrackMetadata, session: Session) -> Result<Attached>;

    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    /// Seek to a percentage of the resolved duration.
    fn seek(&self, percentage: f64) -> Result<()>;

    /// Volume on a 0-100 scale.
    fn set_volume(&self, volume: u8) -> Result<()>;

    /// Stop output and release every exclusive resource. Idempotent.
    fn detach(&self);

    /// Whether a session is currently attached.
    fn is_attached(&self) -> bool;
}
