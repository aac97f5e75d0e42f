//! Domain models for the track library
//!
//! One record type covers both remote streams and imported files; the
//! [`SourceKind`] tag decides which playback backend resolves it.

use bridge_traits::{BlobRecord, SearchHit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ID Types
// =============================================================================

/// Globally unique track identifier.
///
/// For remote tracks this is the platform stream id; imported files use a
/// generated `local_…` or `url_…` id that keys their blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for TrackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Source kind
// =============================================================================

/// Where a track's media comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Streamed through the embedded platform player.
    Remote,
    /// Stored in the local blob store.
    Local,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Remote => "remote",
            SourceKind::Local => "local",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Track metadata
// =============================================================================

/// Metadata for a single playable track.
///
/// The offline flag is derived from `cached_at`, so "cached" and "has a
/// cached timestamp" cannot disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    /// Seconds; authoritative once the backend has resolved the media.
    pub duration_secs: f64,
    pub thumbnail: Option<String>,
    pub kind: SourceKind,
    /// Local tracks only.
    pub mime_type: Option<String>,
    /// Local tracks only.
    pub byte_size: Option<u64>,
    cached_at: Option<DateTime<Utc>>,
}

impl TrackMetadata {
    /// A remote stream that is not (yet) available offline.
    pub fn remote(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_secs: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            duration_secs,
            thumbnail: None,
            kind: SourceKind::Remote,
            mime_type: None,
            byte_size: None,
            cached_at: None,
        }
    }

    /// An imported file. Local media is always available offline, so it is
    /// cached from the moment it was added.
    pub fn local(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_secs: f64,
        mime_type: impl Into<String>,
        byte_size: u64,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            duration_secs,
            thumbnail: None,
            kind: SourceKind::Local,
            mime_type: Some(mime_type.into()),
            byte_size: Some(byte_size),
            cached_at: Some(added_at),
        }
    }

    pub fn from_blob(record: &BlobRecord) -> Self {
        Self::local(
            record.id.as_str(),
            record.title.clone(),
            record.artist.clone(),
            record.duration_secs,
            record.mime_type.clone(),
            record.size,
            record.added_at,
        )
        .with_thumbnail(record.thumbnail.clone())
    }

    pub fn from_search_hit(hit: SearchHit) -> Self {
        Self::remote(hit.id, hit.title, hit.channel, hit.duration_secs)
            .with_thumbnail(hit.thumbnail)
    }

    /// Empty thumbnails are treated as absent.
    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail.filter(|t| !t.is_empty());
        self
    }

    pub fn is_local(&self) -> bool {
        self.kind == SourceKind::Local
    }

    pub fn is_cached(&self) -> bool {
        self.cached_at.is_some()
    }

    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.cached_at
    }

    pub fn mark_cached(&mut self, at: DateTime<Utc>) {
        self.cached_at = Some(at);
    }

    pub fn clear_cached(&mut self) {
        self.cached_at = None;
    }

    /// Validate track metadata
    pub fn validate(&self) -> Result<(), String> {
        if self.id.as_str().trim().is_empty() {
            return Err("Track id cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            return Err("Track title cannot be empty".to_string());
        }

        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(format!(
                "Track duration must be a non-negative number, got {}",
                self.duration_secs
            ));
        }

        if self.is_local() && (self.mime_type.is_none() || self.byte_size.is_none()) {
            return Err("Local tracks need a mime type and byte size".to_string());
        }

        Ok(())
    }
}
