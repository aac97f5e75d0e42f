//! Import-time media helpers.
//!
//! Both probes are best-effort: a failed duration probe reports `0.0` and a
//! failed thumbnail reports `None`. They are only used while importing a file
//! and never during steady-state playback.

use async_trait::async_trait;
use bytes::Bytes;

/// A user-supplied media file awaiting import.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Original file name including extension.
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// Duration and thumbnail extraction.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Duration in seconds, `0.0` when it cannot be determined.
    async fn duration_secs(&self, file: &MediaFile) -> f64;

    /// Still frame for video files, `None` otherwise or on failure.
    async fn thumbnail(&self, file: &MediaFile) -> Option<String>;
}
