//! # Local Import
//!
//! Turns user-supplied media into persisted local tracks.
//!
//! ## Sources
//!
//! - **Files** picked by the user: validated by mime type and size, probed
//!   for duration (and a thumbnail when the file is a video).
//! - **URLs** pointing directly at a media file: downloaded through the
//!   host [`HttpClient`] and stored the same way, without a thumbnail.
//!
//! Every accepted import is written to the [`BlobStore`] before it is handed
//! back, so a returned [`TrackMetadata`] always has a blob behind it.

use std::sync::Arc;

use bridge_traits::{
    BlobRecord, BlobStore, Clock, HttpClient, HttpRequest, MediaFile, MediaProbe, RetryPolicy,
};
use bytes::Bytes;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{LibraryError, Result};
use crate::models::{TrackId, TrackMetadata};

/// Artist shown for imported files whose name carries no artist.
pub const DEFAULT_FILE_ARTIST: &str = "Local file";

/// Artist shown for downloaded files whose name carries no artist.
pub const DEFAULT_DOWNLOAD_ARTIST: &str = "Downloaded";

/// Extensions accepted for URL downloads.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "mp4", "m4a", "wav", "ogg", "webm", "aac"];

const FALLBACK_FILE_NAME: &str = "download";

/// Split a file name into `(artist, title)`.
///
/// The extension is dropped first. `"A - B - C"` yields artist `A` and title
/// `B - C`; a name without the `" - "` separator keeps the whole stem as the
/// title and uses `default_artist`.
pub fn parse_display_name(file_name: &str, default_artist: &str) -> (String, String) {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };

    match stem.split_once(" - ") {
        Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
            (artist.trim().to_string(), title.trim().to_string())
        }
        _ => (default_artist.to_string(), stem.trim().to_string()),
    }
}

/// Mime type implied by a file extension (without the dot).
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        _ => "audio/mpeg",
    }
}

fn is_media_mime(mime: &str) -> bool {
    mime.starts_with("audio/") || mime.starts_with("video/")
}

/// Import pipeline over the host bridges.
pub struct LocalImporter {
    store: Arc<dyn BlobStore>,
    probe: Option<Arc<dyn MediaProbe>>,
    http: Option<Arc<dyn HttpClient>>,
    clock: Arc<dyn Clock>,
    max_bytes: u64,
}

impl LocalImporter {
    pub fn new(
        store: Arc<dyn BlobStore>,
        probe: Option<Arc<dyn MediaProbe>>,
        http: Option<Arc<dyn HttpClient>>,
        clock: Arc<dyn Clock>,
        max_bytes: u64,
    ) -> Self {
        Self {
            store,
            probe,
            http,
            clock,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_bytes {
            return Err(LibraryError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Import a file picked by the user.
    #[instrument(skip(self, file), fields(name = %file.name, size = file.size()))]
    pub async fn import_file(&self, file: MediaFile) -> Result<TrackMetadata> {
        if !is_media_mime(&file.mime_type) {
            return Err(LibraryError::UnsupportedMedia(file.mime_type));
        }
        self.check_size(file.size())?;

        let probe = self.probe.as_ref().ok_or_else(|| {
            LibraryError::Unavailable("No media probe configured for file import".to_string())
        })?;

        let duration_secs = probe.duration_secs(&file).await;
        if !(duration_secs.is_finite() && duration_secs > 0.0) {
            return Err(LibraryError::ProbeFailed(format!(
                "Could not determine the duration of {}",
                file.name
            )));
        }

        let thumbnail = if file.is_video() {
            probe.thumbnail(&file).await
        } else {
            None
        };

        let (artist, title) = parse_display_name(&file.name, DEFAULT_FILE_ARTIST);
        let id = TrackId::new(format!("local_{}", Uuid::new_v4().simple()));

        self.persist(id, title, artist, duration_secs, thumbnail, file.mime_type, file.data)
            .await
    }

    /// Download a media file and import it.
    #[instrument(skip(self))]
    pub async fn import_from_url(&self, raw_url: &str) -> Result<TrackMetadata> {
        let http = self.http.as_ref().ok_or_else(|| {
            LibraryError::Unavailable("No HTTP client configured for URL import".to_string())
        })?;

        let url = Url::parse(raw_url.trim()).map_err(|e| LibraryError::InvalidInput {
            field: "url".to_string(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LibraryError::InvalidInput {
                field: "url".to_string(),
                message: format!("Unsupported scheme: {}", url.scheme()),
            });
        }

        let last_segment = url
            .path_segments()
            .and_then(|segments| segments.last())
            .unwrap_or_default()
            .to_string();
        let extension = last_segment
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                LibraryError::UnsupportedMedia(format!(
                    "URL must point to one of: {}",
                    SUPPORTED_EXTENSIONS.join(", ")
                ))
            })?;

        let response = http
            .execute_with_retry(HttpRequest::get(url.as_str()), RetryPolicy::default())
            .await?;
        if !response.is_success() {
            return Err(LibraryError::Download(format!(
                "Server responded with status {}",
                response.status
            )));
        }
        if let Some(declared) = response.content_length() {
            self.check_size(declared)?;
        }
        let size = response.body.len() as u64;
        self.check_size(size)?;

        let mime_type = response
            .content_type()
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_string())
            .filter(|ct| is_media_mime(ct))
            .unwrap_or_else(|| mime_for_extension(&extension).to_string());

        let decoded = urlencoding::decode(&last_segment)
            .map(|name| name.into_owned())
            .unwrap_or_else(|_| last_segment.clone());
        let file_name = if decoded.trim().is_empty() {
            FALLBACK_FILE_NAME.to_string()
        } else {
            decoded
        };

        let file = MediaFile::new(file_name, mime_type, response.body);
        let duration_secs = match &self.probe {
            Some(probe) => probe.duration_secs(&file).await,
            None => 0.0,
        };
        if !(duration_secs.is_finite() && duration_secs > 0.0) {
            return Err(LibraryError::ProbeFailed(format!(
                "Could not determine the duration of {}",
                file.name
            )));
        }

        let (artist, title) = parse_display_name(&file.name, DEFAULT_DOWNLOAD_ARTIST);
        let title = if title.is_empty() {
            FALLBACK_FILE_NAME.to_string()
        } else {
            title
        };
        let id = TrackId::new(format!("url_{}", Uuid::new_v4().simple()));

        self.persist(id, title, artist, duration_secs, None, file.mime_type, file.data)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn persist(
        &self,
        id: TrackId,
        title: String,
        artist: String,
        duration_secs: f64,
        thumbnail: Option<String>,
        mime_type: String,
        data: Bytes,
    ) -> Result<TrackMetadata> {
        let record = BlobRecord {
            id: id.as_str().to_string(),
            title,
            artist,
            duration_secs,
            thumbnail,
            mime_type,
            size: data.len() as u64,
            data,
            added_at: self.clock.now(),
        };

        let track = TrackMetadata::from_blob(&record);
        self.store.put(record).await?;

        info!(track_id = %track.id, title = %track.title, "Imported track");
        Ok(track)
    }

    /// Every persisted local track, oldest import first.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<Vec<TrackMetadata>> {
        let records = self.store.get_all().await?;
        let tracks: Vec<TrackMetadata> = records.iter().map(TrackMetadata::from_blob).collect();
        debug!(count = tracks.len(), "Loaded local tracks");
        Ok(tracks)
    }

    /// Delete the blob behind a local track.
    pub async fn delete(&self, id: &TrackId) -> Result<()> {
        self.store.delete(id.as_str()).await.map_err(|e| {
            warn!(track_id = %id, error = %e, "Failed to delete blob");
            LibraryError::from(e)
        })
    }
}
