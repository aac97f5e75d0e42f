//! Blob Store Implementation using Tokio file I/O
//!
//! Each record is two files under the store root: `<id>.media` holding the
//! raw bytes and `<id>.json` holding the metadata captured at import time.
//! The sidecar is written last, so a record only becomes visible to
//! `get_all` once both files are complete.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{BlobRecord, BlobStore},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const MEDIA_EXTENSION: &str = "media";
const META_EXTENSION: &str = "json";

/// On-disk sidecar describing a stored blob.
#[derive(Debug, Serialize, Deserialize)]
struct BlobMeta {
    id: String,
    title: String,
    artist: String,
    duration_secs: f64,
    #[serde(default)]
    thumbnail: Option<String>,
    mime_type: String,
    size: u64,
    added_at: DateTime<Utc>,
}

impl BlobMeta {
    fn from_record(record: &BlobRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            artist: record.artist.clone(),
            duration_secs: record.duration_secs,
            thumbnail: record.thumbnail.clone(),
            mime_type: record.mime_type.clone(),
            size: record.size,
            added_at: record.added_at,
        }
    }

    fn into_record(self, data: Bytes) -> BlobRecord {
        BlobRecord {
            id: self.id,
            title: self.title,
            artist: self.artist,
            duration_secs: self.duration_secs,
            thumbnail: self.thumbnail,
            mime_type: self.mime_type,
            data,
            size: self.size,
            added_at: self.added_at,
        }
    }
}

/// Filesystem-backed [`BlobStore`].
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (and create if needed) a store rooted at `root`.
    ///
    /// Runs once at startup, so the directory is created synchronously.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(Self::map_io_error)?;
        debug!(path = ?root, "Opened blob store");
        Ok(Self { root })
    }

    /// Open the store under the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_root())
    }

    /// `<data dir>/stream-cache-player/blobs`
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("stream-cache-player")
            .join("blobs")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }

    /// Ids become file names; anything that could escape the root is refused.
    fn validate_id(id: &str) -> Result<()> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(())
        } else {
            Err(BridgeError::Storage(format!("Invalid blob id: {:?}", id)))
        }
    }

    fn media_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.{}", id, MEDIA_EXTENSION))
    }

    fn meta_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.{}", id, META_EXTENSION))
    }

    async fn read_meta(&self, path: &Path) -> Result<Option<BlobMeta>> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::map_io_error(e)),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| BridgeError::Storage(format!("Corrupt blob metadata {:?}: {}", path, e)))
    }

    async fn load(&self, meta: BlobMeta) -> Result<Option<BlobRecord>> {
        match fs::read(self.media_path(&meta.id)).await {
            Ok(data) => Ok(Some(meta.into_record(Bytes::from(data)))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(id = %meta.id, "Blob metadata without media file");
                Ok(None)
            }
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn remove_if_exists(path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, record: BlobRecord) -> Result<()> {
        Self::validate_id(&record.id)?;

        fs::write(self.media_path(&record.id), record.data.as_ref())
            .await
            .map_err(Self::map_io_error)?;

        let meta = serde_json::to_vec_pretty(&BlobMeta::from_record(&record))
            .map_err(|e| BridgeError::Storage(format!("Failed to encode metadata: {}", e)))?;
        fs::write(self.meta_path(&record.id), meta)
            .await
            .map_err(Self::map_io_error)?;

        debug!(id = %record.id, size = record.size, "Stored blob");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<BlobRecord>> {
        Self::validate_id(id)?;
        match self.read_meta(&self.meta_path(id)).await? {
            Some(meta) => self.load(meta).await,
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<Vec<BlobRecord>> {
        let mut records = Vec::new();
        let mut read_dir = fs::read_dir(&self.root)
            .await
            .map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir.next_entry().await.map_err(Self::map_io_error)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(META_EXTENSION) {
                continue;
            }
            if let Some(meta) = self.read_meta(&path).await? {
                if let Some(record) = self.load(meta).await? {
                    records.push(record);
                }
            }
        }

        records.sort_by_key(|record| record.added_at);
        debug!(count = records.len(), "Listed blobs");
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        Self::validate_id(id)?;
        // Sidecar first so a half-deleted record is invisible.
        Self::remove_if_exists(&self.meta_path(id)).await?;
        Self::remove_if_exists(&self.media_path(id)).await?;
        debug!(id = %id, "Deleted blob");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        for record in self.get_all().await? {
            self.delete(&record.id).await?;
        }
        Ok(())
    }

    async fn total_size(&self) -> Result<u64> {
        let mut total = 0u64;
        let mut read_dir = fs::read_dir(&self.root)
            .await
            .map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir.next_entry().await.map_err(Self::map_io_error)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(META_EXTENSION) {
                if let Some(meta) = self.read_meta(&path).await? {
                    total += meta.size;
                }
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn record(id: &str, added_at: DateTime<Utc>) -> BlobRecord {
        let data = Bytes::from(vec![7u8; 32]);
        BlobRecord {
            id: id.to_string(),
            title: "Title".to_string(),
            artist: "Artist".to_string(),
            duration_secs: 12.5,
            thumbnail: None,
            mime_type: "audio/mpeg".to_string(),
            size: data.len() as u64,
            data,
            added_at,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();

        let rec = record("local_abc", Utc::now());
        store.put(rec.clone()).await.unwrap();

        let loaded = store.get("local_abc").await.unwrap().unwrap();
        assert_eq!(loaded, rec);
        assert!(store.get("local_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_all_sorted_by_added_at() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let now = Utc::now();

        store.put(record("local_b", now)).await.unwrap();
        store
            .put(record("local_a", now - Duration::minutes(5)))
            .await
            .unwrap();

        let ids: Vec<_> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["local_a", "local_b"]);
        assert_eq!(store.total_size().await.unwrap(), 64);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();

        store.put(record("url_1", Utc::now())).await.unwrap();
        store.delete("url_1").await.unwrap();
        store.delete("url_1").await.unwrap();

        assert!(store.get("url_1").await.unwrap().is_none());
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();

        let err = store.put(record("../escape", Utc::now())).await.unwrap_err();
        assert!(matches!(err, BridgeError::Storage(_)));
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        store.put(record("local_1", Utc::now())).await.unwrap();
        store.put(record("local_2", Utc::now())).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
