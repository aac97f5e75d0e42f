//! Local Blob Storage Abstraction
//!
//! Imported media files live in a durable key-value store keyed by track id.
//! Browsers back this with IndexedDB, desktop hosts with the filesystem.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::Result;

/// A stored media blob together with the metadata captured at import time.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobRecord {
    /// Track id the blob is keyed by.
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Duration in seconds as probed at import time.
    pub duration_secs: f64,
    /// Thumbnail image (data URL or path), if one was generated.
    pub thumbnail: Option<String>,
    pub mime_type: String,
    /// Raw encoded media bytes.
    pub data: Bytes,
    /// Size in bytes of `data`.
    pub size: u64,
    /// When the blob was imported.
    pub added_at: DateTime<Utc>,
}

impl BlobRecord {
    /// Returns `true` if the blob holds video content.
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// Durable key-value store for media blobs.
///
/// Every operation may fail with an I/O error; callers propagate those
/// failures to whoever initiated the library operation.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::BlobStore;
///
/// async fn forget(store: &dyn BlobStore, id: &str) -> Result<()> {
///     if store.get(id).await?.is_some() {
///         store.delete(id).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Insert or replace the record stored under `record.id`.
    async fn put(&self, record: BlobRecord) -> Result<()>;

    /// Fetch a record, `Ok(None)` when absent.
    async fn get(&self, id: &str) -> Result<Option<BlobRecord>>;

    /// Fetch every stored record.
    async fn get_all(&self) -> Result<Vec<BlobRecord>>;

    /// Delete a record. Deleting a missing id succeeds.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Remove every record.
    async fn clear(&self) -> Result<()>;

    /// Sum of the stored byte sizes.
    async fn total_size(&self) -> Result<u64> {
        Ok(self.get_all().await?.iter().map(|record| record.size).sum())
    }
}

/// Volatile in-process blob store.
///
/// Useful for hosts that import media for a single session only, and as a
/// working double in tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    records: RwLock<HashMap<String, BlobRecord>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, record: BlobRecord) -> Result<()> {
        self.records.write().insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<BlobRecord>> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<BlobRecord>> {
        let mut records: Vec<BlobRecord> = self.records.read().values().cloned().collect();
        records.sort_by_key(|record| record.added_at);
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.records.write().remove(id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.records.write().clear();
        Ok(())
    }
}
