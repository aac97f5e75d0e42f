//! # Core Configuration Module
//!
//! Builder-based configuration holding every injected host bridge plus the
//! runtime tunables of the player core.
//!
//! ## Required Dependencies
//!
//! - `EmbeddedPlayer` - Backend for remote streams
//! - `MediaElementFactory` - Backend for local blobs
//! - `BlobStore` - Persistence for imported media
//!
//! ## Optional Dependencies
//!
//! - `SearchProvider` - Remote catalogue search (search is disabled without it)
//! - `HttpClient` - Needed for URL imports (desktop default: reqwest)
//! - `MediaProbe` - Duration/thumbnail extraction (desktop default: lofty)
//! - `Clock` - Defaults to the system clock
//!
//! With the `desktop-shims` feature, a filesystem `BlobStore`, a reqwest
//! `HttpClient` and a lofty `MediaProbe` are injected when not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .embedded_player(Arc::new(MyEmbeddedPlayer::new()))
//!     .media_elements(Arc::new(MyMediaElements::new()))
//!     .blob_store(Arc::new(MemoryBlobStore::new()))
//!     .search_provider(Arc::new(search))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! `build()` fails fast with [`Error::CapabilityMissing`] naming the absent
//! bridge, and with [`Error::Config`] when a tunable is out of range.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    BlobStore, Clock, EmbeddedPlayer, HttpClient, MediaElementFactory, MediaProbe,
    SearchProvider, SystemClock,
};
use std::sync::Arc;
use std::time::Duration;

/// Poll interval for local media elements.
pub const DEFAULT_LOCAL_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll interval for the embedded remote player.
pub const DEFAULT_REMOTE_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Largest file accepted by local or URL import (500 MB).
pub const DEFAULT_MAX_IMPORT_BYTES: u64 = 500 * 1024 * 1024;

const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Core configuration for the player.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    pub embedded_player: Arc<dyn EmbeddedPlayer>,
    pub media_elements: Arc<dyn MediaElementFactory>,
    pub blob_store: Arc<dyn BlobStore>,
    pub search_provider: Option<Arc<dyn SearchProvider>>,
    pub http_client: Option<Arc<dyn HttpClient>>,
    pub media_probe: Option<Arc<dyn MediaProbe>>,
    pub clock: Arc<dyn Clock>,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,
    pub local_poll_interval: Duration,
    pub remote_poll_interval: Duration,
    pub max_import_bytes: u64,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("embedded_player", &"EmbeddedPlayer { ... }")
            .field("media_elements", &"MediaElementFactory { ... }")
            .field("blob_store", &"BlobStore { ... }")
            .field(
                "search_provider",
                &self.search_provider.as_ref().map(|_| "SearchProvider { ... }"),
            )
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "media_probe",
                &self.media_probe.as_ref().map(|_| "MediaProbe { ... }"),
            )
            .field("event_buffer_size", &self.event_buffer_size)
            .field("local_poll_interval", &self.local_poll_interval)
            .field("remote_poll_interval", &self.remote_poll_interval)
            .field("max_import_bytes", &self.max_import_bytes)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Mark a remote track as available offline the first time it plays
    pub auto_cache_on_play: bool,

    /// Allow importing media from http(s) URLs (requires HttpClient)
    pub enable_url_import: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            auto_cache_on_play: true,
            enable_url_import: true,
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates tunables and feature/bridge consistency.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        for (name, interval) in [
            ("Local poll interval", self.local_poll_interval),
            ("Remote poll interval", self.remote_poll_interval),
        ] {
            if interval.is_zero() || interval > MAX_POLL_INTERVAL {
                return Err(Error::Config(format!(
                    "{} must be between 1ms and {}s, got {:?}",
                    name,
                    MAX_POLL_INTERVAL.as_secs(),
                    interval
                )));
            }
        }

        if self.max_import_bytes == 0 {
            return Err(Error::Config(
                "Maximum import size must be greater than 0 bytes".to_string(),
            ));
        }

        if self.features.enable_url_import && self.http_client.is_none() {
            return Err(Error::Config(
                "URL import enabled but no HttpClient provided. \
                 Disable the feature or inject an HttpClient implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_blob_store() -> Result<Arc<dyn BlobStore>> {
    let store = bridge_desktop::FsBlobStore::open_default()?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_blob_store() -> Result<Arc<dyn BlobStore>> {
    Err(capability_missing(
        "BlobStore",
        "BlobStore implementation is required to persist imported media. \
         Desktop: enable the 'desktop-shims' feature to use the filesystem store. \
         Web: inject an IndexedDB-backed store.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    let client = bridge_desktop::ReqwestHttpClient::new()?;
    Ok(Some(Arc::new(client)))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}

#[cfg(feature = "desktop-shims")]
fn provide_default_media_probe() -> Option<Arc<dyn MediaProbe>> {
    Some(Arc::new(bridge_desktop::LoftyMediaProbe::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_media_probe() -> Option<Arc<dyn MediaProbe>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    embedded_player: Option<Arc<dyn EmbeddedPlayer>>,
    media_elements: Option<Arc<dyn MediaElementFactory>>,
    blob_store: Option<Arc<dyn BlobStore>>,
    search_provider: Option<Arc<dyn SearchProvider>>,
    http_client: Option<Arc<dyn HttpClient>>,
    media_probe: Option<Arc<dyn MediaProbe>>,
    clock: Option<Arc<dyn Clock>>,
    event_buffer_size: Option<usize>,
    local_poll_interval: Option<Duration>,
    remote_poll_interval: Option<Duration>,
    max_import_bytes: Option<u64>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    pub fn embedded_player(mut self, player: Arc<dyn EmbeddedPlayer>) -> Self {
        self.embedded_player = Some(player);
        self
    }

    pub fn media_elements(mut self, factory: Arc<dyn MediaElementFactory>) -> Self {
        self.media_elements = Some(factory);
        self
    }

    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    pub fn search_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search_provider = Some(provider);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn media_probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.media_probe = Some(probe);
        self
    }

    /// Inject a clock; tests use a manual one to age cache entries.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn local_poll_interval(mut self, interval: Duration) -> Self {
        self.local_poll_interval = Some(interval);
        self
    }

    pub fn remote_poll_interval(mut self, interval: Duration) -> Self {
        self.remote_poll_interval = Some(interval);
        self
    }

    pub fn max_import_bytes(mut self, bytes: u64) -> Self {
        self.max_import_bytes = Some(bytes);
        self
    }

    pub fn auto_cache_on_play(mut self, enabled: bool) -> Self {
        self.features.auto_cache_on_play = enabled;
        self
    }

    pub fn enable_url_import(mut self, enabled: bool) -> Self {
        self.features.enable_url_import = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig`, failing fast on missing bridges.
    pub fn build(self) -> Result<CoreConfig> {
        let embedded_player = self.embedded_player.ok_or_else(|| {
            capability_missing(
                "EmbeddedPlayer",
                "An EmbeddedPlayer is required to play remote streams. \
                 Inject the host's embeddable player wrapper with .embedded_player().",
            )
        })?;

        let media_elements = self.media_elements.ok_or_else(|| {
            capability_missing(
                "MediaElementFactory",
                "A MediaElementFactory is required to play imported files. \
                 Inject the host's media element wrapper with .media_elements().",
            )
        })?;

        let blob_store = match self.blob_store {
            Some(store) => store,
            None => provide_default_blob_store()?,
        };

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None => provide_default_http_client()?,
        };

        let config = CoreConfig {
            embedded_player,
            media_elements,
            blob_store,
            search_provider: self.search_provider,
            http_client,
            media_probe: self.media_probe.or_else(provide_default_media_probe),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            local_poll_interval: self
                .local_poll_interval
                .unwrap_or(DEFAULT_LOCAL_POLL_INTERVAL),
            remote_poll_interval: self
                .remote_poll_interval
                .unwrap_or(DEFAULT_REMOTE_POLL_INTERVAL),
            max_import_bytes: self.max_import_bytes.unwrap_or(DEFAULT_MAX_IMPORT_BYTES),
            features: self.features,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        BlobRecord, HttpRequest, HttpResponse, MediaElement, MediaStatus, MediaTransport,
        MemoryBlobStore,
    };

    struct NullPlayer;

    impl MediaTransport for NullPlayer {
        fn play(&self) -> BridgeResult<()> {
            Ok(())
        }
        fn pause(&self) -> BridgeResult<()> {
            Ok(())
        }
        fn seek_to(&self, _position: Duration) -> BridgeResult<()> {
            Ok(())
        }
        fn set_volume(&self, _volume: u8) -> BridgeResult<()> {
            Ok(())
        }
        fn status(&self) -> MediaStatus {
            MediaStatus::idle()
        }
    }

    #[async_trait]
    impl EmbeddedPlayer for NullPlayer {
        async fn load(&self, _stream_id: &str) -> BridgeResult<()> {
            Ok(())
        }
        fn stop(&self) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct NullElements;

    #[async_trait]
    impl MediaElementFactory for NullElements {
        async fn open(&self, _record: BlobRecord) -> BridgeResult<Arc<dyn MediaElement>> {
            Err(bridge_traits::BridgeError::NotAvailable("test".to_string()))
        }
    }

    struct NullHttp;

    #[async_trait]
    impl HttpClient for NullHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Err(bridge_traits::BridgeError::NotAvailable("offline".to_string()))
        }
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .embedded_player(Arc::new(NullPlayer))
            .media_elements(Arc::new(NullElements))
            .blob_store(Arc::new(MemoryBlobStore::new()))
            .http_client(Arc::new(NullHttp))
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.local_poll_interval, Duration::from_millis(500));
        assert_eq!(config.remote_poll_interval, Duration::from_millis(1000));
        assert_eq!(config.max_import_bytes, 500 * 1024 * 1024);
        assert!(config.features.auto_cache_on_play);
        assert!(config.search_provider.is_none());
    }

    #[test]
    fn test_builder_requires_embedded_player() {
        let result = CoreConfig::builder()
            .media_elements(Arc::new(NullElements))
            .blob_store(Arc::new(MemoryBlobStore::new()))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "EmbeddedPlayer")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_builder_requires_media_elements() {
        let result = CoreConfig::builder()
            .embedded_player(Arc::new(NullPlayer))
            .blob_store(Arc::new(MemoryBlobStore::new()))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "MediaElementFactory"
        ));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_blob_store_without_shims() {
        let result = CoreConfig::builder()
            .embedded_player(Arc::new(NullPlayer))
            .media_elements(Arc::new(NullElements))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "BlobStore"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let result = complete_builder()
            .local_poll_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_import_limit() {
        let result = complete_builder().max_import_bytes(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_url_import_requires_http_client() {
        let result = CoreConfig::builder()
            .embedded_player(Arc::new(NullPlayer))
            .media_elements(Arc::new(NullElements))
            .blob_store(Arc::new(MemoryBlobStore::new()))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));

        let config = CoreConfig::builder()
            .embedded_player(Arc::new(NullPlayer))
            .media_elements(Arc::new(NullElements))
            .blob_store(Arc::new(MemoryBlobStore::new()))
            .enable_url_import(false)
            .build()
            .unwrap();
        assert!(config.http_client.is_none());
    }

    #[test]
    fn test_custom_tunables() {
        let config = complete_builder()
            .event_buffer_size(8)
            .remote_poll_interval(Duration::from_millis(250))
            .auto_cache_on_play(false)
            .build()
            .unwrap();

        assert_eq!(config.event_buffer_size, 8);
        assert_eq!(config.remote_poll_interval, Duration::from_millis(250));
        assert!(!config.features.auto_cache_on_play);
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = complete_builder().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.max_import_bytes, config.max_import_bytes);
        assert!(format!("{:?}", cloned).contains("CoreConfig"));
    }
}
