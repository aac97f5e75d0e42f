//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (embedded player,
//! media elements, blob store, HTTP, search) into one [`PlayerService`].
//! Desktop apps typically enable the `desktop-shims` feature, which lets
//! [`CoreConfig`] fall back to the filesystem blob store, the reqwest HTTP
//! client and the lofty media probe from `bridge-desktop`. The `youtube`
//! feature re-exports the YouTube search provider.

pub mod error;
pub mod service;

pub use error::{CoreError, Result, UserMessageCategory};
pub use service::PlayerService;

pub use core_library::{TrackId, TrackMetadata};
pub use core_playback::{CacheSettings, CacheSettingsUpdate, CacheStats, PlaybackState, RepeatMode};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder};

#[cfg(feature = "youtube")]
pub use provider_youtube::YouTubeSearchProvider;

use std::sync::Arc;

/// Build a service and run its startup work.
///
/// ```ignore
/// use core_service::{bootstrap, CacheSettings, CoreConfig};
///
/// let config = CoreConfig::builder()
///     .embedded_player(player)
///     .media_elements(elements)
///     .build()?;
/// let service = bootstrap(config, CacheSettings::default()).await?;
/// service.search("ambient").await?;
/// ```
pub async fn bootstrap(config: CoreConfig, cache_settings: CacheSettings) -> Result<Arc<PlayerService>> {
    let service = PlayerService::new(config, cache_settings)?;
    service.bootstrap().await?;
    Ok(service)
}
