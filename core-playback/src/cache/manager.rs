//! # Cache Manager
//!
//! Offline-availability bookkeeping on top of the track registry.
//!
//! Caching is metadata only: marking a track cached records a timestamp and
//! adds it to the cached set, removing it clears both. No blob is ever
//! written or deleted here. Eviction is by age only; the size budget is
//! reported through [`CacheStats`] but never enforced.

use crate::cache::config::{CacheSettings, CacheSettingsUpdate};
use crate::cache::stats::{CacheStats, PER_TRACK_ESTIMATE_MB};
use crate::error::{PlaybackError, Result};
use bridge_traits::Clock;
use chrono::Duration as ChronoDuration;
use core_library::{TrackId, TrackMetadata, TrackRegistry};
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct CacheManager {
    registry: Arc<RwLock<TrackRegistry>>,
    settings: RwLock<CacheSettings>,
    clock: Arc<dyn Clock>,
    event_bus: Option<EventBus>,
}

impl CacheManager {
    /// Create a cache manager over `registry`.
    ///
    /// Fails when `settings` do not validate.
    pub fn new(
        registry: Arc<RwLock<TrackRegistry>>,
        settings: CacheSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        settings.validate().map_err(PlaybackError::InvalidSettings)?;
        Ok(Self {
            registry,
            settings: RwLock::new(settings),
            clock,
            event_bus: None,
        })
    }

    /// Set event bus for cache events.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Cache(event));
        }
    }

    pub fn is_cached(&self, id: &TrackId) -> bool {
        self.registry.read().is_cached(id)
    }

    /// Mark `track` available offline, stamped with the current time.
    ///
    /// Returns `false` without changing anything when it already is.
    #[instrument(skip(self, track), fields(track_id = %track.id))]
    pub fn mark_cached(&self, track: &TrackMetadata) -> bool {
        let now = self.clock.now();
        if !self.registry.write().insert_cached(track, now) {
            debug!("Track already cached");
            return false;
        }

        info!(title = %track.title, "Track cached");
        self.emit(CacheEvent::TrackCached {
            track_id: track.id.to_string(),
            cached_at: now.timestamp_millis(),
        });
        true
    }

    /// Drop `id` from the cached set. Returns `false` when it was not cached.
    pub fn remove_from_cache(&self, id: &TrackId) -> bool {
        if !self.registry.write().remove_cached(id) {
            return false;
        }

        info!(track_id = %id, "Track removed from cache");
        self.emit(CacheEvent::TrackUncached {
            track_id: id.to_string(),
        });
        true
    }

    /// Remove every cached entry older than `cleanOlderThanDays`, measured
    /// against the clock at the moment of the call. Returns the removed ids.
    #[instrument(skip(self))]
    pub fn clear_old_cache(&self) -> Vec<TrackId> {
        let days = self.settings.read().clean_older_than_days;
        let cutoff = self.clock.now() - ChronoDuration::days(i64::from(days));

        let removed = {
            let mut registry = self.registry.write();
            let stale = registry.cached_older_than(cutoff);
            for id in &stale {
                registry.remove_cached(id);
            }
            stale
        };

        if !removed.is_empty() {
            info!(count = removed.len(), older_than_days = days, "Old cache entries removed");
            self.emit(CacheEvent::Cleaned {
                removed_ids: removed.iter().map(|id| id.to_string()).collect(),
                older_than_days: days,
            });
        }
        removed
    }

    /// Approximate cache size in megabytes.
    pub fn cache_size_mb(&self) -> u64 {
        self.registry.read().cached_tracks().len() as u64 * PER_TRACK_ESTIMATE_MB
    }

    /// Exact byte total of the local tracks.
    pub fn local_storage_bytes(&self) -> u64 {
        self.registry.read().local_storage_bytes()
    }

    pub fn stats(&self) -> CacheStats {
        let registry = self.registry.read();
        let cached_tracks = registry.cached_tracks().len();
        CacheStats {
            cached_tracks,
            approx_cache_mb: cached_tracks as u64 * PER_TRACK_ESTIMATE_MB,
            local_tracks: registry.local_tracks().len(),
            local_bytes: registry.local_storage_bytes(),
            max_size_mb: self.settings.read().max_size_mb(),
            calculated_at: self.clock.unix_timestamp_millis(),
        }
    }

    /// Whether usage exceeds the budget. Reporting only.
    pub fn is_over_budget(&self) -> bool {
        self.stats().is_over_budget()
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings.read().clone()
    }

    /// Apply a partial update. Invalid results are rejected and the previous
    /// settings kept.
    pub fn update_settings(&self, update: &CacheSettingsUpdate) -> Result<CacheSettings> {
        let mut settings = self.settings.write();
        let mut next = settings.clone();
        next.apply(update);
        next.validate().map_err(PlaybackError::InvalidSettings)?;
        *settings = next.clone();
        drop(settings);

        debug!(?next, "Cache settings updated");
        self.emit(CacheEvent::SettingsUpdated);
        Ok(next)
    }
}
