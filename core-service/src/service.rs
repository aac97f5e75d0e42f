//! # Player Service
//!
//! The single injectable state container hosts talk to. Every user intent
//! is a method here, and these methods are the only mutation surface for the
//! track registry, the queue, the cache and the playback engine.
//!
//! ## Adapter events
//!
//! Backend adapters publish [`AdapterEvent`]s on a channel. A pump task owned
//! by the service folds them into the engine and acts on the outcome:
//! advancing when a track ends and marking a remote track cached the first
//! time it starts, when auto-cache is enabled.
//!
//! ## Locking
//!
//! Registry and queue locks are synchronous and are never held across an
//! await point.

use crate::error::{CoreError, Result};
use bridge_traits::search::SearchProvider;
use bridge_traits::MediaFile;
use core_library::{LibraryError, LocalImporter, TrackId, TrackMetadata, TrackRegistry};
use core_playback::{
    AdapterEvent, CacheManager, CacheSettings, CacheSettingsUpdate, CacheStats, Direction,
    EventOutcome, LocalBlobAdapter, OutputDevice, PlaybackEngine, PlaybackError, PlaybackState,
    QueueManager, RemoteStreamAdapter, RepeatMode,
};
use core_runtime::config::{CoreConfig, FeatureFlags};
use core_runtime::events::{CoreEvent, EventBus, EventStream, LibraryEvent, SearchEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::Receiver;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub struct PlayerService {
    registry: Arc<RwLock<TrackRegistry>>,
    engine: Arc<PlaybackEngine>,
    queue: Mutex<QueueManager>,
    cache: CacheManager,
    importer: LocalImporter,
    search_provider: Option<Arc<dyn SearchProvider>>,
    /// Bumped per search; only the latest search may write results.
    search_generation: AtomicU64,
    features: FeatureFlags,
    event_bus: EventBus,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerService {
    /// Wire a service from `config`.
    ///
    /// Must be called from inside a Tokio runtime: the adapter event pump is
    /// spawned here.
    pub fn new(config: CoreConfig, cache_settings: CacheSettings) -> Result<Arc<Self>> {
        Self::with_queue(config, cache_settings, QueueManager::new())
    }

    /// Like [`PlayerService::new`] with a caller-provided queue, e.g. one
    /// with a fixed shuffle seed.
    pub fn with_queue(
        config: CoreConfig,
        cache_settings: CacheSettings,
        queue: QueueManager,
    ) -> Result<Arc<Self>> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            CoreError::InitializationFailed(
                "PlayerService must be created inside a Tokio runtime".to_string(),
            )
        })?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let registry = Arc::new(RwLock::new(TrackRegistry::new()));
        let (tx, rx) = unbounded_channel();
        let output = Arc::new(OutputDevice::new());

        let remote = Arc::new(RemoteStreamAdapter::new(
            config.embedded_player.clone(),
            output.clone(),
            tx.clone(),
            config.remote_poll_interval,
        ));
        let local = Arc::new(LocalBlobAdapter::new(
            config.blob_store.clone(),
            config.media_elements.clone(),
            output,
            tx,
            config.local_poll_interval,
        ));
        let engine =
            Arc::new(PlaybackEngine::new(remote, local).with_event_bus(event_bus.clone()));

        let cache = CacheManager::new(registry.clone(), cache_settings, config.clock.clone())?
            .with_event_bus(event_bus.clone());

        let http = if config.features.enable_url_import {
            config.http_client.clone()
        } else {
            None
        };
        let importer = LocalImporter::new(
            config.blob_store.clone(),
            config.media_probe.clone(),
            http,
            config.clock.clone(),
            config.max_import_bytes,
        );

        let service = Arc::new(Self {
            registry,
            engine,
            queue: Mutex::new(queue),
            cache,
            importer,
            search_provider: config.search_provider.clone(),
            search_generation: AtomicU64::new(0),
            features: config.features,
            event_bus,
            pump: Mutex::new(None),
        });

        let pump = runtime.spawn(Self::run_event_pump(Arc::downgrade(&service), rx));
        *service.pump.lock() = Some(pump);

        info!(
            search = service.search_provider.is_some(),
            auto_cache_on_play = service.features.auto_cache_on_play,
            "Player service ready"
        );
        Ok(service)
    }

    /// Startup work: load persisted local tracks, then run age-based cache
    /// eviction once when auto-clean is on.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<()> {
        self.load_local_tracks().await?;
        if self.cache.settings().auto_clean {
            self.cache.clear_old_cache();
        }
        Ok(())
    }

    fn emit(&self, event: CoreEvent) {
        let _ = self.event_bus.emit(event);
    }

    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// Subscribe to the events matching `predicate` only.
    pub fn subscribe_filtered<F>(&self, predicate: F) -> EventStream
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        EventStream::new(self.event_bus.subscribe()).filter(predicate)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ========================================================================
    // Adapter event pump
    // ========================================================================

    async fn run_event_pump(service: Weak<Self>, mut events: UnboundedReceiver<AdapterEvent>) {
        while let Some(event) = events.recv().await {
            let Some(service) = service.upgrade() else {
                break;
            };
            service.apply_adapter_event(event);
        }
        debug!("Adapter event pump stopped");
    }

    fn apply_adapter_event(self: &Arc<Self>, event: AdapterEvent) {
        match self.engine.handle_event(event) {
            EventOutcome::AdvanceRequested => {
                // Attach can take a while; later events must keep flowing.
                let service = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(e) = service.next().await {
                        warn!(error = %e, "Advance after track end failed");
                    }
                });
            }
            EventOutcome::CacheProposed(track) => {
                if self.features.auto_cache_on_play {
                    self.cache.mark_cached(&track);
                }
            }
            EventOutcome::Applied | EventOutcome::Discarded | EventOutcome::Restarted => {}
        }
    }

    // ========================================================================
    // Playback intents
    // ========================================================================

    pub fn playback_state(&self) -> PlaybackState {
        self.engine.state()
    }

    /// Select `track` and start it. Resolves once the backend is ready, or
    /// immediately with `Ok` if a newer selection superseded this one.
    pub async fn play_track(&self, track: TrackMetadata) -> Result<()> {
        self.engine.select_track(track).await?;
        Ok(())
    }

    /// Select a track known to the registry.
    pub async fn play_by_id(&self, id: &TrackId) -> Result<()> {
        let track = self.registry.read().find(id).cloned();
        let track = track.ok_or_else(|| LibraryError::NotFound {
            entity_type: "track".to_string(),
            id: id.to_string(),
        })?;
        self.play_track(track).await
    }

    /// Flip play/pause. A session that failed is reattached instead, which
    /// resumes the current track from the start.
    pub async fn toggle_play_pause(&self) -> Result<()> {
        match self.engine.toggle_play_pause() {
            Err(PlaybackError::SessionFailed) => {
                self.engine.reattach_current().await?;
                Ok(())
            }
            other => Ok(other?),
        }
    }

    /// Seek to a percentage; returns the clamped value actually applied.
    pub fn seek(&self, percentage: f64) -> Result<f64> {
        Ok(self.engine.seek(percentage)?)
    }

    pub fn set_volume(&self, volume: u8) -> Result<()> {
        Ok(self.engine.set_volume(volume)?)
    }

    pub fn toggle_shuffle(&self) -> bool {
        self.engine.toggle_shuffle()
    }

    pub fn cycle_repeat(&self) -> RepeatMode {
        self.engine.cycle_repeat()
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    /// Advance forward: queue head first, then the active display list.
    pub async fn next(&self) -> Result<Option<TrackMetadata>> {
        self.advance(Direction::Forward).await
    }

    /// Step backward through the active display list. The queue is not
    /// consulted.
    pub async fn previous(&self) -> Result<Option<TrackMetadata>> {
        self.advance(Direction::Backward).await
    }

    #[instrument(skip(self))]
    async fn advance(&self, direction: Direction) -> Result<Option<TrackMetadata>> {
        let state = self.engine.state();
        let list = self.registry.read().active_display_list().to_vec();

        let (next, queue_len, drained) = {
            let mut queue = self.queue.lock();
            let before = queue.len();
            let next = queue.advance(direction, &list, state.current_track_id(), state.shuffle);
            (next, queue.len(), before != queue.len())
        };

        if drained {
            self.emit(CoreEvent::Library(LibraryEvent::QueueChanged { length: queue_len }));
        }

        let Some(track) = next else {
            debug!("Nothing to advance to");
            return Ok(None);
        };

        self.engine.select_track(track.clone()).await?;
        Ok(Some(track))
    }

    // ========================================================================
    // Queue
    // ========================================================================

    pub fn enqueue(&self, track: TrackMetadata) {
        let length = {
            let mut queue = self.queue.lock();
            queue.enqueue(track);
            queue.len()
        };
        self.emit(CoreEvent::Library(LibraryEvent::QueueChanged { length }));
    }

    pub fn remove_from_queue(&self, id: &TrackId) -> bool {
        let (removed, length) = {
            let mut queue = self.queue.lock();
            (queue.remove(id), queue.len())
        };
        if removed {
            self.emit(CoreEvent::Library(LibraryEvent::QueueChanged { length }));
        }
        removed
    }

    pub fn queue(&self) -> Vec<TrackMetadata> {
        self.queue.lock().snapshot()
    }

    pub fn clear_queue(&self) {
        self.queue.lock().clear();
        self.emit(CoreEvent::Library(LibraryEvent::QueueChanged { length: 0 }));
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Search the remote catalogue and replace the search-result set.
    ///
    /// A blank query clears the results without contacting the provider. If
    /// a newer search starts while this one is in flight, this one's results
    /// are returned but not stored.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<TrackMetadata>> {
        let generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim();

        if query.is_empty() {
            self.registry.write().clear_search();
            self.emit(CoreEvent::Search(SearchEvent::Cleared));
            return Ok(Vec::new());
        }

        let provider = self.search_provider.clone().ok_or_else(|| {
            CoreError::FeatureDisabled("No search provider configured".to_string())
        })?;

        self.emit(CoreEvent::Search(SearchEvent::Started {
            query: query.to_string(),
        }));

        let hits = match provider.search(query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, quota = e.is_quota_exceeded(), "Search failed");
                self.emit(CoreEvent::Search(SearchEvent::Failed {
                    query: query.to_string(),
                    message: e.to_string(),
                    quota_exceeded: e.is_quota_exceeded(),
                }));
                return Err(e.into());
            }
        };

        let tracks: Vec<TrackMetadata> = hits.into_iter().map(TrackMetadata::from_search_hit).collect();

        let results = {
            let mut registry = self.registry.write();
            if self.search_generation.load(Ordering::SeqCst) != generation {
                debug!("Superseded search result dropped");
                return Ok(tracks);
            }
            registry.set_search_results(query, tracks);
            registry.search_results().to_vec()
        };

        self.emit(CoreEvent::Search(SearchEvent::Completed {
            query: query.to_string(),
            result_count: results.len(),
        }));
        Ok(results)
    }

    pub fn search_results(&self) -> Vec<TrackMetadata> {
        self.registry.read().search_results().to_vec()
    }

    pub fn search_query(&self) -> String {
        self.registry.read().search_query().to_string()
    }

    /// Search results if there are any, else the cached tracks.
    pub fn display_list(&self) -> Vec<TrackMetadata> {
        self.registry.read().active_display_list().to_vec()
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    pub fn add_to_favorites(&self, track: TrackMetadata) -> bool {
        let id = track.id.to_string();
        let added = self.registry.write().add_favorite(track);
        if added {
            self.emit(CoreEvent::Library(LibraryEvent::FavoriteAdded { track_id: id }));
        }
        added
    }

    pub fn remove_from_favorites(&self, id: &TrackId) -> bool {
        let removed = self.registry.write().remove_favorite(id);
        if removed {
            self.emit(CoreEvent::Library(LibraryEvent::FavoriteRemoved {
                track_id: id.to_string(),
            }));
        }
        removed
    }

    pub fn is_favorite(&self, id: &TrackId) -> bool {
        self.registry.read().is_favorite(id)
    }

    pub fn favorites(&self) -> Vec<TrackMetadata> {
        self.registry.read().favorites().to_vec()
    }

    // ========================================================================
    // Cache
    // ========================================================================

    pub fn add_to_cache(&self, track: &TrackMetadata) -> bool {
        self.cache.mark_cached(track)
    }

    pub fn remove_from_cache(&self, id: &TrackId) -> bool {
        self.cache.remove_from_cache(id)
    }

    pub fn is_cached(&self, id: &TrackId) -> bool {
        self.cache.is_cached(id)
    }

    pub fn cached_tracks(&self) -> Vec<TrackMetadata> {
        self.registry.read().cached_tracks().to_vec()
    }

    pub fn clear_old_cache(&self) -> Vec<TrackId> {
        self.cache.clear_old_cache()
    }

    pub fn cache_size_mb(&self) -> u64 {
        self.cache.cache_size_mb()
    }

    pub fn local_storage_bytes(&self) -> u64 {
        self.cache.local_storage_bytes()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn is_over_budget(&self) -> bool {
        self.cache.is_over_budget()
    }

    pub fn cache_settings(&self) -> CacheSettings {
        self.cache.settings()
    }

    pub fn update_cache_settings(&self, update: &CacheSettingsUpdate) -> Result<CacheSettings> {
        Ok(self.cache.update_settings(update)?)
    }

    // ========================================================================
    // Local files
    // ========================================================================

    pub fn local_tracks(&self) -> Vec<TrackMetadata> {
        self.registry.read().local_tracks().to_vec()
    }

    /// Replace the local set with what the blob store holds.
    pub async fn load_local_tracks(&self) -> Result<usize> {
        let tracks = self.importer.load_all().await?;
        let count = tracks.len();
        self.registry.write().replace_local_tracks(tracks);

        info!(count, "Local tracks loaded");
        self.emit(CoreEvent::Library(LibraryEvent::LocalTracksLoaded { count }));
        Ok(count)
    }

    pub async fn import_file(&self, file: MediaFile) -> Result<TrackMetadata> {
        let name = file.name.clone();
        let imported = self.importer.import_file(file).await;
        self.finish_import(name, "file", imported)
    }

    pub async fn import_from_url(&self, url: &str) -> Result<TrackMetadata> {
        if !self.features.enable_url_import {
            return Err(CoreError::FeatureDisabled("URL import is disabled".to_string()));
        }
        let imported = self.importer.import_from_url(url).await;
        self.finish_import(url.to_string(), "url", imported)
    }

    fn finish_import(
        &self,
        name: String,
        origin: &str,
        imported: core_library::Result<TrackMetadata>,
    ) -> Result<TrackMetadata> {
        match imported {
            Ok(track) => {
                self.registry.write().add_local_track(track.clone());
                self.emit(CoreEvent::Library(LibraryEvent::TrackImported {
                    track_id: track.id.to_string(),
                    title: track.title.clone(),
                    artist: track.artist.clone(),
                    origin: origin.to_string(),
                }));
                Ok(track)
            }
            Err(e) => {
                warn!(origin, error = %e, "Import failed");
                self.emit(CoreEvent::Library(LibraryEvent::ImportFailed {
                    name,
                    message: e.to_string(),
                }));
                Err(e.into())
            }
        }
    }

    /// Delete a local track's blob, then forget it everywhere.
    ///
    /// Returns `Ok(false)` for an id that is not a local track. When the blob
    /// cannot be deleted the registry is left untouched.
    #[instrument(skip(self), fields(track_id = %id))]
    pub async fn remove_local_track(&self, id: &TrackId) -> Result<bool> {
        let known = self
            .registry
            .read()
            .local_tracks()
            .iter()
            .any(|track| &track.id == id);
        if !known {
            return Ok(false);
        }

        self.importer.delete(id).await?;

        self.registry.write().remove_local_track(id);
        self.remove_from_queue(id);
        if self.engine.state().current_track_id() == Some(id) {
            self.engine.stop();
        }

        info!("Local track removed");
        self.emit(CoreEvent::Library(LibraryEvent::TrackRemoved {
            track_id: id.to_string(),
        }));
        Ok(true)
    }
}

impl Drop for PlayerService {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.get_mut().take() {
            pump.abort();
        }
    }
}
