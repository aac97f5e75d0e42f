//! # Track Registry
//!
//! In-memory home of every track the player knows about, partitioned into
//! four sets:
//!
//! | Set            | Order            | Populated by                    |
//! |----------------|------------------|---------------------------------|
//! | search results | platform ranking | `set_search_results`            |
//! | local          | import order     | imports and the startup load    |
//! | cached         | caching order    | the cache manager               |
//! | favorites      | insertion order  | favorite intents                |
//!
//! A track can appear in several sets at once, each holding its own copy.
//! Cache state changes are mirrored onto the search-result and favorite
//! copies so every view reports the same offline status.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{TrackId, TrackMetadata};

#[derive(Debug, Default)]
pub struct TrackRegistry {
    search_query: String,
    search_results: Vec<TrackMetadata>,
    local: Vec<TrackMetadata>,
    cached: Vec<TrackMetadata>,
    favorites: Vec<TrackMetadata>,
}

fn position(tracks: &[TrackMetadata], id: &TrackId) -> Option<usize> {
    tracks.iter().position(|track| &track.id == id)
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Search results
    // ---------------------------------------------------------------------

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn search_results(&self) -> &[TrackMetadata] {
        &self.search_results
    }

    /// Replace the search results. Hits that are already cached take over
    /// the cached timestamp so they render as offline-available.
    pub fn set_search_results(&mut self, query: impl Into<String>, mut results: Vec<TrackMetadata>) {
        for result in &mut results {
            if let Some(cached) = self.cached.iter().find(|c| c.id == result.id) {
                if let Some(at) = cached.cached_at() {
                    result.mark_cached(at);
                }
            }
        }
        self.search_query = query.into();
        debug!(query = %self.search_query, count = results.len(), "Search results replaced");
        self.search_results = results;
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.search_results.clear();
    }

    // ---------------------------------------------------------------------
    // Local tracks
    // ---------------------------------------------------------------------

    pub fn local_tracks(&self) -> &[TrackMetadata] {
        &self.local
    }

    /// Append an imported track, replacing an existing record with the same id.
    pub fn add_local_track(&mut self, track: TrackMetadata) {
        match position(&self.local, &track.id) {
            Some(index) => self.local[index] = track,
            None => self.local.push(track),
        }
    }

    /// Replace the whole local set (startup load).
    pub fn replace_local_tracks(&mut self, tracks: Vec<TrackMetadata>) {
        self.local = tracks;
    }

    /// Forget a local track everywhere it appears. Returns the removed record.
    pub fn remove_local_track(&mut self, id: &TrackId) -> Option<TrackMetadata> {
        let index = position(&self.local, id)?;
        let removed = self.local.remove(index);
        self.cached.retain(|track| &track.id != id);
        self.favorites.retain(|track| &track.id != id);
        Some(removed)
    }

    /// Exact byte total of the local set.
    pub fn local_storage_bytes(&self) -> u64 {
        self.local.iter().filter_map(|track| track.byte_size).sum()
    }

    // ---------------------------------------------------------------------
    // Cached set
    // ---------------------------------------------------------------------

    pub fn cached_tracks(&self) -> &[TrackMetadata] {
        &self.cached
    }

    pub fn is_cached(&self, id: &TrackId) -> bool {
        position(&self.cached, id).is_some()
    }

    /// Add `track` to the cached set stamped with `at`.
    ///
    /// Returns `false` and changes nothing when the id is already cached.
    /// Local tracks are always available and never enter the cached set.
    pub fn insert_cached(&mut self, track: &TrackMetadata, at: DateTime<Utc>) -> bool {
        if track.is_local() || self.is_cached(&track.id) {
            return false;
        }

        let mut entry = track.clone();
        entry.mark_cached(at);
        self.cached.push(entry);

        for copy in self.mirrored_copies_mut(&track.id) {
            copy.mark_cached(at);
        }
        true
    }

    /// Drop `id` from the cached set and clear the flag on mirrored copies.
    ///
    /// Returns `false` when the id was not cached.
    pub fn remove_cached(&mut self, id: &TrackId) -> bool {
        let Some(index) = position(&self.cached, id) else {
            return false;
        };
        self.cached.remove(index);

        for copy in self.mirrored_copies_mut(id) {
            copy.clear_cached();
        }
        true
    }

    /// Ids of cached entries stamped strictly before `cutoff`.
    pub fn cached_older_than(&self, cutoff: DateTime<Utc>) -> Vec<TrackId> {
        self.cached
            .iter()
            .filter(|track| track.cached_at().is_some_and(|at| at < cutoff))
            .map(|track| track.id.clone())
            .collect()
    }

    fn mirrored_copies_mut<'a>(
        &'a mut self,
        id: &'a TrackId,
    ) -> impl Iterator<Item = &'a mut TrackMetadata> + 'a {
        self.search_results
            .iter_mut()
            .chain(self.favorites.iter_mut())
            .filter(move |track| &track.id == id)
    }

    // ---------------------------------------------------------------------
    // Favorites
    // ---------------------------------------------------------------------

    pub fn favorites(&self) -> &[TrackMetadata] {
        &self.favorites
    }

    pub fn is_favorite(&self, id: &TrackId) -> bool {
        position(&self.favorites, id).is_some()
    }

    /// Returns `false` when the track already is a favorite.
    pub fn add_favorite(&mut self, track: TrackMetadata) -> bool {
        if self.is_favorite(&track.id) {
            return false;
        }
        let mut track = track;
        if let Some(at) = self
            .cached
            .iter()
            .find(|cached| cached.id == track.id)
            .and_then(TrackMetadata::cached_at)
        {
            track.mark_cached(at);
        }
        self.favorites.push(track);
        true
    }

    pub fn remove_favorite(&mut self, id: &TrackId) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|track| &track.id != id);
        before != self.favorites.len()
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    /// Find a record by id in any set.
    pub fn find(&self, id: &TrackId) -> Option<&TrackMetadata> {
        self.search_results
            .iter()
            .chain(&self.local)
            .chain(&self.cached)
            .chain(&self.favorites)
            .find(|track| &track.id == id)
    }

    /// The list automatic advancement walks through: search results when
    /// there are any, otherwise the cached set.
    pub fn active_display_list(&self) -> &[TrackMetadata] {
        if self.search_results.is_empty() {
            &self.cached
        } else {
            &self.search_results
        }
    }
}
