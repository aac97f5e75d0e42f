//! # Playback & Cache Module
//!
//! Playback engine, backend adapters, queue and offline cache for the player
//! core.
//!
//! ## Overview
//!
//! This module handles:
//! - One playback state shared by a remote-stream and a local-blob backend
//! - Session-tagged adapter callbacks, with stale ones discarded
//! - Queue-first advancement through the active display list
//! - Offline-availability marking with age-based eviction

pub mod adapters;
pub mod cache;
pub mod engine;
pub mod error;
pub mod queue;
pub mod state;
pub mod traits;

pub use adapters::{LocalBlobAdapter, OutputDevice, RemoteStreamAdapter};
pub use cache::{CacheManager, CacheSettings, CacheSettingsUpdate, CacheStats};
pub use engine::{EventOutcome, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use queue::{Direction, QueueManager};
pub use state::{clamp_percentage, PlaybackState, RepeatMode, DEFAULT_VOLUME};
pub use traits::{AdapterEvent, AdapterEventKind, Attached, Playable, Session, SessionToken};
