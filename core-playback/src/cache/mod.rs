//! # Offline Cache Module
//!
//! Tracks which tracks are available offline and when they became so.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │     CacheManager                       │
//! │  - mark_cached()                       │
//! │  - remove_from_cache()                 │
//! │  - clear_old_cache()                   │
//! │  - stats()                             │
//! └────────┬───────────────────────────────┘
//!          │
//!          ├──> TrackRegistry (cached set, mirrored flags)
//!          ├──> Clock (cachedAt, age cutoff)
//!          └──> EventBus (optional)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::cache::{CacheManager, CacheSettings};
//!
//! let manager = CacheManager::new(registry, CacheSettings::default(), clock)?;
//! manager.mark_cached(&track);
//! let stats = manager.stats();
//! println!("Cache: ~{} MB", stats.approx_cache_mb);
//! ```

pub mod config;
pub mod manager;
pub mod stats;

// Re-export commonly used types
pub use config::{CacheSettings, CacheSettingsUpdate};
pub use manager::CacheManager;
pub use stats::{CacheStats, PER_TRACK_ESTIMATE_MB};
