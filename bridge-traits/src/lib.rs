//! # Host Bridge Traits
//!
//! Capability traits the player core needs from its host but cannot provide
//! itself.
//!
//! ## Overview
//!
//! The core never decodes media, never talks to the video platform's player
//! directly and never touches a storage engine. Each of those concerns is a
//! trait defined here and implemented per host (desktop, web view, mobile).
//!
//! ## Traits
//!
//! ### Storage & I/O
//! - [`BlobStore`](storage::BlobStore) - Durable key-value store for imported media blobs
//! - [`HttpClient`](http::HttpClient) - Async HTTP used by search and URL downloads
//!
//! ### Playback backends
//! - [`EmbeddedPlayer`](playback::EmbeddedPlayer) - Third-party embeddable stream player
//! - [`MediaElementFactory`](playback::MediaElementFactory) - Creates revocable handles over local blobs
//!
//! ### Import helpers
//! - [`MediaProbe`](media::MediaProbe) - Best-effort duration and thumbnail extraction
//!
//! ### Search
//! - [`SearchProvider`](search::SearchProvider) - Remote catalogue search
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! Bridge operations return [`BridgeError`](error::BridgeError). Search has a
//! dedicated [`SearchError`](search::SearchError) because callers must be able
//! to tell a quota rejection apart from any other failure.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod http;
pub mod media;
pub mod playback;
pub mod search;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use media::{MediaFile, MediaProbe};
pub use playback::{
    EmbeddedPlayer, MediaElement, MediaElementFactory, MediaState, MediaStatus, MediaTransport,
};
pub use search::{SearchError, SearchHit, SearchProvider};
pub use storage::{BlobRecord, BlobStore, MemoryBlobStore};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
