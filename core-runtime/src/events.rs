//! # Event Bus System
//!
//! Typed, broadcast event delivery between the player core and its UI
//! layers, built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: one enum per domain, wrapped in [`CoreEvent`]
//! - **EventBus**: cloneable publisher handle
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ```text
//! ┌────────────────┐  emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ PlaybackEngine ├────────>│           ├────────────>│  UI layer  │
//! └────────────────┘         │ EventBus  │             └────────────┘
//! ┌────────────────┐  emit   │ (broadcast│  subscribe  ┌────────────┐
//! │ CacheManager   ├────────>│  channel) ├────────────>│  Logger    │
//! └────────────────┘         └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Completed {
//!     track_id: "dQw4w9WgXcQ".to_string(),
//! }))
//! .ok();
//!
//! assert!(matches!(rx.recv().await, Ok(CoreEvent::Playback(_))));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; keep reading.
//! - **`RecvError::Closed`**: every sender is gone; treat as shutdown.
//!
//! `emit` fails only when nobody is subscribed. Publishers in this workspace
//! ignore that case.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Playback(PlaybackEvent),
    Cache(CacheEvent),
    Library(LibraryEvent),
    Search(SearchEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Cache(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Search(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Search(SearchEvent::Failed {
                quota_exceeded: true,
                ..
            }) => EventSeverity::Warning,
            CoreEvent::Search(SearchEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Library(LibraryEvent::ImportFailed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::TrackChanged { .. })
            | CoreEvent::Cache(_)
            | CoreEvent::Library(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events published by the playback engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A new current track was selected.
    TrackChanged {
        track_id: String,
        title: String,
        /// `"remote"` or `"local"`.
        source_kind: String,
    },
    /// Output started or resumed.
    Started { track_id: String },
    Paused { track_id: String },
    BufferingChanged { track_id: String, buffering: bool },
    /// Whole-percent progress; only published when the integer value moves.
    ProgressChanged { track_id: String, percent: u8 },
    /// The current track reached its end.
    Completed { track_id: String },
    /// Volume, shuffle or repeat changed.
    SettingsChanged {
        volume: u8,
        shuffle: bool,
        /// `"off"`, `"one"` or `"all"`.
        repeat: String,
    },
    Error {
        track_id: Option<String>,
        message: String,
        /// Whether selecting the track again may succeed.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::TrackChanged { .. } => "Track changed",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::BufferingChanged { .. } => "Buffering state changed",
            PlaybackEvent::ProgressChanged { .. } => "Playback progress changed",
            PlaybackEvent::Completed { .. } => "Track completed",
            PlaybackEvent::SettingsChanged { .. } => "Playback settings changed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events published by the cache manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    TrackCached {
        track_id: String,
        /// Unix epoch milliseconds.
        cached_at: i64,
    },
    TrackUncached { track_id: String },
    /// Age-based eviction ran.
    Cleaned {
        removed_ids: Vec<String>,
        older_than_days: u32,
    },
    SettingsUpdated,
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::TrackCached { .. } => "Track available offline",
            CacheEvent::TrackUncached { .. } => "Track removed from offline cache",
            CacheEvent::Cleaned { .. } => "Old cache entries removed",
            CacheEvent::SettingsUpdated => "Cache settings updated",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events related to local files, favorites and the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    TrackImported {
        track_id: String,
        title: String,
        artist: String,
        /// `"file"` or `"url"`.
        origin: String,
    },
    ImportFailed { name: String, message: String },
    TrackRemoved { track_id: String },
    LocalTracksLoaded { count: usize },
    FavoriteAdded { track_id: String },
    FavoriteRemoved { track_id: String },
    QueueChanged { length: usize },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::TrackImported { .. } => "Track imported",
            LibraryEvent::ImportFailed { .. } => "Import failed",
            LibraryEvent::TrackRemoved { .. } => "Local track removed",
            LibraryEvent::LocalTracksLoaded { .. } => "Local tracks loaded",
            LibraryEvent::FavoriteAdded { .. } => "Added to favorites",
            LibraryEvent::FavoriteRemoved { .. } => "Removed from favorites",
            LibraryEvent::QueueChanged { .. } => "Queue changed",
        }
    }
}

// ============================================================================
// Search Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SearchEvent {
    Started { query: String },
    Completed { query: String, result_count: usize },
    Failed {
        query: String,
        message: String,
        quota_exceeded: bool,
    },
    Cleared,
}

impl SearchEvent {
    fn description(&self) -> &str {
        match self {
            SearchEvent::Started { .. } => "Search started",
            SearchEvent::Completed { .. } => "Search completed",
            SearchEvent::Failed { .. } => "Search failed",
            SearchEvent::Cleared => "Search results cleared",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning is cheap and every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// `capacity` bounds how far a subscriber may fall behind before it sees
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event, returning how many subscribers received it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a receiver for all future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let cache_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Cache(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next matching event.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive; `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(id: &str) -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::Completed {
            track_id: id.to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(completed("a")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Cache(CacheEvent::TrackCached {
            track_id: "abc".to_string(),
            cached_at: 1_700_000_000_000,
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream =
            EventStream::new(bus.subscribe()).filter(|event| matches!(event, CoreEvent::Search(_)));

        bus.emit(completed("a")).ok();
        let search = CoreEvent::Search(SearchEvent::Completed {
            query: "lofi".to_string(),
            result_count: 20,
        });
        bus.emit(search.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), search);
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(completed(&format!("t{}", i))).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let quota = CoreEvent::Search(SearchEvent::Failed {
            query: "x".to_string(),
            message: "quota".to_string(),
            quota_exceeded: true,
        });
        assert_eq!(quota.severity(), EventSeverity::Warning);

        let error = CoreEvent::Playback(PlaybackEvent::Error {
            track_id: None,
            message: "gone".to_string(),
            recoverable: true,
        });
        assert_eq!(error.severity(), EventSeverity::Error);

        let progress = CoreEvent::Playback(PlaybackEvent::ProgressChanged {
            track_id: "a".to_string(),
            percent: 10,
        });
        assert_eq!(progress.severity(), EventSeverity::Debug);
        assert_eq!(progress.description(), "Playback progress changed");
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Cache(CacheEvent::Cleaned {
            removed_ids: vec!["a".to_string(), "b".to_string()],
            older_than_days: 30,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Cache\""));
        assert!(json.contains("\"event\":\"Cleaned\""));

        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let handles: Vec<_> = (0..2)
            .map(|worker| {
                let bus = bus.clone();
                tokio::spawn(async move {
                    for i in 0..10 {
                        bus.emit(completed(&format!("{}-{}", worker, i))).ok();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }
}
