//! Hand-written media backends shared by the playback integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    BlobRecord, BlobStore, EmbeddedPlayer, MediaElement, MediaElementFactory, MediaState,
    MediaStatus, MediaTransport, MemoryBlobStore,
};
use bytes::Bytes;
use chrono::Utc;
use core_library::TrackMetadata;
use core_playback::{
    AdapterEvent, LocalBlobAdapter, OutputDevice, PlaybackEngine, RemoteStreamAdapter,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::Notify;

pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// Transport double
// ============================================================================

#[derive(Debug)]
pub struct FakeTransport {
    pub status: MediaStatus,
    pub volume: u8,
    pub seeks: Vec<Duration>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            status: MediaStatus::idle(),
            volume: 100,
            seeks: Vec::new(),
        }
    }
}

fn set_state(transport: &Mutex<FakeTransport>, state: MediaState) {
    transport.lock().status.state = state;
}

// ============================================================================
// Embedded player double
// ============================================================================

#[derive(Default)]
pub struct FakePlayer {
    pub transport: Mutex<FakeTransport>,
    pub loads: Mutex<Vec<String>>,
    pub stops: Mutex<usize>,
    /// When set, `load` waits for a notification.
    pub gate: Mutex<Option<Arc<Notify>>>,
    pub fail_next_load: AtomicBool,
    pub resolved_duration: Mutex<Option<Duration>>,
}

impl FakePlayer {
    pub fn is_playing(&self) -> bool {
        self.transport.lock().status.state == MediaState::Playing
    }

    pub fn set_state(&self, state: MediaState) {
        set_state(&self.transport, state);
    }

    pub fn gate(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(notify.clone());
        notify
    }
}

impl MediaTransport for FakePlayer {
    fn play(&self) -> BridgeResult<()> {
        set_state(&self.transport, MediaState::Playing);
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        set_state(&self.transport, MediaState::Paused);
        Ok(())
    }

    fn seek_to(&self, position: Duration) -> BridgeResult<()> {
        let mut transport = self.transport.lock();
        transport.status.position = position;
        transport.seeks.push(position);
        Ok(())
    }

    fn set_volume(&self, volume: u8) -> BridgeResult<()> {
        self.transport.lock().volume = volume;
        Ok(())
    }

    fn status(&self) -> MediaStatus {
        self.transport.lock().status
    }
}

#[async_trait]
impl EmbeddedPlayer for FakePlayer {
    async fn load(&self, stream_id: &str) -> BridgeResult<()> {
        self.loads.lock().push(stream_id.to_string());
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_next_load.swap(false, Ordering::SeqCst) {
            return Err(BridgeError::Media(format!("{} is unavailable", stream_id)));
        }
        let mut transport = self.transport.lock();
        transport.status = MediaStatus {
            state: MediaState::Paused,
            position: Duration::ZERO,
            duration: *self.resolved_duration.lock(),
        };
        Ok(())
    }

    fn stop(&self) -> BridgeResult<()> {
        *self.stops.lock() += 1;
        self.transport.lock().status = MediaStatus::idle();
        Ok(())
    }
}

// ============================================================================
// Media element double
// ============================================================================

pub struct FakeElement {
    pub handle: String,
    pub transport: Mutex<FakeTransport>,
    pub revoked: AtomicBool,
}

impl FakeElement {
    pub fn is_playing(&self) -> bool {
        !self.is_revoked() && self.transport.lock().status.state == MediaState::Playing
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }

    pub fn set_state(&self, state: MediaState) {
        set_state(&self.transport, state);
    }

    pub fn set_position(&self, position: Duration) {
        self.transport.lock().status.position = position;
    }
}

impl MediaTransport for FakeElement {
    fn play(&self) -> BridgeResult<()> {
        if self.is_revoked() {
            return Err(BridgeError::Media("handle revoked".to_string()));
        }
        set_state(&self.transport, MediaState::Playing);
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        set_state(&self.transport, MediaState::Paused);
        Ok(())
    }

    fn seek_to(&self, position: Duration) -> BridgeResult<()> {
        let mut transport = self.transport.lock();
        transport.status.position = position;
        transport.seeks.push(position);
        Ok(())
    }

    fn set_volume(&self, volume: u8) -> BridgeResult<()> {
        self.transport.lock().volume = volume;
        Ok(())
    }

    fn status(&self) -> MediaStatus {
        self.transport.lock().status
    }
}

impl MediaElement for FakeElement {
    fn handle(&self) -> &str {
        &self.handle
    }

    fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
        set_state(&self.transport, MediaState::Idle);
    }
}

#[derive(Default)]
pub struct FakeFactory {
    pub elements: Mutex<Vec<Arc<FakeElement>>>,
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeFactory {
    pub fn element(&self, index: usize) -> Arc<FakeElement> {
        self.elements.lock()[index].clone()
    }

    pub fn live_handles(&self) -> usize {
        self.elements
            .lock()
            .iter()
            .filter(|element| !element.is_revoked())
            .count()
    }

    pub fn gate(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(notify.clone());
        notify
    }
}

#[async_trait]
impl MediaElementFactory for FakeFactory {
    async fn open(&self, record: BlobRecord) -> BridgeResult<Arc<dyn MediaElement>> {
        let element = Arc::new(FakeElement {
            handle: format!("blob:{}:{}", record.id, self.elements.lock().len()),
            transport: Mutex::new(FakeTransport {
                status: MediaStatus {
                    state: MediaState::Paused,
                    position: Duration::ZERO,
                    // Local media reports no duration; the stored one applies.
                    duration: None,
                },
                ..Default::default()
            }),
            revoked: AtomicBool::new(false),
        });
        self.elements.lock().push(element.clone());

        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(element)
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub engine: Arc<PlaybackEngine>,
    pub player: Arc<FakePlayer>,
    pub factory: Arc<FakeFactory>,
    pub store: Arc<MemoryBlobStore>,
    pub output: Arc<OutputDevice>,
    pub remote: Arc<RemoteStreamAdapter>,
    pub local: Arc<LocalBlobAdapter>,
    pub events: UnboundedReceiver<AdapterEvent>,
}

impl Harness {
    pub fn new() -> Self {
        let player = Arc::new(FakePlayer::default());
        let factory = Arc::new(FakeFactory::default());
        let store = Arc::new(MemoryBlobStore::new());
        let output = Arc::new(OutputDevice::new());
        let (tx, events) = unbounded_channel();

        let remote = Arc::new(RemoteStreamAdapter::new(
            player.clone(),
            output.clone(),
            tx.clone(),
            POLL_INTERVAL,
        ));
        let local = Arc::new(LocalBlobAdapter::new(
            store.clone(),
            factory.clone(),
            output.clone(),
            tx,
            POLL_INTERVAL,
        ));
        let engine = Arc::new(PlaybackEngine::new(remote.clone(), local.clone()));

        Self {
            engine,
            player,
            factory,
            store,
            output,
            remote,
            local,
            events,
        }
    }

    /// Store a blob and return the matching local track.
    pub async fn local_track(&self, id: &str, duration_secs: f64) -> TrackMetadata {
        let record = BlobRecord {
            id: id.to_string(),
            title: format!("Local {}", id),
            artist: "Me".to_string(),
            duration_secs,
            thumbnail: None,
            mime_type: "audio/mpeg".to_string(),
            data: Bytes::from_static(b"media"),
            size: 5,
            added_at: Utc::now(),
        };
        let track = TrackMetadata::from_blob(&record);
        self.store.put(record).await.unwrap();
        track
    }

    /// Feed every queued adapter event into the engine.
    pub fn pump(&mut self) -> Vec<core_playback::EventOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            outcomes.push(self.engine.handle_event(event));
        }
        outcomes
    }

    /// True when at most one backend is producing output.
    pub fn single_output(&self) -> bool {
        let playing_elements = self
            .factory
            .elements
            .lock()
            .iter()
            .filter(|element| element.is_playing())
            .count();
        playing_elements + usize::from(self.player.is_playing()) <= 1
    }
}

pub fn remote_track(id: &str) -> TrackMetadata {
    TrackMetadata::remote(id, format!("Stream {}", id), "Channel", 200.0)
}
