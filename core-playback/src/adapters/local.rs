//! Local-blob adapter.
//!
//! Resolves a track id through the blob store and plays it through a
//! revocable [`MediaElement`]. Exactly one element is alive per adapter: the
//! previous one is revoked on re-attach and on detach, and an element opened
//! for a session that was cancelled meanwhile is revoked immediately.

use crate::adapters::output::OutputDevice;
use crate::adapters::poller::spawn_status_poller;
use crate::error::{PlaybackError, Result};
use crate::traits::{AdapterEvent, Attached, Playable, Session};
use async_trait::async_trait;
use bridge_traits::{BlobStore, MediaElement, MediaElementFactory};
use core_library::{SourceKind, TrackMetadata};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

struct ActiveElement {
    session: Session,
    element: Arc<dyn MediaElement>,
    /// Duration stored at import time.
    stored_secs: f64,
    poller: JoinHandle<()>,
}

impl ActiveElement {
    fn release(self) {
        self.session.cancel();
        self.poller.abort();
        self.element.revoke();
        debug!(handle = %self.element.handle(), "Revoked media handle");
    }
}

pub struct LocalBlobAdapter {
    store: Arc<dyn BlobStore>,
    factory: Arc<dyn MediaElementFactory>,
    output: Arc<OutputDevice>,
    events: UnboundedSender<AdapterEvent>,
    poll_interval: Duration,
    active: Mutex<Option<ActiveElement>>,
}

impl LocalBlobAdapter {
    pub fn new(
        store: Arc<dyn BlobStore>,
        factory: Arc<dyn MediaElementFactory>,
        output: Arc<OutputDevice>,
        events: UnboundedSender<AdapterEvent>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            factory,
            output,
            events,
            poll_interval,
            active: Mutex::new(None),
        }
    }

    fn with_element<T>(&self, f: impl FnOnce(&ActiveElement) -> Result<T>) -> Result<T> {
        match self.active.lock().as_ref() {
            Some(active) => f(active),
            None => Err(PlaybackError::NoTrackLoaded),
        }
    }
}

#[async_trait]
impl Playable for LocalBlobAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    #[instrument(skip(self, track, session), fields(track_id = %track.id, session = %session.token()))]
    async fn attach(&self, track: &TrackMetadata, session: Session) -> Result<Attached> {
        let record = tokio::select! {
            biased;
            _ = session.cancelled() => return Err(PlaybackError::Cancelled),
            record = self.store.get(track.id.as_str()) => record?,
        };
        let record = record.ok_or_else(|| PlaybackError::TrackNotFound(track.id.to_string()))?;
        let stored_secs = if record.duration_secs > 0.0 {
            record.duration_secs
        } else {
            track.duration_secs
        };

        // Not raced against cancellation: a handle created for a stale
        // session must still be seen here and revoked.
        let element = self.factory.open(record).await.map_err(|e| {
            error!(error = %e, "Failed to open media element");
            PlaybackError::SourceUnavailable(e.to_string())
        })?;

        let mut active = self.active.lock();
        if session.is_cancelled() {
            warn!("Session cancelled while opening media, revoking handle");
            element.revoke();
            return Err(PlaybackError::Cancelled);
        }
        if let Err(e) = self.output.claim(SourceKind::Local, session.token()) {
            element.revoke();
            return Err(e);
        }
        if let Some(previous) = active.take() {
            previous.release();
        }

        let duration_secs = element
            .status()
            .duration
            .map(|d| d.as_secs_f64())
            .filter(|secs| *secs > 0.0);
        let poller = spawn_status_poller(
            element.clone(),
            session.clone(),
            stored_secs,
            self.poll_interval,
            self.events.clone(),
        );
        debug!(handle = %element.handle(), ?duration_secs, "Local media attached");
        *active = Some(ActiveElement {
            session,
            element,
            stored_secs,
            poller,
        });

        Ok(Attached {
            duration_secs: duration_secs.or(Some(stored_secs).filter(|secs| *secs > 0.0)),
        })
    }

    fn play(&self) -> Result<()> {
        self.with_element(|active| Ok(active.element.play()?))
    }

    fn pause(&self) -> Result<()> {
        self.with_element(|active| Ok(active.element.pause()?))
    }

    fn seek(&self, percentage: f64) -> Result<()> {
        self.with_element(|active| {
            let duration = active
                .element
                .status()
                .duration
                .map(|d| d.as_secs_f64())
                .filter(|secs| *secs > 0.0)
                .unwrap_or(active.stored_secs);
            let target = duration * percentage.clamp(0.0, 100.0) / 100.0;
            if !target.is_finite() {
                return Ok(());
            }
            Ok(active
                .element
                .seek_to(Duration::from_secs_f64(target.max(0.0)))?)
        })
    }

    fn set_volume(&self, volume: u8) -> Result<()> {
        self.with_element(|active| Ok(active.element.set_volume(volume.min(100))?))
    }

    fn detach(&self) {
        let Some(active) = self.active.lock().take() else {
            return;
        };
        if let Err(e) = active.element.pause() {
            warn!(error = %e, "Failed to pause media element before revoking");
        }
        active.release();
        self.output.release(SourceKind::Local);
    }

    fn is_attached(&self) -> bool {
        self.active.lock().is_some()
    }
}
