//! Remote-stream adapter over the embeddable platform player.

use crate::adapters::output::OutputDevice;
use crate::adapters::poller::spawn_status_poller;
use crate::error::{PlaybackError, Result};
use crate::traits::{AdapterEvent, Attached, Playable, Session};
use async_trait::async_trait;
use bridge_traits::EmbeddedPlayer;
use core_library::{SourceKind, TrackMetadata};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

struct ActiveStream {
    session: Session,
    /// Duration from search metadata, used until the player resolves one.
    fallback_secs: f64,
    poller: JoinHandle<()>,
}

pub struct RemoteStreamAdapter {
    player: Arc<dyn EmbeddedPlayer>,
    output: Arc<OutputDevice>,
    events: UnboundedSender<AdapterEvent>,
    poll_interval: Duration,
    active: Mutex<Option<ActiveStream>>,
}

impl RemoteStreamAdapter {
    pub fn new(
        player: Arc<dyn EmbeddedPlayer>,
        output: Arc<OutputDevice>,
        events: UnboundedSender<AdapterEvent>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            player,
            output,
            events,
            poll_interval,
            active: Mutex::new(None),
        }
    }

    fn duration_secs(&self, fallback_secs: f64) -> f64 {
        self.player
            .status()
            .duration
            .map(|d| d.as_secs_f64())
            .filter(|secs| *secs > 0.0)
            .unwrap_or(fallback_secs)
    }

    fn with_active<T>(&self, f: impl FnOnce(&ActiveStream) -> Result<T>) -> Result<T> {
        match self.active.lock().as_ref() {
            Some(active) => f(active),
            None => Err(PlaybackError::NoTrackLoaded),
        }
    }
}

#[async_trait]
impl Playable for RemoteStreamAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    #[instrument(skip(self, track, session), fields(track_id = %track.id, session = %session.token()))]
    async fn attach(&self, track: &TrackMetadata, session: Session) -> Result<Attached> {
        let loaded = tokio::select! {
            biased;
            _ = session.cancelled() => return Err(PlaybackError::Cancelled),
            loaded = self.player.load(track.id.as_str()) => loaded,
        };

        // The player is shared between sessions; a superseded load must not
        // touch it, the newer session owns it now.
        if session.is_cancelled() {
            return Err(PlaybackError::Cancelled);
        }
        if let Err(e) = loaded {
            error!(error = %e, "Embedded player failed to load stream");
            return Err(PlaybackError::SourceUnavailable(e.to_string()));
        }

        let mut active = self.active.lock();
        if session.is_cancelled() {
            return Err(PlaybackError::Cancelled);
        }
        self.output.claim(SourceKind::Remote, session.token())?;
        if let Some(previous) = active.take() {
            previous.session.cancel();
            previous.poller.abort();
        }

        let duration_secs = self
            .player
            .status()
            .duration
            .map(|d| d.as_secs_f64())
            .filter(|secs| *secs > 0.0);
        let poller = spawn_status_poller(
            self.player.clone(),
            session.clone(),
            track.duration_secs,
            self.poll_interval,
            self.events.clone(),
        );
        *active = Some(ActiveStream {
            session,
            fallback_secs: track.duration_secs,
            poller,
        });

        debug!(?duration_secs, "Remote stream attached");
        Ok(Attached { duration_secs })
    }

    fn play(&self) -> Result<()> {
        self.with_active(|_| Ok(self.player.play()?))
    }

    fn pause(&self) -> Result<()> {
        self.with_active(|_| Ok(self.player.pause()?))
    }

    fn seek(&self, percentage: f64) -> Result<()> {
        self.with_active(|active| {
            let duration = self.duration_secs(active.fallback_secs);
            let target = duration * percentage.clamp(0.0, 100.0) / 100.0;
            if !target.is_finite() {
                return Ok(());
            }
            Ok(self.player.seek_to(Duration::from_secs_f64(target.max(0.0)))?)
        })
    }

    fn set_volume(&self, volume: u8) -> Result<()> {
        self.with_active(|_| Ok(self.player.set_volume(volume.min(100))?))
    }

    fn detach(&self) {
        let Some(active) = self.active.lock().take() else {
            return;
        };
        active.session.cancel();
        active.poller.abort();
        if let Err(e) = self.player.stop() {
            error!(error = %e, "Failed to stop embedded player");
        }
        self.output.release(SourceKind::Remote);
        debug!(session = %active.session.token(), "Remote stream detached");
    }

    fn is_attached(&self) -> bool {
        self.active.lock().is_some()
    }
}
