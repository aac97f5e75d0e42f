//! # Playback Engine
//!
//! Single source of truth for what is playing.
//!
//! The engine owns the [`PlaybackState`], picks the adapter matching the
//! selected track's [`SourceKind`] and folds adapter callbacks into state.
//!
//! ## Selection
//!
//! `select_track` runs in two synchronous halves around the asynchronous
//! attach:
//!
//! 1. cancel the previous session, detach its adapter, reset state and open
//!    a new session;
//! 2. after attach resolves, apply the result only if the session is still
//!    the live one.
//!
//! A superseded selection therefore never touches state, and a failed one
//! leaves the track selected but stopped with buffering cleared.
//!
//! ## Callbacks
//!
//! [`PlaybackEngine::handle_event`] discards events whose session token is
//! not the live one. Queue advancement is not the engine's business: an
//! ended track yields [`EventOutcome::AdvanceRequested`] and the owner picks
//! the next track.

use crate::error::{PlaybackError, Result};
use crate::state::{clamp_percentage, PlaybackState, RepeatMode};
use crate::traits::{AdapterEvent, AdapterEventKind, Attached, Playable, Session, SessionToken};
use core_library::{SourceKind, TrackMetadata};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What the engine did with an adapter callback.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Applied,
    /// Stale session or nothing selected.
    Discarded,
    /// The track ended and repeat is not `one`; the owner should advance.
    AdvanceRequested,
    /// The track ended with repeat `one` and was restarted from 0.
    Restarted,
    /// First playback start of a remote track in this session; the owner
    /// may offer it to the cache.
    CacheProposed(TrackMetadata),
}

struct ActiveSession {
    session: Session,
    kind: SourceKind,
    ready: bool,
    failed: bool,
    proposed: bool,
}

pub struct PlaybackEngine {
    remote: Arc<dyn Playable>,
    local: Arc<dyn Playable>,
    state: RwLock<PlaybackState>,
    active: Mutex<Option<ActiveSession>>,
    next_token: AtomicU64,
    event_bus: Option<EventBus>,
}

impl PlaybackEngine {
    pub fn new(remote: Arc<dyn Playable>, local: Arc<dyn Playable>) -> Self {
        Self {
            remote,
            local,
            state: RwLock::new(PlaybackState::default()),
            active: Mutex::new(None),
            next_token: AtomicU64::new(1),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_volume(self, volume: u8) -> Self {
        self.state.write().volume = volume.min(100);
        self
    }

    fn adapter_for(&self, kind: SourceKind) -> &Arc<dyn Playable> {
        match kind {
            SourceKind::Remote => &self.remote,
            SourceKind::Local => &self.local,
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is fine.
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }

    fn emit_settings(&self, state: &PlaybackState) {
        self.emit(PlaybackEvent::SettingsChanged {
            volume: state.volume,
            shuffle: state.shuffle,
            repeat: state.repeat.to_string(),
        });
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// Snapshot of the current state.
    pub fn state(&self) -> PlaybackState {
        self.state.read().clone()
    }

    pub fn current_track(&self) -> Option<TrackMetadata> {
        self.state.read().current_track.clone()
    }

    /// Token of the live session, if any.
    pub fn current_session(&self) -> Option<SessionToken> {
        self.active.lock().as_ref().map(|a| a.session.token())
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Make `track` current and attach the matching adapter.
    ///
    /// State is reset synchronously (progress 0, playing). A selection
    /// superseded while attaching returns `Ok(())` without touching state.
    #[instrument(skip(self, track), fields(track_id = %track.id, kind = %track.kind))]
    pub async fn select_track(&self, track: TrackMetadata) -> Result<()> {
        let session = self.begin_session(&track);
        let adapter = self.adapter_for(track.kind).clone();

        let result = adapter.attach(&track, session.clone()).await;
        self.finish_attach(&session, adapter.as_ref(), result)
    }

    fn begin_session(&self, track: &TrackMetadata) -> Session {
        let token = SessionToken::new(self.next_token.fetch_add(1, Ordering::SeqCst));
        let session = Session::new(token, track.id.clone());

        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            previous.session.cancel();
            self.adapter_for(previous.kind).detach();
            debug!(previous = %previous.session.token(), "Previous session torn down");
        }
        *active = Some(ActiveSession {
            session: session.clone(),
            kind: track.kind,
            ready: false,
            failed: false,
            proposed: false,
        });

        self.state.write().select(track.clone());
        drop(active);

        info!(session = %token, title = %track.title, "Track selected");
        self.emit(PlaybackEvent::TrackChanged {
            track_id: track.id.to_string(),
            title: track.title.clone(),
            source_kind: track.kind.to_string(),
        });
        session
    }

    fn finish_attach(
        &self,
        session: &Session,
        adapter: &dyn Playable,
        result: Result<Attached>,
    ) -> Result<()> {
        let mut active = self.active.lock();
        let live = active
            .as_mut()
            .filter(|a| a.session.token() == session.token());
        let Some(live) = live else {
            debug!(session = %session.token(), "Attach finished for a superseded session");
            return Ok(());
        };

        let track_id = session.track_id().to_string();
        match result {
            Ok(attached) => {
                live.ready = true;
                let mut state = self.state.write();
                state.is_buffering = false;
                if let (Some(track), Some(duration)) =
                    (state.current_track.as_mut(), attached.duration_secs)
                {
                    track.duration_secs = duration;
                }

                if let Err(e) = adapter.set_volume(state.volume) {
                    warn!(error = %e, "Adapter rejected volume");
                }
                if let Some(percent) = state.pending_seek.take() {
                    if let Err(e) = adapter.seek(percent) {
                        warn!(error = %e, "Adapter rejected queued seek");
                    }
                }
                let start = if state.is_playing {
                    adapter.play()
                } else {
                    adapter.pause()
                };
                let playing = state.is_playing;
                drop(state);
                drop(active);

                self.emit(PlaybackEvent::BufferingChanged {
                    track_id: track_id.clone(),
                    buffering: false,
                });
                match start {
                    Ok(()) if playing => self.emit(PlaybackEvent::Started { track_id }),
                    Ok(()) => {}
                    Err(e) => return Err(self.fail_live_session(session.token(), e)),
                }
                Ok(())
            }
            Err(e) => {
                drop(active);
                Err(self.fail_live_session(session.token(), e))
            }
        }
    }

    /// Stop the live session after a backend failure. The track stays
    /// selected; playing and buffering are cleared.
    fn fail_live_session(&self, token: SessionToken, error: PlaybackError) -> PlaybackError {
        let mut active = self.active.lock();
        if let Some(live) = active.as_mut().filter(|a| a.session.token() == token) {
            live.ready = false;
            live.failed = true;
            self.adapter_for(live.kind).detach();
        }
        let mut state = self.state.write();
        state.is_playing = false;
        state.is_buffering = false;
        let track_id = state.current_track_id().map(|id| id.to_string());
        drop(state);
        drop(active);

        warn!(error = %error, "Playback failed");
        self.emit(PlaybackEvent::Error {
            track_id,
            message: error.to_string(),
            recoverable: error.is_transient(),
        });
        error
    }

    /// Tear down the live session and forget the current track.
    pub fn stop(&self) {
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            previous.session.cancel();
            self.adapter_for(previous.kind).detach();
        }
        let mut state = self.state.write();
        state.current_track = None;
        state.is_playing = false;
        state.is_buffering = false;
        state.progress = 0.0;
        state.pending_seek = None;
        info!("Playback stopped");
    }

    // ========================================================================
    // Transport intents
    // ========================================================================

    fn ready_adapter(&self) -> Option<&Arc<dyn Playable>> {
        self.active
            .lock()
            .as_ref()
            .filter(|a| a.ready)
            .map(|a| self.adapter_for(a.kind))
    }

    fn session_failed(&self) -> bool {
        self.active.lock().as_ref().is_some_and(|a| a.failed)
    }

    /// Flip play/pause. No-op without a current track.
    ///
    /// After a backend failure nothing is attached, so the state is left
    /// paused and [`PlaybackError::SessionFailed`] is returned; see
    /// [`PlaybackEngine::reattach_current`].
    pub fn toggle_play_pause(&self) -> Result<()> {
        if self.session_failed() {
            return Err(PlaybackError::SessionFailed);
        }

        let (playing, track_id) = {
            let mut state = self.state.write();
            let Some(track_id) = state.current_track_id().map(|id| id.to_string()) else {
                return Ok(());
            };
            state.is_playing = !state.is_playing;
            (state.is_playing, track_id)
        };

        if let Some(adapter) = self.ready_adapter() {
            let forwarded = if playing {
                adapter.play()
            } else {
                adapter.pause()
            };
            if let Err(e) = forwarded {
                let token = self.current_session();
                return Err(match token {
                    Some(token) => self.fail_live_session(token, e),
                    None => e,
                });
            }
        }

        if playing {
            self.emit(PlaybackEvent::Started { track_id });
        } else {
            self.emit(PlaybackEvent::Paused { track_id });
        }
        Ok(())
    }

    /// Select the current track again in a fresh session.
    ///
    /// Returns `Ok(false)` when there is no current track.
    pub async fn reattach_current(&self) -> Result<bool> {
        let Some(track) = self.current_track() else {
            return Ok(false);
        };
        debug!(track_id = %track.id, "Reattaching current track");
        self.select_track(track).await?;
        Ok(true)
    }

    /// Seek to `percentage`, clamped to `[0, 100]`. Before the adapter is
    /// ready the request is kept and applied once it is.
    pub fn seek(&self, percentage: f64) -> Result<f64> {
        let percent = clamp_percentage(percentage);
        {
            let mut state = self.state.write();
            if !state.has_track() {
                return Ok(percent);
            }
            state.progress = percent;
            state.pending_seek = Some(percent);
        }

        if let Some(adapter) = self.ready_adapter() {
            self.state.write().pending_seek = None;
            adapter.seek(percent)?;
        }
        debug!(percent, "Seek requested");
        Ok(percent)
    }

    pub fn set_volume(&self, volume: u8) -> Result<()> {
        let volume = volume.min(100);
        self.state.write().volume = volume;
        if let Some(adapter) = self.ready_adapter() {
            adapter.set_volume(volume)?;
        }
        self.emit_settings(&self.state.read());
        Ok(())
    }

    pub fn toggle_shuffle(&self) -> bool {
        let mut state = self.state.write();
        state.shuffle = !state.shuffle;
        let shuffle = state.shuffle;
        self.emit_settings(&state);
        shuffle
    }

    pub fn cycle_repeat(&self) -> RepeatMode {
        let mut state = self.state.write();
        state.repeat = state.repeat.next();
        let repeat = state.repeat;
        self.emit_settings(&state);
        repeat
    }

    // ========================================================================
    // Adapter callbacks
    // ========================================================================

    fn is_live(&self, token: SessionToken) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|a| a.session.token() == token)
    }

    /// Fold an adapter callback into state.
    pub fn handle_event(&self, event: AdapterEvent) -> EventOutcome {
        match event.kind {
            AdapterEventKind::Progress(percent) => self.report_progress(event.session, percent),
            AdapterEventKind::Buffering(buffering) => {
                self.report_buffering(event.session, buffering)
            }
            AdapterEventKind::PlayingChanged(playing) => {
                self.report_playing_changed(event.session, playing)
            }
            AdapterEventKind::Ended => self.report_ended(event.session),
            AdapterEventKind::Failed(message) => self.report_failure(event.session, message),
        }
    }

    pub fn report_progress(&self, session: SessionToken, percent: f64) -> EventOutcome {
        if !self.is_live(session) {
            return EventOutcome::Discarded;
        }
        let mut state = self.state.write();
        let before = state.progress_percent();
        state.progress = clamp_percentage(percent);
        let after = state.progress_percent();
        let track_id = state.current_track_id().map(|id| id.to_string());
        drop(state);

        if before != after {
            if let Some(track_id) = track_id {
                self.emit(PlaybackEvent::ProgressChanged {
                    track_id,
                    percent: after,
                });
            }
        }
        EventOutcome::Applied
    }

    pub fn report_buffering(&self, session: SessionToken, buffering: bool) -> EventOutcome {
        if !self.is_live(session) {
            return EventOutcome::Discarded;
        }
        let mut state = self.state.write();
        if state.is_buffering == buffering {
            return EventOutcome::Applied;
        }
        state.is_buffering = buffering;
        let track_id = state.current_track_id().map(|id| id.to_string());
        drop(state);

        if let Some(track_id) = track_id {
            self.emit(PlaybackEvent::BufferingChanged {
                track_id,
                buffering,
            });
        }
        EventOutcome::Applied
    }

    pub fn report_playing_changed(&self, session: SessionToken, playing: bool) -> EventOutcome {
        let mut active = self.active.lock();
        let Some(live) = active.as_mut().filter(|a| a.session.token() == session) else {
            return EventOutcome::Discarded;
        };

        let propose = playing && live.kind == SourceKind::Remote && !live.proposed;
        if propose {
            live.proposed = true;
        }

        let mut state = self.state.write();
        let changed = state.is_playing != playing;
        state.is_playing = playing;
        if playing {
            state.is_buffering = false;
        }
        let track = state.current_track.clone();
        drop(state);
        drop(active);

        if let (true, Some(track)) = (changed, track.as_ref()) {
            let track_id = track.id.to_string();
            if playing {
                self.emit(PlaybackEvent::Started { track_id });
            } else {
                self.emit(PlaybackEvent::Paused { track_id });
            }
        }

        match track {
            Some(track) if propose && !track.is_cached() => EventOutcome::CacheProposed(track),
            _ => EventOutcome::Applied,
        }
    }

    pub fn report_ended(&self, session: SessionToken) -> EventOutcome {
        let adapter = {
            let active = self.active.lock();
            match active.as_ref().filter(|a| a.session.token() == session) {
                Some(live) => self.adapter_for(live.kind).clone(),
                None => return EventOutcome::Discarded,
            }
        };

        let mut state = self.state.write();
        let Some(track_id) = state.current_track_id().map(|id| id.to_string()) else {
            return EventOutcome::Discarded;
        };

        if state.repeat == RepeatMode::One {
            state.progress = 0.0;
            state.is_playing = true;
            drop(state);

            let restarted = adapter.seek(0.0).and_then(|_| adapter.play());
            if let Err(e) = restarted {
                self.fail_live_session(session, e);
                return EventOutcome::Applied;
            }
            debug!(track_id = %track_id, "Repeating track");
            return EventOutcome::Restarted;
        }

        state.progress = 100.0;
        state.is_playing = false;
        drop(state);

        self.emit(PlaybackEvent::Completed { track_id });
        EventOutcome::AdvanceRequested
    }

    /// A backend failure after attach: playback stops, the engine stays
    /// usable.
    pub fn report_failure(&self, session: SessionToken, message: String) -> EventOutcome {
        if !self.is_live(session) {
            return EventOutcome::Discarded;
        }
        self.fail_live_session(session, PlaybackError::SourceUnavailable(message));
        EventOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Adapter that attaches instantly and records nothing.
    struct InstantAdapter {
        kind: SourceKind,
        attached: Mutex<bool>,
    }

    impl InstantAdapter {
        fn new(kind: SourceKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                attached: Mutex::new(false),
            })
        }
    }

    #[async_trait]
    impl Playable for InstantAdapter {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn attach(&self, _track: &TrackMetadata, _session: Session) -> Result<Attached> {
            *self.attached.lock() = true;
            Ok(Attached::default())
        }

        fn play(&self) -> Result<()> {
            Ok(())
        }

        fn pause(&self) -> Result<()> {
            Ok(())
        }

        fn seek(&self, _percentage: f64) -> Result<()> {
            Ok(())
        }

        fn set_volume(&self, _volume: u8) -> Result<()> {
            Ok(())
        }

        fn detach(&self) {
            *self.attached.lock() = false;
        }

        fn is_attached(&self) -> bool {
            *self.attached.lock()
        }
    }

    fn engine() -> PlaybackEngine {
        PlaybackEngine::new(
            InstantAdapter::new(SourceKind::Remote),
            InstantAdapter::new(SourceKind::Local),
        )
    }

    #[tokio::test]
    async fn test_select_resets_state() {
        let engine = engine();
        engine
            .select_track(TrackMetadata::remote("a", "A", "x", 100.0))
            .await
            .unwrap();
        engine.seek(40.0).unwrap();

        engine
            .select_track(TrackMetadata::remote("b", "B", "x", 100.0))
            .await
            .unwrap();
        let state = engine.state();
        assert_eq!(state.progress, 0.0);
        assert!(state.is_playing);
        assert!(!state.is_buffering);
    }

    #[tokio::test]
    async fn test_stale_events_are_discarded() {
        let engine = engine();
        engine
            .select_track(TrackMetadata::remote("a", "A", "x", 100.0))
            .await
            .unwrap();
        let old = engine.current_session().unwrap();

        engine
            .select_track(TrackMetadata::remote("b", "B", "x", 100.0))
            .await
            .unwrap();

        assert_eq!(engine.report_progress(old, 50.0), EventOutcome::Discarded);
        assert_eq!(engine.report_ended(old), EventOutcome::Discarded);
        assert_eq!(engine.state().progress, 0.0);
    }

    #[test]
    fn test_toggle_without_track_is_noop() {
        let engine = engine();
        engine.toggle_play_pause().unwrap();
        assert!(!engine.state().is_playing);
        assert_eq!(engine.seek(150.0).unwrap(), 100.0);
        assert_eq!(engine.state().progress, 0.0);
    }
}
