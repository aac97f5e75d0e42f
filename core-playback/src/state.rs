//! Playback state shared by the engine and its observers.

use core_library::TrackMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Volume applied before the user changes it.
pub const DEFAULT_VOLUME: u8 = 80;

/// What happens when the current track ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    /// Restart the current track.
    One,
    All,
}

impl RepeatMode {
    /// off → one → all → off
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a percentage into `[0, 100]`. NaN maps to 0.
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Snapshot of everything the UI renders about playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Snapshot of the selected track; the registry owns the canonical record.
    pub current_track: Option<TrackMetadata>,
    pub is_playing: bool,
    /// 0-100
    pub progress: f64,
    /// 0-100
    pub volume: u8,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub is_buffering: bool,
    /// Seek requested before the backend was ready, as a percentage.
    pub pending_seek: Option<f64>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_track: None,
            is_playing: false,
            progress: 0.0,
            volume: DEFAULT_VOLUME,
            shuffle: false,
            repeat: RepeatMode::Off,
            is_buffering: false,
            pending_seek: None,
        }
    }
}

impl PlaybackState {
    /// Make `track` current: progress restarts at 0 and playback is requested.
    /// A seek queued for the previous track is dropped.
    pub fn select(&mut self, track: TrackMetadata) {
        self.current_track = Some(track);
        self.progress = 0.0;
        self.is_playing = true;
        self.is_buffering = true;
        self.pending_seek = None;
    }

    pub fn has_track(&self) -> bool {
        self.current_track.is_some()
    }

    pub fn current_track_id(&self) -> Option<&core_library::TrackId> {
        self.current_track.as_ref().map(|track| &track.id)
    }

    /// Progress as a whole percentage.
    pub fn progress_percent(&self) -> u8 {
        clamp_percentage(self.progress).round() as u8
    }
}
