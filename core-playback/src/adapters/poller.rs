//! Status polling shared by both adapters.
//!
//! Neither backend pushes position updates, so a task polls
//! [`MediaTransport::status`] on a fixed interval and turns changes into
//! [`AdapterEvent`]s. The task ends when the session is cancelled or the
//! event receiver is gone.

use crate::traits::{AdapterEvent, AdapterEventKind, Session};
use bridge_traits::{MediaState, MediaStatus, MediaTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Debug, Default)]
struct Observed {
    playing: bool,
    buffering: bool,
    ended: bool,
    percent: Option<f64>,
}

/// Percentage of `status.position` over the resolved duration, falling back
/// to `fallback_secs` when the backend has not resolved one.
pub(crate) fn progress_percent(status: &MediaStatus, fallback_secs: f64) -> Option<f64> {
    let duration = status
        .duration
        .map(|d| d.as_secs_f64())
        .filter(|secs| *secs > 0.0)
        .unwrap_or(fallback_secs);
    if !(duration.is_finite() && duration > 0.0) {
        return None;
    }
    Some((status.position.as_secs_f64() / duration * 100.0).clamp(0.0, 100.0))
}

impl Observed {
    fn diff(&mut self, status: &MediaStatus, fallback_secs: f64) -> Vec<AdapterEventKind> {
        let mut changes = Vec::new();

        let ended = status.state == MediaState::Ended;
        if ended {
            if !self.ended {
                changes.push(AdapterEventKind::Ended);
            }
            self.ended = true;
            self.playing = false;
            self.buffering = false;
            return changes;
        }
        self.ended = false;

        let buffering = status.state == MediaState::Buffering;
        if buffering != self.buffering {
            self.buffering = buffering;
            changes.push(AdapterEventKind::Buffering(buffering));
        }

        let playing = status.state == MediaState::Playing;
        if playing != self.playing {
            self.playing = playing;
            changes.push(AdapterEventKind::PlayingChanged(playing));
        }

        if let Some(percent) = progress_percent(status, fallback_secs) {
            if self.percent != Some(percent) {
                self.percent = Some(percent);
                changes.push(AdapterEventKind::Progress(percent));
            }
        }

        changes
    }
}

/// Spawn the polling task for `session`.
pub(crate) fn spawn_status_poller<T>(
    transport: Arc<T>,
    session: Session,
    fallback_secs: f64,
    interval: Duration,
    events: UnboundedSender<AdapterEvent>,
) -> JoinHandle<()>
where
    T: MediaTransport + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut observed = Observed::default();
        loop {
            tokio::select! {
                _ = session.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let status = transport.status();
            for kind in observed.diff(&status, fallback_secs) {
                trace!(session = %session.token(), event = ?kind, "Adapter status changed");
                if events.send(session.event(kind)).is_err() {
                    return;
                }
            }
        }
        trace!(session = %session.token(), "Status poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: MediaState, position: u64, duration: Option<u64>) -> MediaStatus {
        MediaStatus {
            state,
            position: Duration::from_secs(position),
            duration: duration.map(Duration::from_secs),
        }
    }

    #[test]
    fn test_progress_uses_resolved_duration_then_fallback() {
        assert_eq!(
            progress_percent(&status(MediaState::Playing, 50, Some(200)), 100.0),
            Some(25.0)
        );
        assert_eq!(
            progress_percent(&status(MediaState::Playing, 50, None), 100.0),
            Some(50.0)
        );
        assert_eq!(progress_percent(&status(MediaState::Playing, 5, None), 0.0), None);
    }

    #[test]
    fn test_diff_reports_only_changes() {
        let mut observed = Observed::default();

        let first = observed.diff(&status(MediaState::Buffering, 0, Some(100)), 0.0);
        assert_eq!(
            first,
            vec![AdapterEventKind::Buffering(true), AdapterEventKind::Progress(0.0)]
        );

        let second = observed.diff(&status(MediaState::Playing, 10, Some(100)), 0.0);
        assert_eq!(
            second,
            vec![
                AdapterEventKind::Buffering(false),
                AdapterEventKind::PlayingChanged(true),
                AdapterEventKind::Progress(10.0),
            ]
        );

        assert!(observed
            .diff(&status(MediaState::Playing, 10, Some(100)), 0.0)
            .is_empty());
    }

    #[test]
    fn test_ended_reported_once() {
        let mut observed = Observed::default();
        observed.diff(&status(MediaState::Playing, 99, Some(100)), 0.0);

        let ended = observed.diff(&status(MediaState::Ended, 100, Some(100)), 0.0);
        assert_eq!(ended, vec![AdapterEventKind::Ended]);
        assert!(observed
            .diff(&status(MediaState::Ended, 100, Some(100)), 0.0)
            .is_empty());

        // Restart after repeat-one
        let restarted = observed.diff(&status(MediaState::Playing, 0, Some(100)), 0.0);
        assert!(restarted.contains(&AdapterEventKind::PlayingChanged(true)));
    }
}
