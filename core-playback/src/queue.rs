//! # Queue Manager
//!
//! Explicit FIFO of tracks the user asked to hear next. Forward advancement
//! drains the queue before it falls back to the active display list;
//! backward advancement never consults the queue.

use core_library::{TrackId, TrackMetadata};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug)]
pub struct QueueManager {
    queue: VecDeque<TrackMetadata>,
    rng: StdRng,
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueManager {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic shuffle for tests and replays.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn enqueue(&mut self, track: TrackMetadata) {
        debug!(track_id = %track.id, position = self.queue.len(), "Track queued");
        self.queue.push_back(track);
    }

    /// Remove every queued occurrence of `id`. Returns whether any was found.
    pub fn remove(&mut self, id: &TrackId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|track| &track.id != id);
        before != self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn snapshot(&self) -> Vec<TrackMetadata> {
        self.queue.iter().cloned().collect()
    }

    /// Pick the track to play next.
    ///
    /// Forward: the queue head if there is one. Otherwise, within `list`:
    /// a uniformly random index when shuffling (the current track may come
    /// up again), else the neighbour of `current` in `direction`, wrapping at
    /// both ends. A current track absent from `list` counts as index -1, so
    /// forward lands on the first entry and backward on the last.
    ///
    /// Returns `None` when there is nothing to play.
    pub fn advance(
        &mut self,
        direction: Direction,
        list: &[TrackMetadata],
        current: Option<&TrackId>,
        shuffle: bool,
    ) -> Option<TrackMetadata> {
        if direction == Direction::Forward {
            if let Some(next) = self.queue.pop_front() {
                debug!(track_id = %next.id, remaining = self.queue.len(), "Advancing from queue");
                return Some(next);
            }
        }

        if list.is_empty() {
            return None;
        }

        let len = list.len();
        let index = current.and_then(|id| list.iter().position(|track| &track.id == id));
        let next = if shuffle {
            self.rng.gen_range(0..len)
        } else {
            match (direction, index) {
                (Direction::Forward, Some(i)) => (i + 1) % len,
                (Direction::Forward, None) | (Direction::Backward, None) => 0,
                (Direction::Backward, Some(0)) => len - 1,
                (Direction::Backward, Some(i)) => i - 1,
            }
        };

        Some(list[next].clone())
    }
}
