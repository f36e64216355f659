//! Time-scripted cues evaluated against a session clock
//!
//! Cues are plain `(fire_at, cue)` pairs kept in firing order. Each step the
//! owner drains the cues that are due; cancelling a whole script is a single
//! `clear`.

use std::time::Duration;

use glam::Vec2;

/// Scripted action in a firework show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    /// Launch the `index`-th heart shell toward `target`
    LaunchHeart { index: usize, target: Vec2 },
    /// Begin fading in the caption
    BeginReveal,
}

#[derive(Debug, Clone, PartialEq)]
struct Scheduled {
    at: Duration,
    cue: Cue,
}

/// Pending cues, ordered by firing time (ties keep insertion order)
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pending: Vec<Scheduled>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `cue` to fire once the clock reaches `at`
    pub fn push(&mut self, at: Duration, cue: Cue) {
        let idx = self.pending.partition_point(|s| s.at <= at);
        self.pending.insert(idx, Scheduled { at, cue });
    }

    /// Remove and return every cue due at `now`, with its scheduled time
    pub fn drain_due(&mut self, now: Duration) -> Vec<(Duration, Cue)> {
        let due = self.pending.partition_point(|s| s.at <= now);
        self.pending
            .drain(..due)
            .map(|s| (s.at, s.cue))
            .collect()
    }

    /// Drop every pending cue
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Heart launches not yet fired
    pub fn pending_launches(&self) -> usize {
        self.pending
            .iter()
            .filter(|s| matches!(s.cue, Cue::LaunchHeart { .. }))
            .count()
    }

    /// Time of the next cue, if any
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.first().map(|s| s.at)
    }
}
