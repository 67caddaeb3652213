/// Playback seams - the one-shot timer and the sample trigger the loop drives
use std::time::{Duration, Instant};

use super::Instrument;

/// Schedules the next run of the sequencer loop. Single-shot: the loop re-arms
/// it on every tick.
pub trait Timer {
    fn schedule_once(&mut self, delay: Duration);
}

/// Something that can play a preloaded clip per instrument.
pub trait SamplePlayer {
    /// Whether the instrument's clip was preloaded successfully.
    fn is_loaded(&self, instrument: Instrument) -> bool;

    /// Fire-and-forget playback; repeated triggers overlap.
    fn trigger(&mut self, instrument: Instrument);
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub step: usize,
    pub triggered: Vec<Instrument>,
    pub interval: Duration,
}

/// Timer polled from the UI thread once per frame.
///
/// Holds at most one pending deadline; re-arming replaces it.
#[derive(Debug, Default)]
pub struct FrameTimer {
    deadline: Option<Instant>,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns true, and disarms, when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

impl Timer for FrameTimer {
    fn schedule_once(&mut self, delay: Duration) {
        self.schedule_at(Instant::now() + delay);
    }
}
