/// Core sequencer logic - grid state, tempo and the self-scheduling step loop
use std::time::Duration;

use tracing::debug;

pub mod playback;

use playback::{SamplePlayer, Tick, Timer};

/// Steps per measure.
pub const STEPS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Kick,
    Snare,
    Hat,
}

impl Instrument {
    pub const COUNT: usize = 3;

    /// Display order, top row first.
    pub const ALL: [Instrument; Self::COUNT] =
        [Instrument::Kick, Instrument::Snare, Instrument::Hat];

    pub fn index(self) -> usize {
        match self {
            Instrument::Kick => 0,
            Instrument::Snare => 1,
            Instrument::Hat => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Instrument::Kick => "K",
            Instrument::Snare => "S",
            Instrument::Hat => "H",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Instrument::Kick => "kick.wav",
            Instrument::Snare => "snare.wav",
            Instrument::Hat => "hat.wav",
        }
    }
}

/// On/off state for every (instrument, step) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepGrid {
    cells: [[bool; STEPS]; Instrument::COUNT],
}

impl StepGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self, instrument: Instrument, step: usize) -> bool {
        self.cells[instrument.index()]
            .get(step)
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, instrument: Instrument, step: usize, value: bool) {
        if let Some(cell) = self.cells[instrument.index()].get_mut(step) {
            *cell = value;
        }
    }

    pub fn toggle(&mut self, instrument: Instrument, step: usize) {
        let current = self.is_on(instrument, step);
        self.set(instrument, step, !current);
    }

    pub fn clear(&mut self) {
        self.cells = Default::default();
    }
}

/// Tempo as set by the slider, always within `[MIN_BPM, MAX_BPM]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tempo(f32);

impl Tempo {
    pub const MIN_BPM: f32 = 40.0;
    pub const MAX_BPM: f32 = 200.0;
    pub const DEFAULT_BPM: f32 = 120.0;

    pub fn new(bpm: f32) -> Self {
        if bpm.is_nan() {
            return Self::default();
        }
        Self(bpm.clamp(Self::MIN_BPM, Self::MAX_BPM))
    }

    pub fn bpm(self) -> f32 {
        self.0
    }

    /// Time between two steps: `30 / bpm` seconds.
    pub fn interval(self) -> Duration {
        Duration::from_secs_f64(30.0 / self.0 as f64)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(Self::DEFAULT_BPM)
    }
}

/// Playback context: transport, cursor and the beat-row highlights.
///
/// The sequencer never repeats on its own. Each [`Sequencer::tick`] checks the
/// transport first and, while playing, re-arms the [`Timer`] for the next step.
#[derive(Debug, Default)]
pub struct Sequencer {
    cursor: usize,
    is_playing: bool,
    highlights: [bool; STEPS],
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn highlights(&self) -> &[bool; STEPS] {
        &self.highlights
    }

    pub fn highlighted_step(&self) -> Option<usize> {
        self.highlights.iter().position(|&lit| lit)
    }

    /// Enter the playing state at step 0 and play the first step right away.
    pub fn start<T, P>(
        &mut self,
        timer: &mut T,
        grid: &StepGrid,
        tempo: Tempo,
        player: &mut P,
    ) -> Option<Tick>
    where
        T: Timer + ?Sized,
        P: SamplePlayer + ?Sized,
    {
        self.is_playing = true;
        self.cursor = 0;
        self.clear_highlights();
        debug!(bpm = tempo.bpm(), "Transport started");
        self.tick(timer, grid, tempo, player)
    }

    /// Stop the transport. A step already scheduled will find the transport
    /// stopped and end the chain.
    pub fn stop(&mut self) {
        self.is_playing = false;
        self.clear_highlights();
        debug!("Transport stopped");
    }

    pub fn tick<T, P>(
        &mut self,
        timer: &mut T,
        grid: &StepGrid,
        tempo: Tempo,
        player: &mut P,
    ) -> Option<Tick>
    where
        T: Timer + ?Sized,
        P: SamplePlayer + ?Sized,
    {
        if !self.is_playing {
            return None;
        }

        let step = self.cursor;
        let previous = (step + STEPS - 1) % STEPS;
        self.highlights[previous] = false;
        self.highlights[step] = true;

        let mut triggered = Vec::new();
        for instrument in Instrument::ALL {
            if grid.is_on(instrument, step) && player.is_loaded(instrument) {
                player.trigger(instrument);
                triggered.push(instrument);
            }
        }

        self.cursor = (step + 1) % STEPS;

        let interval = tempo.interval();
        timer.schedule_once(interval);

        Some(Tick {
            step,
            triggered,
            interval,
        })
    }

    fn clear_highlights(&mut self) {
        self.highlights = [false; STEPS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct RecordingTimer {
        scheduled: Vec<Duration>,
    }

    impl Timer for RecordingTimer {
        fn schedule_once(&mut self, delay: Duration) {
            self.scheduled.push(delay);
        }
    }

    #[derive(Default)]
    struct RecordingPlayer {
        missing: HashSet<Instrument>,
        hits: Vec<Instrument>,
    }

    impl SamplePlayer for RecordingPlayer {
        fn is_loaded(&self, instrument: Instrument) -> bool {
            !self.missing.contains(&instrument)
        }

        fn trigger(&mut self, instrument: Instrument) {
            self.hits.push(instrument);
        }
    }

    fn run_ticks(
        seq: &mut Sequencer,
        grid: &StepGrid,
        player: &mut RecordingPlayer,
        timer: &mut RecordingTimer,
        count: usize,
    ) {
        for _ in 0..count {
            seq.tick(timer, grid, Tempo::default(), player);
        }
    }

    #[test]
    fn test_grid_toggle() {
        let mut grid = StepGrid::new();
        assert!(!grid.is_on(Instrument::Snare, 4));
        grid.toggle(Instrument::Snare, 4);
        assert!(grid.is_on(Instrument::Snare, 4));
        assert!(!grid.is_on(Instrument::Kick, 4));
        grid.toggle(Instrument::Snare, 4);
        assert!(!grid.is_on(Instrument::Snare, 4));
    }

    #[test]
    fn test_grid_out_of_range_steps() {
        let mut grid = StepGrid::new();
        grid.set(Instrument::Hat, STEPS, true);
        assert!(!grid.is_on(Instrument::Hat, STEPS));
        assert_eq!(grid, StepGrid::new());
    }

    #[test]
    fn test_tempo_interval() {
        assert_eq!(Tempo::new(120.0).interval(), Duration::from_millis(250));
        assert_eq!(Tempo::new(40.0).interval(), Duration::from_millis(750));

        let mut last = Duration::MAX;
        for bpm in 40..=200 {
            let interval = Tempo::new(bpm as f32).interval();
            let expected = 30.0 / bpm as f64;
            assert!((interval.as_secs_f64() - expected).abs() < 1e-9);
            assert!(interval < last);
            last = interval;
        }
    }

    #[test]
    fn test_tempo_clamps() {
        assert_eq!(Tempo::new(10.0).bpm(), 40.0);
        assert_eq!(Tempo::new(500.0).bpm(), 200.0);
        assert_eq!(Tempo::new(f32::NAN).bpm(), 120.0);
    }

    #[test]
    fn test_first_beat_is_immediate() {
        let mut seq = Sequencer::new();
        let mut grid = StepGrid::new();
        grid.set(Instrument::Kick, 0, true);
        let mut timer = RecordingTimer::default();
        let mut player = RecordingPlayer::default();

        let tick = seq
            .start(&mut timer, &grid, Tempo::default(), &mut player)
            .expect("start plays step 0");

        assert_eq!(tick.step, 0);
        assert_eq!(player.hits, vec![Instrument::Kick]);
        assert_eq!(seq.highlighted_step(), Some(0));
        assert_eq!(seq.cursor(), 1);
        assert_eq!(timer.scheduled, vec![Duration::from_millis(250)]);
    }

    #[test]
    fn test_cursor_after_n_ticks() {
        let grid = StepGrid::new();
        for n in [0, 1, 15, 16, 17, 40] {
            let mut seq = Sequencer::new();
            let mut timer = RecordingTimer::default();
            let mut player = RecordingPlayer::default();
            seq.is_playing = true;
            run_ticks(&mut seq, &grid, &mut player, &mut timer, n);
            assert_eq!(seq.cursor(), n % STEPS);
            assert_eq!(timer.scheduled.len(), n);
        }
    }

    #[test]
    fn test_single_highlight_while_playing() {
        let grid = StepGrid::new();
        let mut seq = Sequencer::new();
        let mut timer = RecordingTimer::default();
        let mut player = RecordingPlayer::default();
        seq.start(&mut timer, &grid, Tempo::default(), &mut player);

        for _ in 0..(STEPS * 2) {
            let expected = seq.cursor();
            seq.tick(&mut timer, &grid, Tempo::default(), &mut player);
            assert_eq!(seq.highlights().iter().filter(|&&lit| lit).count(), 1);
            assert_eq!(seq.highlighted_step(), Some(expected));
        }
    }

    #[test]
    fn test_stop_clears_and_restart_begins_at_zero() {
        let grid = StepGrid::new();
        let mut seq = Sequencer::new();
        let mut timer = RecordingTimer::default();
        let mut player = RecordingPlayer::default();

        seq.start(&mut timer, &grid, Tempo::default(), &mut player);
        run_ticks(&mut seq, &grid, &mut player, &mut timer, 6);
        seq.stop();

        assert!(!seq.is_playing());
        assert!(seq.highlights().iter().all(|&lit| !lit));

        let tick = seq.start(&mut timer, &grid, Tempo::default(), &mut player);
        assert_eq!(tick.map(|t| t.step), Some(0));
        assert_eq!(seq.highlighted_step(), Some(0));
    }

    #[test]
    fn test_restart_while_playing_keeps_one_highlight() {
        let grid = StepGrid::new();
        let mut seq = Sequencer::new();
        let mut timer = RecordingTimer::default();
        let mut player = RecordingPlayer::default();

        seq.start(&mut timer, &grid, Tempo::default(), &mut player);
        run_ticks(&mut seq, &grid, &mut player, &mut timer, 7);
        seq.start(&mut timer, &grid, Tempo::default(), &mut player);

        assert_eq!(seq.highlights().iter().filter(|&&lit| lit).count(), 1);
        assert_eq!(seq.highlighted_step(), Some(0));
    }

    #[test]
    fn test_tick_while_stopped_does_not_reschedule() {
        let mut grid = StepGrid::new();
        grid.set(Instrument::Hat, 0, true);
        let mut seq = Sequencer::new();
        let mut timer = RecordingTimer::default();
        let mut player = RecordingPlayer::default();

        assert!(seq
            .tick(&mut timer, &grid, Tempo::default(), &mut player)
            .is_none());
        assert!(timer.scheduled.is_empty());
        assert!(player.hits.is_empty());
        assert_eq!(seq.highlighted_step(), None);
    }

    #[test]
    fn test_single_kick_once_per_cycle() {
        let mut grid = StepGrid::new();
        grid.set(Instrument::Kick, 0, true);
        let mut seq = Sequencer::new();
        let mut timer = RecordingTimer::default();
        let mut player = RecordingPlayer::default();

        let mut kick_steps = Vec::new();
        if let Some(tick) = seq.start(&mut timer, &grid, Tempo::default(), &mut player) {
            kick_steps.extend(tick.triggered.iter().map(|_| tick.step));
        }
        for _ in 1..(STEPS * 3) {
            if let Some(tick) = seq.tick(&mut timer, &grid, Tempo::default(), &mut player) {
                kick_steps.extend(tick.triggered.iter().map(|_| tick.step));
            }
        }

        assert_eq!(player.hits, vec![Instrument::Kick; 3]);
        assert_eq!(kick_steps, vec![0, 0, 0]);
    }

    #[test]
    fn test_toggle_applies_on_next_visit() {
        let mut grid = StepGrid::new();
        let mut seq = Sequencer::new();
        let mut timer = RecordingTimer::default();
        let mut player = RecordingPlayer::default();

        seq.start(&mut timer, &grid, Tempo::default(), &mut player);
        run_ticks(&mut seq, &grid, &mut player, &mut timer, 3);
        // Step 3 has just played; turning it on must not retrigger it now.
        grid.set(Instrument::Snare, 3, true);
        assert!(player.hits.is_empty());

        run_ticks(&mut seq, &grid, &mut player, &mut timer, STEPS - 4);
        assert!(player.hits.is_empty());
        assert_eq!(seq.cursor(), 0);

        run_ticks(&mut seq, &grid, &mut player, &mut timer, 4);
        assert_eq!(player.hits, vec![Instrument::Snare]);
    }

    #[test]
    fn test_missing_clip_never_triggers() {
        let mut grid = StepGrid::new();
        for step in 0..STEPS {
            for instrument in Instrument::ALL {
                grid.set(instrument, step, true);
            }
        }
        let mut seq = Sequencer::new();
        let mut timer = RecordingTimer::default();
        let mut player = RecordingPlayer {
            missing: HashSet::from([Instrument::Kick]),
            ..Default::default()
        };

        seq.start(&mut timer, &grid, Tempo::default(), &mut player);
        run_ticks(&mut seq, &grid, &mut player, &mut timer, STEPS * 2 - 1);

        assert!(!player.hits.contains(&Instrument::Kick));
        assert_eq!(player.hits.len(), STEPS * 2 * 2);
    }

    #[test]
    fn test_tempo_change_applies_to_next_interval() {
        let grid = StepGrid::new();
        let mut seq = Sequencer::new();
        let mut timer = RecordingTimer::default();
        let mut player = RecordingPlayer::default();

        seq.start(&mut timer, &grid, Tempo::new(120.0), &mut player);
        seq.tick(&mut timer, &grid, Tempo::new(40.0), &mut player);

        assert_eq!(
            timer.scheduled,
            vec![Duration::from_millis(250), Duration::from_millis(750)]
        );
    }
}
