/// BEATGRID - a three-voice drum step sequencer
///
/// This library provides the core components of the drum machine:
/// - A fixed 3 x 16 step grid (kick, snare, hat)
/// - A self-scheduling sequencer loop driven by a one-shot timer
/// - Sample loading and overlapping playback through cpal
/// - Optional MIDI mirroring of every hit

pub mod audio;
pub mod config;
pub mod error;
pub mod midi;
pub mod sequencer;

// Re-export commonly used types
pub use audio::{AudioOutput, SampleBank};
pub use config::Config;
pub use error::{MidiError, SampleError};
pub use midi::{midi_note_name, MidiOutputDevice};
pub use sequencer::playback::{FrameTimer, SamplePlayer, Tick, Timer};
pub use sequencer::{Instrument, Sequencer, StepGrid, Tempo, STEPS};
