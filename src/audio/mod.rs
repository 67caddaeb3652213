/// Audio output using cpal
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub mod loader;
pub mod mixer;

pub use loader::{load_sample, Sample, SampleBank};
pub use mixer::Mixer;

use crate::sequencer::playback::SamplePlayer;
use crate::sequencer::Instrument;

const FALLBACK_SAMPLE_RATE: u32 = 44_100;

/// Plays preloaded clips through the default output device.
pub struct AudioOutput {
    _stream: Option<cpal::Stream>,
    bank: SampleBank,
    mixer: Arc<Mutex<Mixer>>,
}

impl AudioOutput {
    /// Opens the default output device. Without one, clips are still accepted
    /// but nothing is heard.
    pub fn new(bank: SampleBank) -> Self {
        match Self::setup_audio_stream() {
            Some((stream, mixer)) => Self {
                _stream: Some(stream),
                bank,
                mixer,
            },
            None => {
                warn!("No usable audio output device, playback will be silent");
                Self::silent(bank)
            }
        }
    }

    /// An output with no device attached.
    pub fn silent(bank: SampleBank) -> Self {
        Self {
            _stream: None,
            bank,
            mixer: Arc::new(Mutex::new(Mixer::new(FALLBACK_SAMPLE_RATE, 2))),
        }
    }

    fn setup_audio_stream() -> Option<(cpal::Stream, Arc<Mutex<Mixer>>)> {
        let host = cpal::default_host();
        let device = host.default_output_device()?;
        let config = device.default_output_config().ok()?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();
        let mixer = Arc::new(Mutex::new(Mixer::new(sample_rate, channels)));
        let mixer_clone = Arc::clone(&mixer);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    lock(&mixer_clone).render(data);
                },
                |err| warn!(err = %err, "Audio stream error"),
                None,
            ),
            format => {
                warn!(format = ?format, "Unsupported output sample format");
                return None;
            }
        };

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!(err = %e, "Failed to build output stream");
                return None;
            }
        };

        if let Err(e) = stream.play() {
            warn!(err = %e, "Failed to start output stream");
            return None;
        }

        info!(sample_rate, channels, "Audio output started");
        Some((stream, mixer))
    }

    pub fn has_device(&self) -> bool {
        self._stream.is_some()
    }

    pub fn bank(&self) -> &SampleBank {
        &self.bank
    }

    /// Cut every playing voice.
    pub fn silence(&mut self) {
        lock(&self.mixer).clear();
    }

    pub fn active_voices(&self) -> usize {
        lock(&self.mixer).active_voices()
    }
}

impl SamplePlayer for AudioOutput {
    fn is_loaded(&self, instrument: Instrument) -> bool {
        self.bank.is_loaded(instrument)
    }

    fn trigger(&mut self, instrument: Instrument) {
        match self.bank.get(instrument) {
            Some(sample) => lock(&self.mixer).trigger(Arc::clone(sample)),
            None => debug!(instrument = instrument.label(), "No sample loaded"),
        }
    }
}

/// The audio callback must keep running even if a panic poisoned the lock.
fn lock(mixer: &Mutex<Mixer>) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
