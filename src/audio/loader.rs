/// Clip loading - decodes the instrument WAV files into memory at startup
use std::path::Path;
use std::sync::Arc;

use hound::{SampleFormat, WavReader};
use tracing::{error, info};

use crate::config::Config;
use crate::error::SampleError;
use crate::sequencer::Instrument;

/// A decoded clip, interleaved `f32` in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub data: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Sample {
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels.max(1) as usize
    }

    /// Value of `channel` at `frame`, silence past the end.
    pub fn value(&self, frame: usize, channel: usize) -> f32 {
        let channels = self.channels.max(1) as usize;
        self.data
            .get(frame * channels + channel % channels)
            .copied()
            .unwrap_or(0.0)
    }
}

pub fn load_sample(path: &Path) -> Result<Sample, SampleError> {
    let decode = |source| SampleError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let reader = WavReader::open(path).map_err(decode)?;
    let spec = reader.spec();

    let data: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(decode)?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(SampleError::UnsupportedBitDepth {
                    path: path.to_path_buf(),
                    bits: spec.bits_per_sample,
                });
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(decode)?
        }
    };

    if data.is_empty() {
        return Err(SampleError::Empty(path.to_path_buf()));
    }

    Ok(Sample {
        data,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// One preloaded clip per instrument. Instruments whose clip failed to load
/// stay silent for the rest of the session.
#[derive(Debug, Clone, Default)]
pub struct SampleBank {
    clips: [Option<Arc<Sample>>; Instrument::COUNT],
}

impl SampleBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preload(config: &Config) -> Self {
        let mut bank = Self::new();
        for instrument in Instrument::ALL {
            let path = config.sample_path(instrument);
            match load_sample(&path) {
                Ok(sample) => {
                    info!(
                        instrument = instrument.label(),
                        path = ?path,
                        frames = sample.frames(),
                        sample_rate = sample.sample_rate,
                        "Loaded sample"
                    );
                    bank.insert(instrument, sample);
                }
                Err(e) => {
                    error!(instrument = instrument.label(), "{}", e);
                }
            }
        }
        bank
    }

    pub fn insert(&mut self, instrument: Instrument, sample: Sample) {
        self.clips[instrument.index()] = Some(Arc::new(sample));
    }

    pub fn get(&self, instrument: Instrument) -> Option<&Arc<Sample>> {
        self.clips[instrument.index()].as_ref()
    }

    pub fn is_loaded(&self, instrument: Instrument) -> bool {
        self.get(instrument).is_some()
    }
}
