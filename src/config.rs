/// Startup configuration, taken from the environment only.
use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::sequencer::{Instrument, Tempo};

pub const SAMPLE_DIR_VAR: &str = "BEATGRID_SAMPLE_DIR";
pub const BPM_VAR: &str = "BEATGRID_BPM";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub sample_dir: PathBuf,
    pub initial_bpm: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_dir: PathBuf::from("instruments"),
            initial_bpm: Tempo::DEFAULT_BPM,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(env::var(SAMPLE_DIR_VAR).ok(), env::var(BPM_VAR).ok())
    }

    fn from_vars(sample_dir: Option<String>, bpm: Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = sample_dir.filter(|d| !d.is_empty()) {
            config.sample_dir = PathBuf::from(dir);
        }

        if let Some(raw) = bpm {
            match raw.trim().parse::<f32>() {
                Ok(bpm) => config.initial_bpm = Tempo::new(bpm).bpm(),
                Err(_) => warn!(value = %raw, "Ignoring unparseable {}", BPM_VAR),
            }
        }

        config
    }

    pub fn sample_dir(&self) -> &Path {
        &self.sample_dir
    }

    /// Clip path for one instrument, e.g. `instruments/kick.wav`.
    pub fn sample_path(&self, instrument: Instrument) -> PathBuf {
        self.sample_dir.join(instrument.file_name())
    }
}
