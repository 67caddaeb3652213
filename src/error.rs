use std::path::PathBuf;

use thiserror::Error;

/// Failure to preload an instrument clip.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Failed to read sample {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Unsupported bit depth {bits} in {path}")]
    UnsupportedBitDepth { path: PathBuf, bits: u16 },

    #[error("Sample {0} contains no audio")]
    Empty(PathBuf),
}

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("Failed to create MIDI output: {0}")]
    Init(#[from] midir::InitError),

    #[error("Invalid port index {0}")]
    InvalidPort(usize),

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Failed to send message: {0}")]
    Send(#[from] midir::SendError),
}
