//! Audio error types

use thiserror::Error;

/// Errors raised while capturing or segmenting audio
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No input device available: {0}")]
    NoDevice(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Listening timed out while waiting for phrase to start")]
    WaitTimeout,

    #[error("No speech detected")]
    NoSpeech,
}
