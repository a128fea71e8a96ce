//! Audio capture and phrase detection for voxplex
//!
//! Audio flows from an [`AudioSource`] through a [`Recognizer`], which
//! calibrates its energy threshold against ambient noise and then records a
//! single phrase, stopping when the speaker pauses. The resulting
//! [`Recording`] is encoded as WAV for the transcription service.

pub mod error;
#[cfg(feature = "microphone")]
pub mod microphone;
pub mod recognizer;
pub mod source;
pub mod wav;

pub use error::AudioError;
#[cfg(feature = "microphone")]
pub use microphone::MicrophoneSource;
pub use recognizer::{Recognizer, RecognizerSettings, Recording};
pub use source::{AudioSource, BufferSource};

/// Whether a capture device can be opened by this build.
///
/// Always false when the crate is built without the `microphone` feature.
pub fn microphone_available(device: &str) -> bool {
    #[cfg(feature = "microphone")]
    {
        microphone::device_exists(device)
    }
    #[cfg(not(feature = "microphone"))]
    {
        let _ = device;
        false
    }
}
