//! Voice input: capture a phrase and transcribe it

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use voxplex_audio::{AudioError, AudioSource, Recognizer, RecognizerSettings, Recording};
use voxplex_core::config::SpeechConfig;
use voxplex_providers::{TranscriptionError, TranscriptionService};

/// Errors from the voice path
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error("Capture task failed: {0}")]
    Task(String),

    #[error("Could not understand audio")]
    Unrecognized,
}

/// Something that can turn the user's speech into text
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Capture one utterance and return its transcript
    async fn listen(&self) -> Result<String, SpeechError>;
}

/// Opens a fresh audio source for each capture
pub type SourceOpener = Arc<dyn Fn() -> Result<Box<dyn AudioSource>, AudioError> + Send + Sync>;

/// Records a phrase from an audio source and sends it for transcription
pub struct RecorderSpeech {
    open_source: SourceOpener,
    settings: RecognizerSettings,
    calibration: Duration,
    transcription: TranscriptionService,
}

impl RecorderSpeech {
    pub fn new(
        open_source: SourceOpener,
        settings: RecognizerSettings,
        calibration: Duration,
        transcription: TranscriptionService,
    ) -> Self {
        Self {
            open_source,
            settings,
            calibration,
            transcription,
        }
    }

    async fn record(&self) -> Result<Recording, SpeechError> {
        let open_source = self.open_source.clone();
        let settings = self.settings.clone();
        let calibration = self.calibration;

        // Capture blocks until the speaker pauses, so keep it off the runtime.
        let recording = tokio::task::spawn_blocking(move || {
            let mut source = open_source()?;
            let mut recognizer = Recognizer::new(settings);
            recognizer.adjust_for_ambient_noise(&mut source, calibration)?;
            info!("Listening... Speak now.");
            recognizer.listen(&mut source)
        })
        .await
        .map_err(|e| SpeechError::Task(e.to_string()))??;

        Ok(recording)
    }
}

#[async_trait]
impl SpeechInput for RecorderSpeech {
    async fn listen(&self) -> Result<String, SpeechError> {
        let recording = self.record().await?;
        info!(
            "Captured {:.1}s of speech",
            recording.duration().as_secs_f64()
        );

        let text = self.transcription.transcribe_wav(recording.to_wav()).await?;
        if text.trim().is_empty() {
            return Err(SpeechError::Unrecognized);
        }
        Ok(text)
    }
}

/// Build the voice input for this process, if voice is usable at all.
///
/// Returns `None` when voice is disabled, no transcription key is
/// configured, or no microphone can be opened by this build.
pub fn from_config(config: &SpeechConfig) -> Option<Arc<dyn SpeechInput>> {
    if !config.enabled {
        info!("Voice input disabled by configuration");
        return None;
    }

    let calibration = match Duration::try_from_secs_f32(config.calibration_secs) {
        Ok(calibration) => calibration,
        Err(e) => {
            warn!("Voice input unavailable: bad speech.calibration_secs: {}", e);
            return None;
        }
    };

    let transcription = TranscriptionService::from_config(config);
    if !transcription.is_configured() {
        warn!("Voice input unavailable: no transcription API key configured");
        return None;
    }

    if !voxplex_audio::microphone_available(&config.device) {
        warn!("Voice input unavailable: no usable microphone");
        return None;
    }

    let open_source = microphone_opener(config.device.clone())?;
    let speech = RecorderSpeech::new(
        open_source,
        RecognizerSettings::from(config),
        calibration,
        transcription,
    );
    Some(Arc::new(speech))
}

#[cfg(feature = "microphone")]
fn microphone_opener(device: String) -> Option<SourceOpener> {
    use voxplex_audio::MicrophoneSource;

    Some(Arc::new(
        move || -> Result<Box<dyn AudioSource>, AudioError> {
            let source = MicrophoneSource::open(&device)?;
            Ok(Box::new(source))
        },
    ))
}

#[cfg(not(feature = "microphone"))]
fn microphone_opener(_device: String) -> Option<SourceOpener> {
    None
}
