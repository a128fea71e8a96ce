//! Energy-threshold phrase detection
//!
//! The recognizer keeps a running RMS energy threshold. Calibration pulls
//! the threshold toward a multiple of the ambient noise level; listening
//! waits for a buffer louder than the threshold, then records until the
//! audio has stayed below it for `pause_threshold` seconds.

use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;
use voxplex_core::config::SpeechConfig;

use crate::error::AudioError;
use crate::source::AudioSource;
use crate::wav;

/// Samples read per buffer
pub const CHUNK_SAMPLES: usize = 1024;

/// Tuning for [`Recognizer`]
#[derive(Debug, Clone)]
pub struct RecognizerSettings {
    /// Starting RMS threshold separating speech from silence
    pub energy_threshold: f64,
    /// Keep adapting the threshold while waiting for speech
    pub dynamic_energy_threshold: bool,
    /// Fraction of the old threshold kept per second of adaptation
    pub dynamic_energy_damping: f64,
    /// Target threshold as a multiple of the observed energy
    pub dynamic_energy_ratio: f64,
    /// Seconds of quiet that end a phrase
    pub pause_threshold: f64,
    /// Minimum seconds of speech for a phrase to be kept
    pub phrase_threshold: f64,
    /// Seconds of quiet kept before and after the phrase
    pub non_speaking_duration: f64,
    /// Maximum seconds to wait for a phrase to start
    pub listen_timeout: Option<f64>,
    /// Maximum seconds of a single phrase
    pub phrase_time_limit: Option<f64>,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            energy_threshold: 300.0,
            dynamic_energy_threshold: true,
            dynamic_energy_damping: 0.15,
            dynamic_energy_ratio: 1.5,
            pause_threshold: 0.8,
            phrase_threshold: 0.3,
            non_speaking_duration: 0.5,
            listen_timeout: None,
            phrase_time_limit: None,
        }
    }
}

impl From<&SpeechConfig> for RecognizerSettings {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            energy_threshold: f64::from(config.energy_threshold),
            dynamic_energy_threshold: config.dynamic_energy_threshold,
            pause_threshold: f64::from(config.pause_threshold),
            phrase_threshold: f64::from(config.phrase_threshold),
            non_speaking_duration: f64::from(config.non_speaking_duration),
            listen_timeout: Some(f64::from(config.listen_timeout_secs)),
            phrase_time_limit: Some(f64::from(config.phrase_time_limit_secs)),
            ..Self::default()
        }
    }
}

/// A captured phrase
#[derive(Debug, Clone)]
pub struct Recording {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl Recording {
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Encode as a 16-bit mono WAV file
    pub fn to_wav(&self) -> Vec<u8> {
        wav::encode_pcm16(&self.samples, self.sample_rate)
    }
}

/// Detects and records a single spoken phrase
#[derive(Debug, Clone)]
pub struct Recognizer {
    settings: RecognizerSettings,
    energy_threshold: f64,
}

impl Recognizer {
    pub fn new(settings: RecognizerSettings) -> Self {
        Self {
            energy_threshold: settings.energy_threshold,
            settings,
        }
    }

    /// Current speech/silence threshold
    pub fn energy_threshold(&self) -> f64 {
        self.energy_threshold
    }

    /// Calibrate the threshold against `duration` of ambient noise
    pub fn adjust_for_ambient_noise<S: AudioSource + ?Sized>(
        &mut self,
        source: &mut S,
        duration: Duration,
    ) -> Result<(), AudioError> {
        let seconds_per_buffer = seconds_per_buffer(source.sample_rate());
        let limit = duration.as_secs_f64();
        let mut elapsed = 0.0;

        loop {
            elapsed += seconds_per_buffer;
            if elapsed > limit {
                break;
            }
            let Some(buffer) = source.read_chunk(CHUNK_SAMPLES)? else {
                break;
            };
            self.adapt(rms(&buffer), seconds_per_buffer);
        }

        debug!(
            "Calibrated energy threshold to {:.1}",
            self.energy_threshold
        );
        Ok(())
    }

    /// Record one phrase.
    ///
    /// Phrases shorter than `phrase_threshold` are discarded and listening
    /// resumes. Fails with [`AudioError::WaitTimeout`] when no phrase starts
    /// within `listen_timeout`, and with [`AudioError::NoSpeech`] when the
    /// source ends first.
    pub fn listen<S: AudioSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Recording, AudioError> {
        let sample_rate = source.sample_rate();
        let seconds_per_buffer = seconds_per_buffer(sample_rate);
        let pause_buffers = buffer_count(self.settings.pause_threshold, seconds_per_buffer);
        let phrase_buffers = buffer_count(self.settings.phrase_threshold, seconds_per_buffer);
        let non_speaking_buffers =
            buffer_count(self.settings.non_speaking_duration, seconds_per_buffer);

        let mut elapsed = 0.0;
        let mut frames: VecDeque<Vec<i16>>;
        let mut pause_count;

        loop {
            frames = VecDeque::new();

            // Wait for a buffer louder than the threshold.
            loop {
                elapsed += seconds_per_buffer;
                if let Some(timeout) = self.settings.listen_timeout {
                    if elapsed > timeout {
                        return Err(AudioError::WaitTimeout);
                    }
                }
                let Some(buffer) = source.read_chunk(CHUNK_SAMPLES)? else {
                    return Err(AudioError::NoSpeech);
                };
                let energy = rms(&buffer);
                frames.push_back(buffer);
                if frames.len() > non_speaking_buffers {
                    frames.pop_front();
                }
                if energy > self.energy_threshold {
                    break;
                }
                if self.settings.dynamic_energy_threshold {
                    self.adapt(energy, seconds_per_buffer);
                }
            }

            // Record until the speaker pauses.
            pause_count = 0;
            let mut phrase_count = 0;
            let mut exhausted = false;
            let phrase_start = elapsed;
            loop {
                elapsed += seconds_per_buffer;
                if let Some(limit) = self.settings.phrase_time_limit {
                    if elapsed - phrase_start > limit {
                        break;
                    }
                }
                let Some(buffer) = source.read_chunk(CHUNK_SAMPLES)? else {
                    exhausted = true;
                    break;
                };
                let energy = rms(&buffer);
                frames.push_back(buffer);
                phrase_count += 1;

                if energy > self.energy_threshold {
                    pause_count = 0;
                } else {
                    pause_count += 1;
                }
                if pause_count > pause_buffers {
                    break;
                }
            }

            let spoken = phrase_count - pause_count;
            if spoken >= phrase_buffers {
                break;
            }
            if exhausted {
                return Err(AudioError::NoSpeech);
            }
            debug!("Discarded {} buffer phrase", spoken);
        }

        // Keep at most the non-speaking pad after the phrase.
        for _ in 0..pause_count.saturating_sub(non_speaking_buffers) {
            frames.pop_back();
        }

        let samples: Vec<i16> = frames.into_iter().flatten().collect();
        Ok(Recording {
            samples,
            sample_rate,
        })
    }

    fn adapt(&mut self, energy: f64, seconds_per_buffer: f64) {
        let damping = self.settings.dynamic_energy_damping.powf(seconds_per_buffer);
        let target = energy * self.settings.dynamic_energy_ratio;
        self.energy_threshold = self.energy_threshold * damping + target * (1.0 - damping);
    }
}

fn seconds_per_buffer(sample_rate: u32) -> f64 {
    CHUNK_SAMPLES as f64 / f64::from(sample_rate.max(1))
}

fn buffer_count(seconds: f64, seconds_per_buffer: f64) -> usize {
    (seconds / seconds_per_buffer).ceil() as usize
}

/// Root-mean-square amplitude of a buffer
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / samples.len() as f64).sqrt()
}
