//! Microphone capture via cpal.
//!
//! The cpal callback thread converts incoming frames to mono i16 and sends
//! them over a channel; [`MicrophoneSource::read_chunk`] blocks on that
//! channel. The stream is stopped when the source is dropped.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream};
use tracing::{debug, info, warn};

use crate::error::AudioError;
use crate::source::AudioSource;

/// How long a read waits for the device before giving up
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Live microphone input
pub struct MicrophoneSource {
    // Dropping the stream stops capture.
    _stream: Stream,
    receiver: Receiver<Vec<i16>>,
    pending: VecDeque<i16>,
    sample_rate: u32,
}

impl MicrophoneSource {
    /// Open the input device whose name contains `device`, or the default
    /// input device when `device` is empty.
    pub fn open(device: &str) -> Result<Self, AudioError> {
        let device = find_device(device)?;
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let channels = usize::from(config.channels.max(1));
        let sample_rate = config.sample_rate.0;

        let (tx, receiver) = mpsc::channel::<Vec<i16>>();
        let on_error = |e: cpal::StreamError| warn!("Microphone stream error: {}", e);

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(downmix(data, channels, |s| f32::from(s) / 32768.0));
                },
                on_error,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(downmix(data, channels, |s| {
                        (f32::from(s) - 32768.0) / 32768.0
                    }));
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(downmix(data, channels, |s| s));
                },
                on_error,
                None,
            ),
            other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
        }
        .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        info!(
            "Microphone '{}' open ({} Hz, {} channel(s))",
            name, sample_rate, channels
        );

        Ok(Self {
            _stream: stream,
            receiver,
            pending: VecDeque::new(),
            sample_rate,
        })
    }
}

impl AudioSource for MicrophoneSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_chunk(&mut self, len: usize) -> Result<Option<Vec<i16>>, AudioError> {
        while self.pending.len() < len {
            match self.receiver.recv_timeout(READ_TIMEOUT) {
                Ok(samples) => self.pending.extend(samples),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(AudioError::Stream(
                        "no audio received from input device".to_string(),
                    ))
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if self.pending.is_empty() {
            return Ok(None);
        }
        let take = len.min(self.pending.len());
        Ok(Some(self.pending.drain(..take).collect()))
    }
}

/// Whether an input device matching `device` exists
pub fn device_exists(device: &str) -> bool {
    match find_device(device) {
        Ok(_) => true,
        Err(e) => {
            debug!("Microphone unavailable: {}", e);
            false
        }
    }
}

fn find_device(device: &str) -> Result<Device, AudioError> {
    let host = cpal::default_host();
    let wanted = device.trim();

    if wanted.is_empty() || wanted.eq_ignore_ascii_case("default") {
        return host
            .default_input_device()
            .ok_or_else(|| AudioError::NoDevice("default".to_string()));
    }

    let devices = host
        .input_devices()
        .map_err(|e| AudioError::Stream(e.to_string()))?;
    let needle = wanted.to_lowercase();
    for candidate in devices {
        if let Ok(name) = candidate.name() {
            if name.to_lowercase().contains(&needle) {
                return Ok(candidate);
            }
        }
    }
    Err(AudioError::NoDevice(wanted.to_string()))
}

/// Average interleaved frames to mono and scale to i16
fn downmix<T: Copy>(data: &[T], channels: usize, to_f32: impl Fn(T) -> f32) -> Vec<i16> {
    data.chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|&s| to_f32(s)).sum();
            let mono = (sum / frame.len() as f32).clamp(-1.0, 1.0);
            (mono * f32::from(i16::MAX)) as i16
        })
        .collect()
}
