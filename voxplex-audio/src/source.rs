//! Audio sources

use crate::error::AudioError;

/// A blocking supplier of mono 16-bit PCM audio
pub trait AudioSource {
    /// Sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Read up to `len` samples.
    ///
    /// Blocks until audio is available. Returns `Ok(None)` once the source
    /// is exhausted.
    fn read_chunk(&mut self, len: usize) -> Result<Option<Vec<i16>>, AudioError>;
}

/// An in-memory source that replays a fixed buffer
#[derive(Debug, Clone)]
pub struct BufferSource {
    samples: Vec<i16>,
    position: usize,
    sample_rate: u32,
}

impl BufferSource {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            position: 0,
            sample_rate,
        }
    }

    /// Samples not yet read
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}

impl AudioSource for BufferSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_chunk(&mut self, len: usize) -> Result<Option<Vec<i16>>, AudioError> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }
        let end = (self.position + len).min(self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(Some(chunk))
    }
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn read_chunk(&mut self, len: usize) -> Result<Option<Vec<i16>>, AudioError> {
        (**self).read_chunk(len)
    }
}
