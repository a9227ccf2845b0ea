//! Core audio data types
//!
//! Sample buffers are planar: one `Vec<f32>` per channel, all channels the
//! same length, samples nominally in [-1.0, 1.0].

use crate::error::{Result, ValidationError};

/// Decoded audio held entirely in RAM
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Frames per second
    pub sample_rate: u32,

    /// Per-channel samples
    pub channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Create a buffer from planar channel data
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        debug_assert!(
            channels.windows(2).all(|w| w[0].len() == w[1].len()),
            "channels must have equal length"
        );
        Self {
            sample_rate,
            channels,
        }
    }

    /// Single-channel buffer
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::new(sample_rate, vec![samples])
    }

    /// Zero-length buffer with the given format
    pub fn empty(sample_rate: u32, channel_count: u16) -> Self {
        Self::new(sample_rate, vec![Vec::new(); channel_count as usize])
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Frame index nearest to a time offset
    pub fn frame_at(&self, seconds: f64) -> usize {
        (seconds * self.sample_rate as f64).round().max(0.0) as usize
    }

    /// Copy of frames `from..to`
    pub fn slice(&self, from: usize, to: usize) -> Result<SampleBuffer> {
        let frames = self.frames();
        if from > to || to > frames {
            return Err(ValidationError::InvalidRange { from, to, frames }.into());
        }

        Ok(SampleBuffer::new(
            self.sample_rate,
            self.channels.iter().map(|c| c[from..to].to_vec()).collect(),
        ))
    }

    /// Check that two buffers can be joined
    pub fn ensure_compatible(&self, other: &SampleBuffer) -> Result<()> {
        if self.sample_rate != other.sample_rate {
            return Err(ValidationError::SampleRateMismatch {
                first: self.sample_rate,
                second: other.sample_rate,
            }
            .into());
        }
        if self.channel_count() != other.channel_count() {
            return Err(ValidationError::ChannelMismatch {
                first: self.channel_count(),
                second: other.channel_count(),
            }
            .into());
        }
        Ok(())
    }

    /// Join buffers end to end; all must share rate and channel count
    pub fn concat(buffers: &[SampleBuffer]) -> Result<SampleBuffer> {
        let Some(first) = buffers.first() else {
            return Ok(SampleBuffer::empty(0, 0));
        };

        for other in &buffers[1..] {
            first.ensure_compatible(other)?;
        }

        let total: usize = buffers.iter().map(SampleBuffer::frames).sum();
        let mut channels: Vec<Vec<f32>> = (0..first.channels.len())
            .map(|_| Vec::with_capacity(total))
            .collect();

        for buffer in buffers {
            for (dst, src) in channels.iter_mut().zip(&buffer.channels) {
                dst.extend_from_slice(src);
            }
        }

        Ok(SampleBuffer::new(first.sample_rate, channels))
    }
}
