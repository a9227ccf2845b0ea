//! Audio resampling using rubato
//!
//! Converts a planar buffer to a target sample rate and channel count.
//! Channel reduction keeps the leading channels; channel expansion repeats
//! the last source channel.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Audio resampler using rubato for sample rate conversion.
pub struct Resampler;

/// Frames of edge padding on each side of the input, wider than the
/// interpolator's support so the first and last output frames see real
/// levels instead of the resampler's zeroed history
const EDGE_PAD_FRAMES: usize = 16;

/// Input frames FastFixedIn holds back ahead of its septic interpolation point
const SEPTIC_HALF_WINDOW: f64 = 4.0;

impl Resampler {
    /// Resample to `target_rate` with `target_channels` channels.
    ///
    /// Output frame count is `round(frames * target_rate / source_rate)`.
    /// The resampler's lead-in is trimmed, so output frame 0 lines up with
    /// input frame 0. A buffer already at the target format is
    /// returned unchanged.
    pub fn resample(
        input: &SampleBuffer,
        target_rate: u32,
        target_channels: u16,
    ) -> Result<SampleBuffer> {
        if target_rate == 0 || target_channels == 0 {
            return Err(Error::Internal(format!(
                "Invalid resample target {}Hz x{}",
                target_rate, target_channels
            )));
        }

        let remapped = Self::remap_channels(input, target_channels)?;

        // If already at target rate, return copy
        if remapped.sample_rate == target_rate {
            debug!("Sample rate already at {}Hz, skipping resample", target_rate);
            return Ok(remapped);
        }

        if remapped.is_empty() {
            return Ok(SampleBuffer::empty(target_rate, target_channels));
        }

        debug!(
            "Resampling from {}Hz to {}Hz ({} channels)",
            remapped.sample_rate, target_rate, target_channels
        );

        let input_frames = remapped.frames();
        let ratio = target_rate as f64 / remapped.sample_rate as f64;
        let expected_frames = (input_frames as f64 * ratio).round() as usize;

        let padded = Self::pad_edges(&remapped.channels, EDGE_PAD_FRAMES);
        let padded_frames = input_frames + 2 * EDGE_PAD_FRAMES;
        let mut resampler = Self::create_resampler(
            remapped.sample_rate,
            target_rate,
            target_channels,
            padded_frames,
        )?;

        let skip = Self::leading_frames(EDGE_PAD_FRAMES, ratio);
        let needed = skip + expected_frames;

        let mut planar_output = resampler
            .process(&padded, None)
            .map_err(|e| Error::Internal(format!("Resampling failed: {}", e)))?;

        // Flush the delay line until every wanted frame has come out
        while planar_output.first().map_or(0, Vec::len) < needed {
            let flushed = resampler
                .process_partial(None::<&[Vec<f32>]>, None)
                .map_err(|e| Error::Internal(format!("Resampler flush failed: {}", e)))?;
            if flushed.first().map_or(true, Vec::is_empty) {
                break;
            }
            for (channel, tail) in planar_output.iter_mut().zip(flushed) {
                channel.extend(tail);
            }
        }

        for channel in planar_output.iter_mut() {
            channel.drain(..skip.min(channel.len()));
            let hold = channel.last().copied().unwrap_or(0.0);
            channel.resize(expected_frames, hold);
        }

        let output = SampleBuffer::new(target_rate, planar_output);

        debug!(
            "Resampled {} input frames to {} output frames ({} lead-in trimmed)",
            input_frames,
            output.frames(),
            skip
        );

        Ok(output)
    }

    /// Output frames to drop so that output frame 0 sits on input frame 0.
    ///
    /// FastFixedIn starts half a polynomial window before the first input
    /// frame and emits its first output one step in, so input position `p`
    /// lands on output `(p + half_window) * ratio - 1`. Its own
    /// `output_delay()` truncates that to whole frames and leaves the
    /// stream up to a frame late.
    fn leading_frames(pad: usize, ratio: f64) -> usize {
        ((pad as f64 + SEPTIC_HALF_WINDOW) * ratio - 1.0).round().max(0.0) as usize
    }

    /// Extend every channel by `pad` copies of its first and last sample.
    fn pad_edges(channels: &[Vec<f32>], pad: usize) -> Vec<Vec<f32>> {
        channels
            .iter()
            .map(|channel| {
                let first = channel.first().copied().unwrap_or(0.0);
                let last = channel.last().copied().unwrap_or(0.0);
                let mut padded = Vec::with_capacity(channel.len() + 2 * pad);
                padded.resize(pad, first);
                padded.extend_from_slice(channel);
                padded.resize(channel.len() + 2 * pad, last);
                padded
            })
            .collect()
    }

    /// Create a rubato resampler sized to process the padded buffer in one call.
    fn create_resampler(
        input_rate: u32,
        output_rate: u32,
        channels: u16,
        chunk_size: usize,
    ) -> Result<FastFixedIn<f32>> {
        FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0, // max_relative_ratio (no runtime changes)
            PolynomialDegree::Septic,
            chunk_size,
            channels as usize,
        )
        .map_err(|e| Error::Internal(format!("Failed to create resampler: {}", e)))
    }

    /// Select or repeat channels to reach `target_channels`.
    fn remap_channels(input: &SampleBuffer, target_channels: u16) -> Result<SampleBuffer> {
        let source_channels = input.channels.len();
        if source_channels == 0 {
            return Err(Error::Internal("Buffer has no channels".to_string()));
        }
        if source_channels == target_channels as usize {
            return Ok(input.clone());
        }

        let channels = (0..target_channels as usize)
            .map(|ch| input.channels[ch.min(source_channels - 1)].clone())
            .collect();

        Ok(SampleBuffer::new(input.sample_rate, channels))
    }
}
