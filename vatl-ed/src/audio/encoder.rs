//! Native asset encoding using hound
//!
//! Assets are stored as RIFF/WAVE with 32-bit IEEE float samples at the
//! buffer's own rate and channel count, so decode → edit → encode never
//! loses precision.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Stateless hound encoder
pub struct PayloadEncoder;

impl PayloadEncoder {
    /// Encode a buffer to a float WAV payload
    pub fn encode(buffer: &SampleBuffer) -> Result<Vec<u8>> {
        if buffer.channel_count() == 0 || buffer.sample_rate == 0 {
            return Err(Error::Encode(format!(
                "Cannot encode {} channels at {}Hz",
                buffer.channel_count(),
                buffer.sample_rate
            )));
        }

        let frames = buffer.frames();
        if buffer.channels.iter().any(|channel| channel.len() != frames) {
            return Err(Error::Encode(format!(
                "Channels differ in length (expected {} frames each)",
                frames
            )));
        }

        let spec = WavSpec {
            channels: buffer.channel_count(),
            sample_rate: buffer.sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(
            44 + frames * buffer.channels.len() * 4,
        ));

        {
            let mut writer = WavWriter::new(&mut cursor, spec)
                .map_err(|e| Error::Encode(format!("Failed to start WAV: {}", e)))?;

            for frame in 0..frames {
                for channel in &buffer.channels {
                    writer
                        .write_sample(channel[frame])
                        .map_err(|e| Error::Encode(format!("Failed to write sample: {}", e)))?;
                }
            }

            writer
                .finalize()
                .map_err(|e| Error::Encode(format!("Failed to finalize WAV: {}", e)))?;
        }

        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_header_is_float_wav() {
        let buffer = SampleBuffer::new(16000, vec![vec![0.5; 8], vec![-0.5; 8]]);
        let payload = PayloadEncoder::encode(&buffer).unwrap();

        let reader = hound::WavReader::new(Cursor::new(payload)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.sample_format, SampleFormat::Float);
        assert_eq!(reader.duration(), 8);
    }

    #[test]
    fn test_interleaves_channels() {
        let buffer = SampleBuffer::new(8000, vec![vec![0.1, 0.2], vec![-0.1, -0.2]]);
        let payload = PayloadEncoder::encode(&buffer).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(payload)).unwrap();
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.1, -0.1, 0.2, -0.2]);
    }

    #[test]
    fn test_rejects_ragged_channels() {
        // Built by hand: the constructor only checks lengths in debug builds
        let buffer = SampleBuffer {
            sample_rate: 8000,
            channels: vec![vec![0.1, 0.2, 0.3], vec![0.1]],
        };
        let err = PayloadEncoder::encode(&buffer).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn test_rejects_channelless_buffer() {
        let buffer = SampleBuffer::new(44100, Vec::new());
        assert!(PayloadEncoder::encode(&buffer).is_err());
    }
}
