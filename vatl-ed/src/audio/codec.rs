//! AudioCodec seam
//!
//! Edit operations and the exporter only see this trait, so the decoding
//! stack can be swapped without touching ripple logic.

use crate::audio::decoder::PayloadDecoder;
use crate::audio::encoder::PayloadEncoder;
use crate::audio::resampler::Resampler;
use crate::audio::types::SampleBuffer;
use crate::error::Result;

/// Conversions between asset payloads and sample buffers
pub trait AudioCodec: Send + Sync {
    /// Decode a payload in any supported container
    fn decode(&self, payload: &[u8]) -> Result<SampleBuffer>;

    /// Encode a buffer in the store's native format
    fn encode(&self, buffer: &SampleBuffer) -> Result<Vec<u8>>;

    /// Convert to a target rate and channel count
    fn resample(
        &self,
        buffer: &SampleBuffer,
        target_rate: u32,
        target_channels: u16,
    ) -> Result<SampleBuffer>;

    /// Frames `from..to` of a buffer
    fn slice(&self, buffer: &SampleBuffer, from: usize, to: usize) -> Result<SampleBuffer> {
        buffer.slice(from, to)
    }

    /// Head `0..at` and tail `at..` of a buffer
    fn split(&self, buffer: &SampleBuffer, at: usize) -> Result<(SampleBuffer, SampleBuffer)> {
        Ok((self.slice(buffer, 0, at)?, self.slice(buffer, at, buffer.frames())?))
    }

    /// Buffers joined in order; rate and channel count must match
    fn concat(&self, buffers: &[SampleBuffer]) -> Result<SampleBuffer> {
        SampleBuffer::concat(buffers)
    }
}

/// symphonia decode, rubato resample, hound float-WAV encode
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCodec;

impl AudioCodec for NativeCodec {
    fn decode(&self, payload: &[u8]) -> Result<SampleBuffer> {
        PayloadDecoder::decode(payload)
    }

    fn encode(&self, buffer: &SampleBuffer) -> Result<Vec<u8>> {
        PayloadEncoder::encode(buffer)
    }

    fn resample(
        &self,
        buffer: &SampleBuffer,
        target_rate: u32,
        target_channels: u16,
    ) -> Result<SampleBuffer> {
        Resampler::resample(buffer, target_rate, target_channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn ramp(frames: usize) -> Vec<f32> {
        (0..frames).map(|i| (i as f32 / frames as f32) - 0.5).collect()
    }

    #[test]
    fn test_float_roundtrip_is_exact() {
        let codec = NativeCodec;
        let original = SampleBuffer::new(24000, vec![ramp(2400), ramp(2400)]);

        let payload = codec.encode(&original).unwrap();
        let decoded = codec.decode(&payload).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_split_then_reencode_reproduces_original() {
        let codec = NativeCodec;
        let original = SampleBuffer::mono(44100, ramp(5000));

        let (head, tail) = codec.split(&original, 1234).unwrap();

        let head = codec.decode(&codec.encode(&head).unwrap()).unwrap();
        let tail = codec.decode(&codec.encode(&tail).unwrap()).unwrap();
        assert_eq!(head.frames(), 1234);
        assert_eq!(tail.frames(), 3766);

        let joined = codec.concat(&[head, tail]).unwrap();
        assert_eq!(joined, original);
    }

    #[test]
    fn test_split_bounds() {
        let codec = NativeCodec;
        let original = SampleBuffer::mono(8000, ramp(100));

        let (head, tail) = codec.split(&original, 100).unwrap();
        assert_eq!((head.frames(), tail.frames()), (100, 0));

        let err = codec.split(&original, 101).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_decode_pcm16_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..441 {
                writer.write_sample(((i % 100) * 100) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let decoded = NativeCodec.decode(&cursor.into_inner()).unwrap();
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.channel_count(), 1);
        assert_eq!(decoded.frames(), 441);
        assert!(decoded.channels[0].iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = NativeCodec.decode(b"definitely not audio").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
