//! Audio test payload generation
//!
//! Everything is built in memory with hound; nothing touches the disk.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use vatl_ed::audio::SampleBuffer;

/// Rising ramp in [-0.5, 0.5), distinct at every frame
pub fn ramp(frames: usize) -> Vec<f32> {
    (0..frames).map(|i| i as f32 / frames as f32 - 0.5).collect()
}

/// 32-bit float WAV holding exactly the given buffer
pub fn float_wav(buffer: &SampleBuffer) -> Vec<u8> {
    let spec = WavSpec {
        channels: buffer.channel_count(),
        sample_rate: buffer.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for frame in 0..buffer.frames() {
            for channel in &buffer.channels {
                writer.write_sample(channel[frame]).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Mono float WAV of `frames` ramp samples
pub fn ramp_wav(sample_rate: u32, frames: usize) -> Vec<u8> {
    float_wav(&SampleBuffer::mono(sample_rate, ramp(frames)))
}

/// 16-bit PCM WAV of a constant level on every channel
pub fn pcm16_wav(sample_rate: u32, channels: u16, frames: usize, level: i16) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..frames * channels as usize {
            writer.write_sample(level).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
