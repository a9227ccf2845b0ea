//! Test helper modules for vatl-ed integration tests
//!
//! - audio_generator: in-memory WAV payloads with known content
//! - chapter_builder: seed a store with roles, lines and assets
//! - wav_inspect: read back the chunks of an exported WAV

#![allow(dead_code)]

pub mod audio_generator;
pub mod chapter_builder;
pub mod wav_inspect;

pub use audio_generator::{float_wav, pcm16_wav, ramp, ramp_wav};
pub use chapter_builder::ChapterBuilder;
pub use wav_inspect::WavChunks;
