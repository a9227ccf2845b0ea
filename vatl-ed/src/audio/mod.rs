//! Audio codec: decode, resample, slice, concatenate and encode asset payloads

pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod resampler;
pub mod types;

pub use codec::{AudioCodec, NativeCodec};
pub use types::SampleBuffer;
