//! Audio decoder using symphonia
//!
//! Decodes an in-memory asset payload (WAV, FLAC, MP3, Vorbis, AAC/MP4) to
//! planar f32 samples at the source rate and channel count.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer as InterleaveBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Stateless symphonia decoder
pub struct PayloadDecoder;

impl PayloadDecoder {
    /// Decode an entire payload to planar samples.
    ///
    /// # Errors
    /// - Payload is not a recognised container
    /// - No audio track, or the track lacks a sample rate
    /// - Container read failure other than end of stream
    pub fn decode(payload: &[u8]) -> Result<SampleBuffer> {
        debug!("Decoding payload of {} bytes", payload.len());

        let source = Box::new(Cursor::new(payload.to_vec()));
        let mss = MediaSourceStream::new(source, Default::default());

        // Payloads carry no file name, so the probe works from content alone
        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut sample_rate = codec_params.sample_rate;
        let mut channels: Option<Vec<Vec<f32>>> = codec_params
            .channels
            .map(|c| vec![Vec::new(); c.count()]);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    return Err(Error::Decode("Stream reset required mid-payload".to_string()));
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Error reading packet: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packet; skip it like a player would
                    warn!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(Error::Decode(format!("Decoder failure: {}", e))),
            };

            let spec = *decoded.spec();
            let frames = decoded.frames();
            let channel_count = spec.channels.count();

            sample_rate.get_or_insert(spec.rate);
            let planar = channels.get_or_insert_with(|| vec![Vec::new(); channel_count]);
            if planar.len() != channel_count {
                return Err(Error::Decode(format!(
                    "Channel count changed mid-stream ({} -> {})",
                    planar.len(),
                    channel_count
                )));
            }

            if frames == 0 {
                continue;
            }

            let mut scratch = InterleaveBuffer::<f32>::new(decoded.capacity() as u64, spec);
            scratch.copy_planar_ref(decoded);
            let samples = scratch.samples();

            for (ch, dst) in planar.iter_mut().enumerate() {
                dst.extend_from_slice(&samples[ch * frames..(ch + 1) * frames]);
            }
        }

        let sample_rate =
            sample_rate.ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;
        let channels =
            channels.ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

        let buffer = SampleBuffer::new(sample_rate, channels);
        debug!(
            "Decoded {} frames at {}Hz ({} channels)",
            buffer.frames(),
            buffer.sample_rate,
            buffer.channel_count()
        );

        Ok(buffer)
    }
}
