//! Marker WAV export
//!
//! Decodes the caller's (line, asset) items concurrently, brings each to
//! 44.1 kHz mono, joins them in the given order and writes one PCM16 WAV
//! with a cue marker at the start of every item.

pub mod wav_markers;

use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};
use vatl_common::human_time::format_frames;
use vatl_common::{AssetId, LineId};

use crate::audio::AudioCodec;
use crate::error::{Error, Result};

pub use wav_markers::{to_pcm16, write_marker_wav, EXPORT_CHANNELS, EXPORT_SAMPLE_RATE};

/// One line's audio to place in an export
#[derive(Debug, Clone)]
pub struct ExportItem {
    pub line_id: LineId,
    pub asset_id: AssetId,
    /// Encoded payload as stored
    pub payload: Vec<u8>,
}

/// Build a marker WAV from items in the order given.
///
/// Fails as a whole, naming the item, if any payload cannot be decoded.
pub async fn export_with_markers(
    codec: Arc<dyn AudioCodec>,
    items: Vec<ExportItem>,
) -> Result<Vec<u8>> {
    let item_count = items.len();

    let tasks = items.into_iter().enumerate().map(|(index, item)| {
        let codec = Arc::clone(&codec);
        async move {
            let ExportItem {
                line_id,
                asset_id,
                payload,
            } = item;

            tokio::task::spawn_blocking(move || {
                let decoded = codec.decode(&payload)?;
                codec.resample(&decoded, EXPORT_SAMPLE_RATE, EXPORT_CHANNELS)
            })
            .await
            .map_err(|e| Error::Internal(format!("Export decode task join error: {}", e)))?
            .map_err(|e| match e {
                Error::Decode(reason) => Error::Decode(format!(
                    "export item {} (line {}, asset {}): {}",
                    index, line_id, asset_id, reason
                )),
                other => other,
            })
        }
    });

    // try_join_all keeps input order regardless of completion order
    let segments = try_join_all(tasks).await?;

    let total: usize = segments.iter().map(|s| s.frames()).sum();
    let mut samples: Vec<i16> = Vec::with_capacity(total);
    let mut cues: Vec<u32> = Vec::with_capacity(segments.len());

    for segment in &segments {
        let offset = u32::try_from(samples.len()).map_err(|_| {
            Error::FormatInvariant(format!("cue offset {} exceeds 32 bits", samples.len()))
        })?;
        cues.push(offset);

        if let Some(channel) = segment.channels.first() {
            samples.extend(channel.iter().copied().map(to_pcm16));
        }
        debug!(offset, frames = segment.frames(), "Export segment placed");
    }

    if cues.len() != item_count {
        return Err(Error::FormatInvariant(format!(
            "{} cues for {} items",
            cues.len(),
            item_count
        )));
    }

    let wav = write_marker_wav(&samples, &cues)?;
    info!(
        items = item_count,
        length = %format_frames(samples.len(), EXPORT_SAMPLE_RATE),
        bytes = wav.len(),
        "Marker WAV exported"
    );
    Ok(wav)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{NativeCodec, SampleBuffer};

    fn item(buffer: &SampleBuffer) -> ExportItem {
        ExportItem {
            line_id: LineId::new(),
            asset_id: AssetId::new(),
            payload: NativeCodec.encode(buffer).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_order_follows_input() {
        let quiet = SampleBuffer::mono(44100, vec![0.0; 100]);
        let loud = SampleBuffer::mono(44100, vec![0.5; 300]);

        let wav = export_with_markers(Arc::new(NativeCodec), vec![item(&loud), item(&quiet)])
            .await
            .unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 400);
        assert!(samples[..300].iter().all(|s| *s == 16383));
        assert!(samples[300..].iter().all(|s| *s == 0));
    }

    #[tokio::test]
    async fn test_decode_failure_names_item() {
        let good = item(&SampleBuffer::mono(44100, vec![0.0; 10]));
        let bad = ExportItem {
            line_id: LineId::new(),
            asset_id: AssetId::new(),
            payload: b"not audio".to_vec(),
        };
        let bad_line = bad.line_id;

        let err = export_with_markers(Arc::new(NativeCodec), vec![good, bad])
            .await
            .unwrap_err();

        let Error::Decode(message) = err else {
            panic!("expected decode error, got {:?}", err);
        };
        assert!(message.contains("export item 1"));
        assert!(message.contains(&bad_line.to_string()));
    }
}
