//! RIFF/WAVE writer with cue markers
//!
//! Chunk order is fixed: `fmt `, `data`, `cue `, `LIST`/`adtl`. Every cue
//! gets a `labl` whose text is its 1-based index, which is what audio
//! workstations show as the marker name.

use crate::error::{Error, Result};

/// Output sample rate of every export
pub const EXPORT_SAMPLE_RATE: u32 = 44100;
/// Output channel count of every export
pub const EXPORT_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = EXPORT_CHANNELS * BITS_PER_SAMPLE / 8;
const CUE_RECORD_SIZE: usize = 24;

/// Clamp to [-1, 1], scale by 32767 and truncate toward zero
pub fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Build the complete WAV file.
///
/// `cues` are sample-frame offsets into `samples`, one per marker, in
/// ascending order.
pub fn write_marker_wav(samples: &[i16], cues: &[u32]) -> Result<Vec<u8>> {
    if cues.windows(2).any(|w| w[0] > w[1]) {
        return Err(Error::FormatInvariant(format!(
            "cue offsets are not ascending: {:?}",
            cues
        )));
    }
    if let Some(last) = cues.last() {
        if *last as usize > samples.len() {
            return Err(Error::FormatInvariant(format!(
                "cue offset {} is past the end of {} samples",
                last,
                samples.len()
            )));
        }
    }

    let data_size = chunk_size(samples.len() * BLOCK_ALIGN as usize, "data")?;
    let cue_chunk = build_cue_chunk(cues)?;
    let adtl_chunk = build_adtl_chunk(cues)?;

    let total = 12 + (8 + 16) + (8 + data_size as usize) + cue_chunk.len() + adtl_chunk.len();
    let riff_size = chunk_size(total - 8, "RIFF")?;

    let mut out = Vec::with_capacity(total);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    let byte_rate = EXPORT_SAMPLE_RATE * BLOCK_ALIGN as u32;
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&EXPORT_CHANNELS.to_le_bytes());
    out.extend_from_slice(&EXPORT_SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&BLOCK_ALIGN.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out.extend_from_slice(&cue_chunk);
    out.extend_from_slice(&adtl_chunk);

    if out.len() != total {
        return Err(Error::FormatInvariant(format!(
            "wrote {} bytes, expected {}",
            out.len(),
            total
        )));
    }
    Ok(out)
}

fn chunk_size(len: usize, chunk: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| Error::FormatInvariant(format!("{} chunk too large: {} bytes", chunk, len)))
}

/// `cue ` chunk: count, then one 24-byte record per marker
fn build_cue_chunk(cues: &[u32]) -> Result<Vec<u8>> {
    let count = chunk_size(cues.len(), "cue ")?;
    let size = chunk_size(4 + CUE_RECORD_SIZE * cues.len(), "cue ")?;

    let mut data = Vec::with_capacity(8 + size as usize);
    data.extend_from_slice(b"cue ");
    data.extend_from_slice(&size.to_le_bytes());
    data.extend_from_slice(&count.to_le_bytes());

    for (i, position) in cues.iter().enumerate() {
        data.extend_from_slice(&(i as u32 + 1).to_le_bytes());
        data.extend_from_slice(&position.to_le_bytes());
        data.extend_from_slice(b"data");
        data.extend_from_slice(&0u32.to_le_bytes()); // chunk start
        data.extend_from_slice(&0u32.to_le_bytes()); // block start
        data.extend_from_slice(&position.to_le_bytes()); // sample offset
    }

    if data.len() != 8 + size as usize {
        return Err(Error::FormatInvariant(format!(
            "cue chunk holds {} bytes for {} markers",
            data.len(),
            cues.len()
        )));
    }
    Ok(data)
}

/// `LIST`/`adtl` chunk with one `labl` per marker
///
/// A `labl` size field holds the unpadded length; the sub-chunk itself is
/// padded to an even byte count.
fn build_adtl_chunk(cues: &[u32]) -> Result<Vec<u8>> {
    let mut list_data = Vec::new();

    for i in 0..cues.len() {
        let id = i as u32 + 1;
        let text = id.to_string();
        let label_size = 4 + text.len() as u32 + 1;

        list_data.extend_from_slice(b"labl");
        list_data.extend_from_slice(&label_size.to_le_bytes());
        list_data.extend_from_slice(&id.to_le_bytes());
        list_data.extend_from_slice(text.as_bytes());
        list_data.push(0);

        if label_size % 2 == 1 {
            list_data.push(0);
        }
    }

    let size = chunk_size(4 + list_data.len(), "LIST")?;
    let mut data = Vec::with_capacity(8 + size as usize);
    data.extend_from_slice(b"LIST");
    data.extend_from_slice(&size.to_le_bytes());
    data.extend_from_slice(b"adtl");
    data.extend_from_slice(&list_data);
    Ok(data)
}
