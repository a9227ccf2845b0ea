//! Marker WAV export tests

mod helpers;

use helpers::{float_wav, pcm16_wav, ramp_wav, ChapterBuilder, WavChunks};
use std::sync::Arc;
use vatl_common::{AssetId, LineId};
use vatl_ed::audio::{NativeCodec, SampleBuffer};
use vatl_ed::export::{export_with_markers, ExportItem, EXPORT_SAMPLE_RATE};
use vatl_ed::store::MemoryStore;
use vatl_ed::{Error, TimelineEditor};

fn item(payload: Vec<u8>) -> ExportItem {
    ExportItem {
        line_id: LineId::new(),
        asset_id: AssetId::new(),
        payload,
    }
}

#[tokio::test]
async fn test_one_and_two_seconds() {
    let one = pcm16_wav(EXPORT_SAMPLE_RATE, 1, 44100, 1000);
    let two = pcm16_wav(EXPORT_SAMPLE_RATE, 1, 88200, -1000);

    let wav = export_with_markers(Arc::new(NativeCodec), vec![item(one), item(two)])
        .await
        .unwrap();
    let parsed = WavChunks::parse(&wav);

    assert_eq!(parsed.ids(), vec![b"fmt ", b"data", b"cue ", b"LIST"]);
    assert_eq!(parsed.riff_size as usize, wav.len() - 8);
    assert_eq!(parsed.chunk(b"data").len(), 3 * 44100 * 2);
    assert_eq!(parsed.cues(), vec![(1, 0), (2, 44100)]);
    assert_eq!(
        parsed.labels(),
        vec![(1, "1".to_string()), (2, "2".to_string())]
    );
}

#[tokio::test]
async fn test_stereo_and_foreign_rate_are_canonicalized() {
    // 0.5 s of stereo at 22.05 kHz, then 0.25 s of mono at 48 kHz
    let left_right = SampleBuffer::new(22050, vec![vec![0.25; 11025], vec![-0.75; 11025]]);
    let items = vec![
        item(float_wav(&left_right)),
        item(ramp_wav(48000, 12000)),
    ];

    let wav = export_with_markers(Arc::new(NativeCodec), items).await.unwrap();
    let parsed = WavChunks::parse(&wav);

    let fmt = parsed.chunk(b"fmt ");
    assert_eq!(u16::from_le_bytes([fmt[2], fmt[3]]), 1);
    assert_eq!(
        u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]),
        EXPORT_SAMPLE_RATE
    );

    let samples = parsed.samples();
    let cues = parsed.cues();
    assert_eq!(cues.len(), 2);

    // Segment lengths scale exactly with the rate ratio
    let first_len = cues[1].1 as usize;
    assert_eq!(first_len, 22050);
    assert_eq!(samples.len() - first_len, 11025);

    // Left channel only, at its level from the first frame to the last
    assert!(
        samples[..first_len].iter().all(|s| (*s as i32 - 8191).abs() <= 1),
        "first segment drifts from the constant level"
    );
}

#[tokio::test]
async fn test_resampled_segments_keep_their_length_at_common_rates() {
    let rates = [8000u32, 16000, 22050, 48000];
    let items = rates
        .iter()
        .map(|rate| item(pcm16_wav(*rate, 1, *rate as usize / 10, 400)))
        .collect();

    let wav = export_with_markers(Arc::new(NativeCodec), items).await.unwrap();
    let parsed = WavChunks::parse(&wav);

    // 0.1 s each, so 4410 frames per segment
    let offsets: Vec<u32> = parsed.cues().into_iter().map(|(_, at)| at).collect();
    assert_eq!(offsets, vec![0, 4410, 8820, 13230]);
    assert_eq!(parsed.samples().len(), 4 * 4410);
}

#[tokio::test]
async fn test_cue_offsets_ascend_and_sum() {
    let lengths = [441usize, 1, 2000, 3, 77];
    let items = lengths
        .iter()
        .map(|n| item(pcm16_wav(EXPORT_SAMPLE_RATE, 1, *n, 5)))
        .collect();

    let wav = export_with_markers(Arc::new(NativeCodec), items).await.unwrap();
    let parsed = WavChunks::parse(&wav);

    let offsets: Vec<u32> = parsed.cues().into_iter().map(|(_, at)| at).collect();
    assert_eq!(offsets, vec![0, 441, 442, 2442, 2445]);
    assert_eq!(parsed.samples().len(), lengths.iter().sum::<usize>());
}

#[tokio::test]
async fn test_empty_export() {
    let wav = export_with_markers(Arc::new(NativeCodec), Vec::new())
        .await
        .unwrap();
    let parsed = WavChunks::parse(&wav);
    assert!(parsed.samples().is_empty());
    assert!(parsed.cues().is_empty());
    assert!(parsed.labels().is_empty());
}

#[tokio::test]
async fn test_export_is_deterministic() {
    let items = || {
        vec![
            item(ramp_wav(32000, 3200)),
            item(pcm16_wav(EXPORT_SAMPLE_RATE, 2, 500, 300)),
        ]
    };

    let first = export_with_markers(Arc::new(NativeCodec), items()).await.unwrap();
    let second = export_with_markers(Arc::new(NativeCodec), items()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_any_bad_item_fails_whole_export() {
    let bad = item(b"RIFF....WAVEjunk".to_vec());
    let bad_asset = bad.asset_id;
    let items = vec![item(ramp_wav(44100, 100)), bad, item(ramp_wav(44100, 100))];

    let err = export_with_markers(Arc::new(NativeCodec), items)
        .await
        .unwrap_err();
    let Error::Decode(message) = err else {
        panic!("expected decode error, got {:?}", err);
    };
    assert!(message.contains(&bad_asset.to_string()));
}

#[tokio::test]
async fn test_export_chapter_selects_voiced_lines_in_order() {
    let store = Arc::new(MemoryStore::new());
    let editor = TimelineEditor::new(Arc::clone(&store), Arc::new(NativeCodec));

    let mut b = ChapterBuilder::new();
    let x = b.role("X", None);
    let pause = b.silent_role("(pause)");
    b.line(Some(x), Some(pcm16_wav(EXPORT_SAMPLE_RATE, 1, 44100, 100)))
        .line(Some(x), None)
        .line(Some(pause), Some(pcm16_wav(EXPORT_SAMPLE_RATE, 1, 999, 7)))
        .line(None, Some(pcm16_wav(EXPORT_SAMPLE_RATE, 1, 88200, 200)));
    let chapter = b.save(store.as_ref()).await;

    let wav = editor.export_chapter(chapter.id).await.unwrap();
    let parsed = WavChunks::parse(&wav);

    assert_eq!(parsed.cues(), vec![(1, 0), (2, 44100)]);
    let samples = parsed.samples();
    assert_eq!(samples.len(), 3 * 44100);
    assert!(samples[..44100].iter().all(|s| *s == samples[0]));
    assert!(samples[44100..].iter().all(|s| *s == samples[44100]));
    assert_ne!(samples[0], samples[44100]);
}
