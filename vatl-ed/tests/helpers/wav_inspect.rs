//! Minimal RIFF chunk reader for checking exported files

/// Top-level chunks of a RIFF/WAVE file, in file order
pub struct WavChunks<'a> {
    pub riff_size: u32,
    pub chunks: Vec<([u8; 4], &'a [u8])>,
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

impl<'a> WavChunks<'a> {
    pub fn parse(bytes: &'a [u8]) -> Self {
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let mut chunks = Vec::new();
        let mut at = 12;
        while at + 8 <= bytes.len() {
            let id: [u8; 4] = bytes[at..at + 4].try_into().unwrap();
            let size = u32_at(bytes, at + 4) as usize;
            chunks.push((id, &bytes[at + 8..at + 8 + size]));
            at += 8 + size + size % 2;
        }
        assert_eq!(at, bytes.len(), "trailing bytes after last chunk");

        Self {
            riff_size: u32_at(bytes, 4),
            chunks,
        }
    }

    pub fn ids(&self) -> Vec<&[u8; 4]> {
        self.chunks.iter().map(|(id, _)| id).collect()
    }

    pub fn chunk(&self, id: &[u8; 4]) -> &'a [u8] {
        self.chunks
            .iter()
            .find(|(chunk_id, _)| chunk_id == id)
            .map(|(_, body)| *body)
            .unwrap_or_else(|| panic!("missing chunk {:?}", std::str::from_utf8(id)))
    }

    /// PCM16 samples of the data chunk
    pub fn samples(&self) -> Vec<i16> {
        self.chunk(b"data")
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    /// (cue id, sample offset) per `cue ` record
    pub fn cues(&self) -> Vec<(u32, u32)> {
        let body = self.chunk(b"cue ");
        let count = u32_at(body, 0) as usize;
        assert_eq!(body.len(), 4 + count * 24);
        (0..count)
            .map(|i| {
                let rec = 4 + i * 24;
                assert_eq!(&body[rec + 8..rec + 12], b"data");
                assert_eq!(u32_at(body, rec + 4), u32_at(body, rec + 20));
                (u32_at(body, rec), u32_at(body, rec + 4))
            })
            .collect()
    }

    /// (cue id, label text) per `labl` entry of the adtl list
    pub fn labels(&self) -> Vec<(u32, String)> {
        let body = self.chunk(b"LIST");
        assert_eq!(&body[0..4], b"adtl");

        let mut labels = Vec::new();
        let mut at = 4;
        while at + 8 <= body.len() {
            assert_eq!(&body[at..at + 4], b"labl");
            let size = u32_at(body, at + 4) as usize;
            let id = u32_at(body, at + 8);
            let text = &body[at + 12..at + 8 + size - 1];
            assert_eq!(body[at + 8 + size - 1], 0);
            labels.push((id, String::from_utf8(text.to_vec()).unwrap()));
            at += 8 + size + size % 2;
        }
        labels
    }
}
