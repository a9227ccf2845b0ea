//! Timeline edit operations
//!
//! Every operation follows the same shape:
//!
//! 1. load the chapter and roster, locate the line
//! 2. check preconditions and decode whatever audio is needed
//! 3. plan the full new line list and asset deltas in an [`EditBatch`]
//! 4. hand the batch to [`ProjectStore::commit`]
//!
//! Nothing is written before step 4, so any failure leaves the stored
//! project exactly as it was.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use vatl_common::human_time::{format_frames, format_seconds};
use vatl_common::{AssetId, Chapter, ChapterId, CharacterRoster, FilterMode, LineId};

use crate::audio::{AudioCodec, SampleBuffer};
use crate::error::{Error, Result, ValidationError};
use crate::export::{self, ExportItem};
use crate::store::{EditBatch, ProjectStore};
use crate::timeline::chain::{resolve_shift_chain, Anchor};
use crate::timeline::ripple::{ripple_backward, ripple_forward};

/// Separator placed between the texts of merged lines
pub const MERGE_TEXT_SEPARATOR: &str = " ";

/// What a committed edit changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditReport {
    pub chapter_id: ChapterId,
    /// Lines whose audio reference or text changed
    pub changed_lines: Vec<LineId>,
    /// Lines removed from the chapter (merge only)
    pub removed_lines: Vec<LineId>,
    pub created_assets: Vec<AssetId>,
    pub deleted_assets: Vec<AssetId>,
}

impl EditReport {
    fn from_batch(before: &Chapter, batch: &EditBatch) -> Self {
        let after = &batch.chapter;

        let changed_lines = after
            .lines
            .iter()
            .filter(|line| match before.line(line.id) {
                Some(old) => old.audio_id != line.audio_id || old.text != line.text,
                None => true,
            })
            .map(|line| line.id)
            .collect();

        let removed_lines = before
            .lines
            .iter()
            .filter(|line| after.line(line.id).is_none())
            .map(|line| line.id)
            .collect();

        Self {
            chapter_id: after.id,
            changed_lines,
            removed_lines,
            created_assets: batch.created_ids(),
            deleted_assets: batch.deleted_assets.clone(),
        }
    }
}

/// A loaded chapter with the line an operation is anchored on
struct EditTarget {
    chapter: Chapter,
    roster: CharacterRoster,
    position: usize,
}

impl EditTarget {
    fn audio(&self) -> Result<AssetId> {
        let line = &self.chapter.lines[self.position];
        line.audio_id.ok_or_else(|| ValidationError::NoAudio(line.id).into())
    }

    fn anchor(&self) -> Anchor {
        Anchor::of(&self.chapter.lines[self.position], &self.roster)
    }
}

/// Split, ripple and merge operations over one project store
pub struct TimelineEditor<S: ProjectStore> {
    store: Arc<S>,
    codec: Arc<dyn AudioCodec>,
}

impl<S: ProjectStore> Clone for TimelineEditor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<S: ProjectStore> TimelineEditor<S> {
    pub fn new(store: Arc<S>, codec: Arc<dyn AudioCodec>) -> Self {
        Self { store, codec }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn codec(&self) -> &Arc<dyn AudioCodec> {
        &self.codec
    }

    /// Cut a line's audio at `split_seconds` and ripple the tail forward.
    ///
    /// The head stays on the line. The tail goes to the first eligible line
    /// after it, whose audio moves on to the next eligible line, and so on;
    /// the audio pushed off the end of the chain is deleted. With no eligible
    /// line after it the tail is dropped.
    pub async fn split_at_time(
        &self,
        chapter_id: ChapterId,
        line_id: LineId,
        split_seconds: f64,
        mode: FilterMode,
    ) -> Result<EditReport> {
        let target = self.locate(chapter_id, line_id).await?;
        let original = target.audio()?;
        let buffer = self.decode_asset(original).await?;

        let frames = buffer.frames();
        let at = buffer.frame_at(split_seconds);
        if !(split_seconds > 0.0) || at == 0 || at >= frames {
            return Err(ValidationError::SplitOutOfRange {
                split_seconds,
                duration_seconds: buffer.duration_seconds(),
            }
            .into());
        }

        let (head, tail) = self.codec.split(&buffer, at)?;
        let chain = resolve_shift_chain(
            &target.chapter.lines,
            target.position + 1,
            mode,
            &target.anchor(),
            &target.roster,
        );

        debug!(
            line_id = %line_id,
            split = %format_frames(at, buffer.sample_rate),
            chain_len = chain.len(),
            "Planning split"
        );

        let mut batch = EditBatch::new(target.chapter.clone());

        let head_id = AssetId::new();
        batch.create(head_id, self.encode(head).await?);
        batch.chapter.lines[target.position].audio_id = Some(head_id);
        batch.delete(Some(original));

        if chain.is_empty() {
            debug!("No eligible line after {}; tail audio discarded", line_id);
        } else {
            let tail_id = AssetId::new();
            batch.create(tail_id, self.encode(tail).await?);

            let ripple = ripple_forward(&batch.chapter.lines, &chain, Some(tail_id));
            batch.chapter.lines = ripple.lines;
            batch.delete(ripple.evicted);
        }

        self.commit("split", &target.chapter, batch).await
    }

    /// Move every chain member's audio to the next member, starting at the
    /// given line. The start line ends up empty and the last member's audio
    /// is deleted.
    pub async fn shift_down(
        &self,
        chapter_id: ChapterId,
        line_id: LineId,
        mode: FilterMode,
    ) -> Result<EditReport> {
        let target = self.locate(chapter_id, line_id).await?;
        let chain = resolve_shift_chain(
            &target.chapter.lines,
            target.position,
            mode,
            &target.anchor(),
            &target.roster,
        );
        if chain.is_empty() {
            return Err(ValidationError::NoEligibleLines(line_id).into());
        }

        debug!(line_id = %line_id, chain_len = chain.len(), mode = %mode, "Planning shift down");

        let mut batch = EditBatch::new(target.chapter.clone());
        let ripple = ripple_forward(&batch.chapter.lines, &chain, None);
        batch.chapter.lines = ripple.lines;
        batch.delete(ripple.evicted);

        self.commit("shift_down", &target.chapter, batch).await
    }

    /// Move every chain member's audio to the previous member, starting at
    /// the given line. The start line's audio is deleted and the last member
    /// ends up empty.
    pub async fn shift_up(
        &self,
        chapter_id: ChapterId,
        line_id: LineId,
        mode: FilterMode,
    ) -> Result<EditReport> {
        let target = self.locate(chapter_id, line_id).await?;
        let chain = resolve_shift_chain(
            &target.chapter.lines,
            target.position,
            mode,
            &target.anchor(),
            &target.roster,
        );
        if chain.len() < 2 {
            return Err(ValidationError::NoNextEligibleLine(line_id).into());
        }

        debug!(line_id = %line_id, chain_len = chain.len(), mode = %mode, "Planning shift up");

        let mut batch = EditBatch::new(target.chapter.clone());
        let ripple = ripple_backward(&batch.chapter.lines, &chain);
        batch.chapter.lines = ripple.lines;
        batch.delete(ripple.evicted);

        self.commit("shift_up", &target.chapter, batch).await
    }

    /// Merge a line with the next line of the same role, then pull the
    /// downstream chain up by one.
    ///
    /// The same-role search ignores `mode` and the silent marker. The ripple
    /// after the merge uses `mode`, anchored on the merged line's role, and
    /// starts where the removed line used to be.
    pub async fn merge_with_next_and_shift(
        &self,
        chapter_id: ChapterId,
        line_id: LineId,
        mode: FilterMode,
    ) -> Result<EditReport> {
        let target = self.locate(chapter_id, line_id).await?;
        let role = target.chapter.lines[target.position].character_id;

        let next = target.chapter.lines[target.position + 1..]
            .iter()
            .position(|line| line.character_id == role)
            .map(|offset| target.position + 1 + offset)
            .ok_or(ValidationError::NoNextSameRoleLine(line_id))?;

        let mut batch = self.plan_merge(&target, next).await?;

        let chain = resolve_shift_chain(
            &batch.chapter.lines,
            next,
            mode,
            &target.anchor(),
            &target.roster,
        );
        debug!(line_id = %line_id, chain_len = chain.len(), mode = %mode, "Planning merge ripple");

        if !chain.is_empty() {
            let ripple = ripple_backward(&batch.chapter.lines, &chain);
            batch.chapter.lines = ripple.lines;
            batch.delete(ripple.evicted);
        }

        self.commit("merge_with_next", &target.chapter, batch).await
    }

    /// Merge a line with the line directly after it, whatever its role.
    /// No ripple follows.
    pub async fn merge_adjacent(
        &self,
        chapter_id: ChapterId,
        line_id: LineId,
    ) -> Result<EditReport> {
        let target = self.locate(chapter_id, line_id).await?;
        let next = target.position + 1;
        if next >= target.chapter.lines.len() {
            return Err(ValidationError::NoAdjacentLine(line_id).into());
        }

        let batch = self.plan_merge(&target, next).await?;
        self.commit("merge_adjacent", &target.chapter, batch).await
    }

    /// Store a new recording for a line, replacing any previous one.
    ///
    /// The payload may be in any decodable container; it is stored
    /// re-encoded in the native asset format.
    pub async fn assign_audio(
        &self,
        chapter_id: ChapterId,
        line_id: LineId,
        payload: Vec<u8>,
    ) -> Result<EditReport> {
        let target = self.locate(chapter_id, line_id).await?;
        let buffer = self.decode_payload(payload).await?;

        debug!(
            line_id = %line_id,
            duration = %format_seconds(buffer.duration_seconds()),
            sample_rate = buffer.sample_rate,
            channels = buffer.channel_count(),
            "Assigning audio"
        );

        let mut batch = EditBatch::new(target.chapter.clone());
        let asset_id = AssetId::new();
        batch.create(asset_id, self.encode(buffer).await?);

        let line = &mut batch.chapter.lines[target.position];
        let previous = line.audio_id.replace(asset_id);
        batch.delete(previous);

        self.commit("assign_audio", &target.chapter, batch).await
    }

    /// Drop a line's audio and delete the asset
    pub async fn clear_audio(&self, chapter_id: ChapterId, line_id: LineId) -> Result<EditReport> {
        let target = self.locate(chapter_id, line_id).await?;
        let asset_id = target.audio()?;

        let mut batch = EditBatch::new(target.chapter.clone());
        batch.chapter.lines[target.position].audio_id = None;
        batch.delete(Some(asset_id));

        self.commit("clear_audio", &target.chapter, batch).await
    }

    /// Duration of a stored asset in seconds
    pub async fn asset_duration(&self, asset_id: AssetId) -> Result<f64> {
        Ok(self.decode_asset(asset_id).await?.duration_seconds())
    }

    /// Export every line of a chapter that has audio, in chapter order,
    /// skipping silent-marker lines.
    pub async fn export_chapter(&self, chapter_id: ChapterId) -> Result<Vec<u8>> {
        let chapter = self
            .store
            .load_chapter(chapter_id)
            .await?
            .ok_or(ValidationError::ChapterNotFound(chapter_id))?;
        let roster = self.store.load_roster(chapter.project_id).await?;

        let mut items = Vec::new();
        for line in &chapter.lines {
            let Some(asset_id) = line.audio_id else {
                continue;
            };
            if roster.is_silent(line.character_id) {
                continue;
            }
            let payload = self
                .store
                .get(asset_id)
                .await?
                .ok_or(ValidationError::AssetMissing(asset_id))?;
            items.push(ExportItem {
                line_id: line.id,
                asset_id,
                payload,
            });
        }

        info!(chapter_id = %chapter_id, items = items.len(), "Exporting chapter");
        export::export_with_markers(Arc::clone(&self.codec), items).await
    }

    /// Merge the line at `target.position` with the line at `next`.
    ///
    /// Both lines need audio in matching formats. The joined audio becomes a
    /// new asset on the first line, both old assets are deleted, the texts
    /// are joined and the second line is removed.
    async fn plan_merge(&self, target: &EditTarget, next: usize) -> Result<EditBatch> {
        let first_line = &target.chapter.lines[target.position];
        let second_line = &target.chapter.lines[next];

        let first_asset = first_line
            .audio_id
            .ok_or(ValidationError::NoAudio(first_line.id))?;
        let second_asset = second_line
            .audio_id
            .ok_or(ValidationError::NoAudio(second_line.id))?;

        let (first, second) = tokio::try_join!(
            self.decode_asset(first_asset),
            self.decode_asset(second_asset)
        )?;
        let merged = self.codec.concat(&[first, second])?;

        debug!(
            first = %first_line.id,
            second = %second_line.id,
            frames = merged.frames(),
            duration = %format_seconds(merged.duration_seconds()),
            "Planning merge"
        );

        let mut batch = EditBatch::new(target.chapter.clone());
        let merged_id = AssetId::new();
        batch.create(merged_id, self.encode(merged).await?);

        let text = format!(
            "{}{}{}",
            first_line.text, MERGE_TEXT_SEPARATOR, second_line.text
        );
        let line = &mut batch.chapter.lines[target.position];
        line.audio_id = Some(merged_id);
        line.text = text;
        batch.chapter.lines.remove(next);

        batch.delete(Some(first_asset));
        batch.delete(Some(second_asset));
        Ok(batch)
    }

    async fn locate(&self, chapter_id: ChapterId, line_id: LineId) -> Result<EditTarget> {
        let chapter = self
            .store
            .load_chapter(chapter_id)
            .await?
            .ok_or(ValidationError::ChapterNotFound(chapter_id))?;

        let position = chapter
            .position_of(line_id)
            .ok_or(ValidationError::LineNotFound {
                chapter: chapter_id,
                line: line_id,
            })?;

        let roster = self.store.load_roster(chapter.project_id).await?;

        Ok(EditTarget {
            chapter,
            roster,
            position,
        })
    }

    async fn decode_asset(&self, asset_id: AssetId) -> Result<SampleBuffer> {
        let payload = self
            .store
            .get(asset_id)
            .await?
            .ok_or(ValidationError::AssetMissing(asset_id))?;

        self.decode_payload(payload).await.map_err(|e| match e {
            Error::Decode(reason) => Error::Decode(format!("asset {}: {}", asset_id, reason)),
            other => other,
        })
    }

    async fn decode_payload(&self, payload: Vec<u8>) -> Result<SampleBuffer> {
        let codec = Arc::clone(&self.codec);
        tokio::task::spawn_blocking(move || codec.decode(&payload))
            .await
            .map_err(|e| Error::Internal(format!("Decode task join error: {}", e)))?
    }

    async fn encode(&self, buffer: SampleBuffer) -> Result<Vec<u8>> {
        let codec = Arc::clone(&self.codec);
        tokio::task::spawn_blocking(move || codec.encode(&buffer))
            .await
            .map_err(|e| Error::Internal(format!("Encode task join error: {}", e)))?
    }

    async fn commit(
        &self,
        operation: &str,
        before: &Chapter,
        batch: EditBatch,
    ) -> Result<EditReport> {
        let dangling = batch.dangling_deletes();
        if !dangling.is_empty() {
            return Err(Error::Internal(format!(
                "{} would delete assets still referenced: {:?}",
                operation, dangling
            )));
        }

        let report = EditReport::from_batch(before, &batch);
        self.store.commit(batch).await?;

        info!(
            operation,
            chapter_id = %report.chapter_id,
            changed = report.changed_lines.len(),
            removed = report.removed_lines.len(),
            created = report.created_assets.len(),
            deleted = report.deleted_assets.len(),
            "Edit committed"
        );
        Ok(report)
    }
}
