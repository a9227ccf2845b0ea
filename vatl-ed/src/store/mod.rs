//! Asset store and project persistence
//!
//! Edit operations never write piecemeal. They build an [`EditBatch`] in
//! memory and hand it to [`ProjectStore::commit`], which applies it in three
//! phases inside one all-or-nothing unit:
//!
//! 1. insert new assets
//! 2. replace the chapter's line list
//! 3. delete assets that are no longer referenced
//!
//! An interrupted commit can therefore leave at worst an unreferenced asset,
//! never a line pointing at a missing one.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use vatl_common::{AssetId, Chapter, ChapterId, Character, CharacterRoster, ProjectId};

use crate::error::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Encoded audio payloads keyed by asset id
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Payload for an asset, `None` if absent
    async fn get(&self, id: AssetId) -> Result<Option<Vec<u8>>>;

    /// Insert or replace an asset
    async fn put(&self, id: AssetId, payload: Vec<u8>) -> Result<()>;

    /// Remove an asset; removing an absent asset is not an error
    async fn delete(&self, id: AssetId) -> Result<()>;

    /// Remove several assets
    async fn bulk_delete(&self, ids: &[AssetId]) -> Result<()>;
}

/// Chapter and role persistence with an atomic edit commit
#[async_trait]
pub trait ProjectStore: AssetStore {
    async fn load_chapter(&self, id: ChapterId) -> Result<Option<Chapter>>;

    async fn load_roster(&self, project_id: ProjectId) -> Result<CharacterRoster>;

    /// Create or replace a chapter with all its lines
    async fn save_chapter(&self, chapter: &Chapter) -> Result<()>;

    /// Create or replace a role; `silent` makes it the project's silent marker
    async fn save_character(
        &self,
        project_id: ProjectId,
        character: &Character,
        silent: bool,
    ) -> Result<()>;

    /// Apply an edit batch all-or-nothing
    async fn commit(&self, batch: EditBatch) -> Result<()>;
}

/// A freshly encoded asset waiting to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    pub id: AssetId,
    pub payload: Vec<u8>,
}

/// Everything one edit writes
#[derive(Debug, Clone, PartialEq)]
pub struct EditBatch {
    /// Assets to insert before the chapter is written
    pub new_assets: Vec<NewAsset>,
    /// Full replacement state of the edited chapter
    pub chapter: Chapter,
    /// Assets to remove after the chapter is written
    pub deleted_assets: Vec<AssetId>,
}

impl EditBatch {
    pub fn new(chapter: Chapter) -> Self {
        Self {
            new_assets: Vec::new(),
            chapter,
            deleted_assets: Vec::new(),
        }
    }

    pub fn create(&mut self, id: AssetId, payload: Vec<u8>) {
        self.new_assets.push(NewAsset { id, payload });
    }

    /// Schedule deletion; `None` and repeats are ignored
    pub fn delete(&mut self, id: Option<AssetId>) {
        if let Some(id) = id {
            if !self.deleted_assets.contains(&id) {
                self.deleted_assets.push(id);
            }
        }
    }

    pub fn created_ids(&self) -> Vec<AssetId> {
        self.new_assets.iter().map(|a| a.id).collect()
    }

    /// Deleted ids that the new chapter state still references
    ///
    /// Always empty for a correctly planned edit.
    pub fn dangling_deletes(&self) -> Vec<AssetId> {
        let referenced = self.chapter.referenced_assets();
        self.deleted_assets
            .iter()
            .copied()
            .filter(|id| referenced.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vatl_common::ScriptLine;

    #[test]
    fn test_delete_ignores_none_and_repeats() {
        let mut batch = EditBatch::new(Chapter::new(ProjectId::new(), "c"));
        let id = AssetId::new();
        batch.delete(None);
        batch.delete(Some(id));
        batch.delete(Some(id));
        assert_eq!(batch.deleted_assets, vec![id]);
    }

    #[test]
    fn test_dangling_deletes() {
        let kept = AssetId::new();
        let mut chapter = Chapter::new(ProjectId::new(), "c");
        chapter.lines.push(ScriptLine::new("x", None).with_audio(kept));

        let mut batch = EditBatch::new(chapter);
        batch.delete(Some(kept));
        batch.delete(Some(AssetId::new()));

        assert_eq!(batch.dangling_deletes(), vec![kept]);
    }
}
