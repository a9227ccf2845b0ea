//! In-memory store
//!
//! Mirrors the SQLite store's referential rules: a line may not reference a
//! missing asset and a referenced asset may not be deleted. Commits are
//! staged on a copy and swapped in only when every phase succeeds.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use vatl_common::{
    AssetId, Chapter, ChapterId, Character, CharacterRoster, ProjectId,
};

use crate::error::{Error, Result};
use crate::store::{AssetStore, EditBatch, ProjectStore};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    assets: HashMap<AssetId, Vec<u8>>,
    chapters: HashMap<ChapterId, Chapter>,
    rosters: HashMap<ProjectId, CharacterRoster>,
}

impl MemoryState {
    fn referenced(&self, id: AssetId) -> bool {
        self.chapters
            .values()
            .any(|c| c.lines.iter().any(|l| l.audio_id == Some(id)))
    }

    fn write_chapter(&mut self, chapter: &Chapter) -> Result<()> {
        if let Some(missing) = chapter
            .referenced_assets()
            .into_iter()
            .find(|id| !self.assets.contains_key(id))
        {
            return Err(Error::Store(format!(
                "chapter {} references missing asset {}",
                chapter.id, missing
            )));
        }
        self.chapters.insert(chapter.id, chapter.clone());
        Ok(())
    }

    fn delete_asset(&mut self, id: AssetId) -> Result<()> {
        if self.referenced(id) {
            return Err(Error::Store(format!("asset {} is still referenced", id)));
        }
        self.assets.remove(&id);
        Ok(())
    }
}

/// Store kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following commit fail with a store error
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of stored assets
    pub async fn asset_count(&self) -> usize {
        self.state.read().await.assets.len()
    }

    /// True if the asset exists
    pub async fn contains_asset(&self, id: AssetId) -> bool {
        self.state.read().await.assets.contains_key(&id)
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn get(&self, id: AssetId) -> Result<Option<Vec<u8>>> {
        Ok(self.state.read().await.assets.get(&id).cloned())
    }

    async fn put(&self, id: AssetId, payload: Vec<u8>) -> Result<()> {
        self.state.write().await.assets.insert(id, payload);
        Ok(())
    }

    async fn delete(&self, id: AssetId) -> Result<()> {
        self.state.write().await.delete_asset(id)
    }

    async fn bulk_delete(&self, ids: &[AssetId]) -> Result<()> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        for id in ids {
            staged.delete_asset(*id)?;
        }
        *state = staged;
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn load_chapter(&self, id: ChapterId) -> Result<Option<Chapter>> {
        Ok(self.state.read().await.chapters.get(&id).cloned())
    }

    async fn load_roster(&self, project_id: ProjectId) -> Result<CharacterRoster> {
        Ok(self
            .state
            .read()
            .await
            .rosters
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_chapter(&self, chapter: &Chapter) -> Result<()> {
        self.state.write().await.write_chapter(chapter)
    }

    async fn save_character(
        &self,
        project_id: ProjectId,
        character: &Character,
        silent: bool,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let roster = state.rosters.entry(project_id).or_default();

        match roster.characters.iter_mut().find(|c| c.id == character.id) {
            Some(existing) => *existing = character.clone(),
            None => roster.characters.push(character.clone()),
        }

        if silent {
            roster.silent_marker = Some(character.id);
        } else if roster.silent_marker == Some(character.id) {
            roster.silent_marker = None;
        }
        Ok(())
    }

    async fn commit(&self, batch: EditBatch) -> Result<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(Error::Store("injected commit failure".to_string()));
        }

        let mut state = self.state.write().await;
        let mut staged = state.clone();

        for asset in &batch.new_assets {
            staged.assets.insert(asset.id, asset.payload.clone());
        }
        staged.write_chapter(&batch.chapter)?;
        for id in &batch.deleted_assets {
            staged.delete_asset(*id)?;
        }

        *state = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vatl_common::ScriptLine;

    #[tokio::test]
    async fn test_chapter_cannot_reference_missing_asset() {
        let store = MemoryStore::new();
        let mut chapter = Chapter::new(ProjectId::new(), "c");
        chapter.lines.push(ScriptLine::new("x", None).with_audio(AssetId::new()));

        assert!(store.save_chapter(&chapter).await.is_err());
        assert!(store.load_chapter(chapter.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_referenced_asset_cannot_be_deleted() {
        let store = MemoryStore::new();
        let id = AssetId::new();
        store.put(id, vec![1, 2, 3]).await.unwrap();

        let mut chapter = Chapter::new(ProjectId::new(), "c");
        chapter.lines.push(ScriptLine::new("x", None).with_audio(id));
        store.save_chapter(&chapter).await.unwrap();

        assert!(store.delete(id).await.is_err());
        assert!(store.contains_asset(id).await);
    }

    #[tokio::test]
    async fn test_failed_commit_changes_nothing() {
        let store = MemoryStore::new();
        let old = AssetId::new();
        store.put(old, vec![0]).await.unwrap();

        let mut chapter = Chapter::new(ProjectId::new(), "c");
        chapter.lines.push(ScriptLine::new("x", None).with_audio(old));
        store.save_chapter(&chapter).await.unwrap();

        // Deleting the still-referenced asset fails in phase 3
        let mut batch = EditBatch::new(chapter.clone());
        let fresh = AssetId::new();
        batch.create(fresh, vec![9]);
        batch.delete(Some(old));

        assert!(store.commit(batch).await.is_err());
        assert!(!store.contains_asset(fresh).await);
        assert!(store.contains_asset(old).await);
    }

    #[tokio::test]
    async fn test_silent_marker_moves() {
        let store = MemoryStore::new();
        let project = ProjectId::new();
        let a = Character::new("A", None);
        let b = Character::new("B", None);

        store.save_character(project, &a, true).await.unwrap();
        store.save_character(project, &b, true).await.unwrap();

        let roster = store.load_roster(project).await.unwrap();
        assert_eq!(roster.characters.len(), 2);
        assert_eq!(roster.silent_marker, Some(b.id));
    }
}
