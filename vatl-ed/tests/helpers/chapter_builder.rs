//! Seed a store with one chapter, its roles and its assets

use vatl_common::{AssetId, Chapter, Character, CharacterId, ProjectId, ScriptLine};
use vatl_ed::store::{AssetStore, ProjectStore};

pub struct ChapterBuilder {
    pub project_id: ProjectId,
    chapter: Chapter,
    roles: Vec<(Character, bool)>,
    assets: Vec<(AssetId, Vec<u8>)>,
}

impl ChapterBuilder {
    pub fn new() -> Self {
        let project_id = ProjectId::new();
        Self {
            project_id,
            chapter: Chapter::new(project_id, "Chapter 1"),
            roles: Vec::new(),
            assets: Vec::new(),
        }
    }

    pub fn role(&mut self, name: &str, cv_name: Option<&str>) -> CharacterId {
        let character = Character::new(name, cv_name);
        let id = character.id;
        self.roles.push((character, false));
        id
    }

    pub fn silent_role(&mut self, name: &str) -> CharacterId {
        let character = Character::new(name, None);
        let id = character.id;
        self.roles.push((character, true));
        id
    }

    /// Append a line, optionally with an audio payload
    pub fn line(&mut self, role: Option<CharacterId>, payload: Option<Vec<u8>>) -> &mut Self {
        let text = format!("line {}", self.chapter.lines.len() + 1);
        let mut line = ScriptLine::new(text, role);
        if let Some(payload) = payload {
            let asset_id = AssetId::new();
            self.assets.push((asset_id, payload));
            line.audio_id = Some(asset_id);
        }
        self.chapter.lines.push(line);
        self
    }

    /// Write roles, assets and the chapter; returns the stored chapter
    pub async fn save<S: ProjectStore>(&self, store: &S) -> Chapter {
        for (character, silent) in &self.roles {
            store
                .save_character(self.project_id, character, *silent)
                .await
                .unwrap();
        }
        for (id, payload) in &self.assets {
            store.put(*id, payload.clone()).await.unwrap();
        }
        store.save_chapter(&self.chapter).await.unwrap();
        self.chapter.clone()
    }
}
