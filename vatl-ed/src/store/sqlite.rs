//! SQLite-backed store
//!
//! Chapters, lines, roles and asset payloads live in one database, so an
//! edit batch commits inside a single sqlx transaction.

use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;
use vatl_common::uuid_utils::parse_guid;
use vatl_common::{
    AssetId, Chapter, ChapterId, Character, CharacterId, CharacterRoster, LineId, ProjectId,
    ScriptLine,
};

use crate::error::Result;
use crate::store::{AssetStore, EditBatch, ProjectStore};

/// Store over a VATL SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an initialized pool (see `vatl_common::db::init_database`)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Make sure the project row exists
    pub async fn ensure_project(&self, project_id: ProjectId, name: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO projects (guid, name) VALUES (?, ?) ON CONFLICT(guid) DO UPDATE SET name = excluded.name",
        )
        .bind(project_id.to_string())
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_asset(
        tx: &mut Transaction<'_, Sqlite>,
        id: AssetId,
        payload: &[u8],
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO audio_assets (guid, payload, byte_len, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(payload)
        .bind(payload.len() as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn delete_asset(tx: &mut Transaction<'_, Sqlite>, id: AssetId) -> Result<()> {
        sqlx::query("DELETE FROM audio_assets WHERE guid = ?")
            .bind(id.to_string())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Project rows are owned by the editor; create a placeholder if absent
    async fn touch_project(tx: &mut Transaction<'_, Sqlite>, project_id: ProjectId) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO projects (guid, name) VALUES (?, '')")
            .bind(project_id.to_string())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn write_chapter(tx: &mut Transaction<'_, Sqlite>, chapter: &Chapter) -> Result<()> {
        Self::touch_project(tx, chapter.project_id).await?;

        sqlx::query(
            r#"
            INSERT INTO chapters (guid, project_id, title, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(guid) DO UPDATE SET
                title = excluded.title,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(chapter.id.to_string())
        .bind(chapter.project_id.to_string())
        .bind(&chapter.title)
        .execute(&mut **tx)
        .await?;

        // Positions are rewritten wholesale; merges remove lines
        sqlx::query("DELETE FROM script_lines WHERE chapter_id = ?")
            .bind(chapter.id.to_string())
            .execute(&mut **tx)
            .await?;

        for (position, line) in chapter.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO script_lines (
                    guid, chapter_id, position, text, character_id, audio_id, sound_effect
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(line.id.to_string())
            .bind(chapter.id.to_string())
            .bind(position as i64)
            .bind(&line.text)
            .bind(line.character_id.map(|id| id.to_string()))
            .bind(line.audio_id.map(|id| id.to_string()))
            .bind(line.sound_effect.as_deref())
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl AssetStore for SqliteStore {
    async fn get(&self, id: AssetId) -> Result<Option<Vec<u8>>> {
        let payload: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT payload FROM audio_assets WHERE guid = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(payload)
    }

    async fn put(&self, id: AssetId, payload: Vec<u8>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_asset(&mut tx, id, &payload).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: AssetId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::delete_asset(&mut tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[AssetId]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            Self::delete_asset(&mut tx, *id).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for SqliteStore {
    async fn load_chapter(&self, id: ChapterId) -> Result<Option<Chapter>> {
        let Some(row) = sqlx::query("SELECT guid, project_id, title FROM chapters WHERE guid = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let project_id: String = row.get("project_id");
        let mut chapter = Chapter {
            id,
            project_id: ProjectId(parse_guid("chapters.project_id", &project_id)?),
            title: row.get("title"),
            lines: Vec::new(),
        };

        let rows = sqlx::query(
            r#"
            SELECT guid, text, character_id, audio_id, sound_effect
            FROM script_lines
            WHERE chapter_id = ?
            ORDER BY position
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let guid: String = row.get("guid");
            let character_id: Option<String> = row.get("character_id");
            let audio_id: Option<String> = row.get("audio_id");

            chapter.lines.push(ScriptLine {
                id: LineId(parse_guid("script_lines.guid", &guid)?),
                text: row.get("text"),
                character_id: character_id
                    .map(|s| parse_guid("script_lines.character_id", &s).map(CharacterId))
                    .transpose()?,
                audio_id: audio_id
                    .map(|s| parse_guid("script_lines.audio_id", &s).map(AssetId))
                    .transpose()?,
                sound_effect: row.get("sound_effect"),
            });
        }

        debug!("Loaded chapter {} ({} lines)", id, chapter.lines.len());
        Ok(Some(chapter))
    }

    async fn load_roster(&self, project_id: ProjectId) -> Result<CharacterRoster> {
        let rows = sqlx::query(
            "SELECT guid, name, cv_name, is_silent FROM characters WHERE project_id = ? ORDER BY rowid",
        )
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut roster = CharacterRoster::default();
        for row in rows {
            let guid: String = row.get("guid");
            let id = CharacterId(parse_guid("characters.guid", &guid)?);
            if row.get::<i64, _>("is_silent") != 0 {
                roster.silent_marker = Some(id);
            }
            roster.characters.push(Character {
                id,
                name: row.get("name"),
                cv_name: row.get("cv_name"),
            });
        }

        Ok(roster)
    }

    async fn save_chapter(&self, chapter: &Chapter) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::write_chapter(&mut tx, chapter).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_character(
        &self,
        project_id: ProjectId,
        character: &Character,
        silent: bool,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::touch_project(&mut tx, project_id).await?;

        // At most one silent marker per project
        if silent {
            sqlx::query("UPDATE characters SET is_silent = 0 WHERE project_id = ?")
                .bind(project_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO characters (guid, project_id, name, cv_name, is_silent)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(guid) DO UPDATE SET
                name = excluded.name,
                cv_name = excluded.cv_name,
                is_silent = excluded.is_silent
            "#,
        )
        .bind(character.id.to_string())
        .bind(project_id.to_string())
        .bind(&character.name)
        .bind(character.cv_name.as_deref())
        .bind(silent as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn commit(&self, batch: EditBatch) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for asset in &batch.new_assets {
            Self::insert_asset(&mut tx, asset.id, &asset.payload).await?;
        }

        Self::write_chapter(&mut tx, &batch.chapter).await?;

        for id in &batch.deleted_assets {
            Self::delete_asset(&mut tx, *id).await?;
        }

        tx.commit().await?;

        debug!(
            chapter_id = %batch.chapter.id,
            created = batch.new_assets.len(),
            deleted = batch.deleted_assets.len(),
            "Committed edit batch"
        );
        Ok(())
    }
}
