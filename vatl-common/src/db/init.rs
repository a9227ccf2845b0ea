//! Database initialization
//!
//! Creates the project database on first run and brings the schema up to
//! date. Every statement is idempotent, so opening an existing database is
//! the same call as creating a new one.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pool(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Single connection: every pooled connection to `sqlite::memory:` would
/// otherwise see its own empty database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    configure_pool(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

async fn configure_pool(pool: &SqlitePool) -> Result<()> {
    // Line rows reference assets and roles; keep those references honest
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_projects_table(pool).await?;
    create_characters_table(pool).await?;
    create_chapters_table(pool).await?;
    create_audio_assets_table(pool).await?;
    create_script_lines_table(pool).await?;
    Ok(())
}

async fn create_projects_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_characters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS characters (
            guid TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            cv_name TEXT,
            is_silent INTEGER NOT NULL DEFAULT 0 CHECK (is_silent IN (0, 1))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_characters_project ON characters(project_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_chapters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapters (
            guid TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(guid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_audio_assets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audio_assets (
            guid TEXT PRIMARY KEY,
            payload BLOB NOT NULL,
            byte_len INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_script_lines_table(pool: &SqlitePool) -> Result<()> {
    // audio_id has no ON DELETE action: deleting a still-referenced asset
    // must fail rather than silently orphan the line
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS script_lines (
            guid TEXT PRIMARY KEY,
            chapter_id TEXT NOT NULL REFERENCES chapters(guid) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            character_id TEXT REFERENCES characters(guid) ON DELETE SET NULL,
            audio_id TEXT REFERENCES audio_assets(guid),
            sound_effect TEXT,
            UNIQUE (chapter_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_script_lines_chapter ON script_lines(chapter_id, position)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
