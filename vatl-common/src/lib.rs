//! # VATL Common Library
//!
//! Shared code for the VATL script-audio tools including:
//! - Script model (lines, chapters, speaking roles, audio asset ids)
//! - Database initialization and schema
//! - Configuration loading and root folder resolution
//! - Utility functions

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod human_time;
pub mod model;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use model::{
    AssetId, Chapter, ChapterId, Character, CharacterId, CharacterRoster, FilterMode, LineId,
    ProjectId, ScriptLine,
};
