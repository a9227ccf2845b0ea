//! Script model shared by the editor and persistence layers
//!
//! A project owns a roster of speaking roles and a set of chapters. Each
//! chapter is an ordered list of script lines; the order is narrative time
//! and drives every ripple and export operation. A line references at most
//! one audio asset by id; the payload itself lives in the asset store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random id
            pub fn new() -> Self {
                Self(crate::uuid_utils::generate())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                crate::uuid_utils::parse(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Project identity
    ProjectId
);
define_id!(
    /// Chapter identity
    ChapterId
);
define_id!(
    /// Script line identity
    LineId
);
define_id!(
    /// Speaking role identity
    CharacterId
);
define_id!(
    /// Audio asset identity (key into the asset store)
    AssetId
);

/// One line of a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub id: LineId,
    pub text: String,
    /// Speaking role, if assigned
    pub character_id: Option<CharacterId>,
    /// Audio asset currently assigned to this line
    pub audio_id: Option<AssetId>,
    /// Free-form sound-effect tag
    pub sound_effect: Option<String>,
}

impl ScriptLine {
    pub fn new(text: impl Into<String>, character_id: Option<CharacterId>) -> Self {
        Self {
            id: LineId::new(),
            text: text.into(),
            character_id,
            audio_id: None,
            sound_effect: None,
        }
    }

    /// Builder-style helper to attach an asset
    pub fn with_audio(mut self, audio_id: AssetId) -> Self {
        self.audio_id = Some(audio_id);
        self
    }
}

/// Ordered sequence of script lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub project_id: ProjectId,
    pub title: String,
    pub lines: Vec<ScriptLine>,
}

impl Chapter {
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            id: ChapterId::new(),
            project_id,
            title: title.into(),
            lines: Vec::new(),
        }
    }

    /// Position of a line in chapter order
    pub fn position_of(&self, line_id: LineId) -> Option<usize> {
        self.lines.iter().position(|l| l.id == line_id)
    }

    pub fn line(&self, line_id: LineId) -> Option<&ScriptLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// All asset ids referenced by this chapter, in line order
    pub fn referenced_assets(&self) -> Vec<AssetId> {
        self.lines.iter().filter_map(|l| l.audio_id).collect()
    }
}

/// Speaking role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    /// Voice talent identity ("CV name")
    pub cv_name: Option<String>,
}

impl Character {
    pub fn new(name: impl Into<String>, cv_name: Option<&str>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            cv_name: cv_name.map(str::to_string),
        }
    }
}

/// The speaking roles of one project, plus the designated silent marker
///
/// Lines assigned to the silent-marker role never take part in ripples or
/// exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRoster {
    pub characters: Vec<Character>,
    pub silent_marker: Option<CharacterId>,
}

impl CharacterRoster {
    pub fn new(characters: Vec<Character>, silent_marker: Option<CharacterId>) -> Self {
        Self {
            characters,
            silent_marker,
        }
    }

    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Voice talent identity for a (possibly absent) role
    pub fn cv_name_of(&self, id: Option<CharacterId>) -> Option<&str> {
        id.and_then(|id| self.get(id))
            .and_then(|c| c.cv_name.as_deref())
    }

    /// True when the role is the silent marker
    pub fn is_silent(&self, id: Option<CharacterId>) -> bool {
        match (id, self.silent_marker) {
            (Some(id), Some(silent)) => id == silent,
            _ => false,
        }
    }
}

/// Scope of a ripple operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Every non-silent line of the chapter
    #[default]
    Chapter,
    /// Lines sharing the anchor's role
    Character,
    /// Lines whose role has the anchor's voice talent
    Cv,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Chapter => "chapter",
            FilterMode::Character => "character",
            FilterMode::Cv => "cv",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chapter" => Ok(FilterMode::Chapter),
            "character" | "role" => Ok(FilterMode::Character),
            "cv" => Ok(FilterMode::Cv),
            other => Err(Error::InvalidInput(format!(
                "Unknown filter mode '{}' (expected chapter, character or cv)",
                other
            ))),
        }
    }
}
