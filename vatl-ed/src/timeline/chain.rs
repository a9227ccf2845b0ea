//! Shift chain resolution
//!
//! A shift chain is the ordered subsequence of a chapter's lines that take
//! part in one ripple. It is recomputed for every operation and never
//! stored.

use vatl_common::{CharacterId, CharacterRoster, FilterMode, LineId, ScriptLine};

/// Role identity of the line an operation is anchored on
///
/// Captured once per call; chain members are compared against this snapshot,
/// never against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub character_id: Option<CharacterId>,
    pub cv_name: Option<String>,
}

impl Anchor {
    pub fn of(line: &ScriptLine, roster: &CharacterRoster) -> Self {
        Self {
            character_id: line.character_id,
            cv_name: roster.cv_name_of(line.character_id).map(str::to_string),
        }
    }
}

/// One line in a chain with its position in the chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainMember {
    pub line_id: LineId,
    pub position: usize,
}

/// Ordered chain members, ascending by chapter position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftChain {
    members: Vec<ChainMember>,
}

impl ShiftChain {
    pub fn members(&self) -> &[ChainMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().map(|m| m.position)
    }

    pub fn line_ids(&self) -> Vec<LineId> {
        self.members.iter().map(|m| m.line_id).collect()
    }
}

/// Lines at or after `start` that a ripple in `mode` may touch.
///
/// Silent-marker lines are always excluded. In `Cv` mode an anchor without
/// a voice talent matches nothing.
pub fn resolve_shift_chain(
    lines: &[ScriptLine],
    start: usize,
    mode: FilterMode,
    anchor: &Anchor,
    roster: &CharacterRoster,
) -> ShiftChain {
    let members = lines
        .iter()
        .enumerate()
        .skip(start)
        .filter(|(_, line)| !roster.is_silent(line.character_id))
        .filter(|(_, line)| match mode {
            FilterMode::Chapter => true,
            FilterMode::Character => line.character_id == anchor.character_id,
            FilterMode::Cv => match anchor.cv_name.as_deref() {
                Some(cv) => roster.cv_name_of(line.character_id) == Some(cv),
                None => false,
            },
        })
        .map(|(position, line)| ChainMember {
            line_id: line.id,
            position,
        })
        .collect();

    ShiftChain { members }
}
