//! Pure ripple planning
//!
//! Ripples move asset references between chain members. They take the
//! current line list by reference and return a fresh list plus the asset
//! that fell off the chain; nothing is mutated in place.

use crate::timeline::chain::ShiftChain;
use vatl_common::{AssetId, ScriptLine};

/// New line list after a ripple
#[derive(Debug, Clone, PartialEq)]
pub struct Ripple {
    pub lines: Vec<ScriptLine>,
    /// Asset no longer referenced by any chain member
    pub evicted: Option<AssetId>,
}

/// Push assets one member later along the chain.
///
/// `incoming` lands on the first member, each member's asset moves to the
/// next member, and the last member's asset is evicted. With an empty chain
/// `incoming` itself is evicted.
pub fn ripple_forward(
    lines: &[ScriptLine],
    chain: &ShiftChain,
    incoming: Option<AssetId>,
) -> Ripple {
    let mut next = lines.to_vec();
    let mut carried = incoming;

    for position in chain.positions() {
        let displaced = lines[position].audio_id;
        next[position].audio_id = carried;
        carried = displaced;
    }

    Ripple {
        lines: next,
        evicted: carried,
    }
}

/// Pull assets one member earlier along the chain.
///
/// Each member takes its successor's asset, the last member is cleared, and
/// the first member's original asset is evicted.
pub fn ripple_backward(lines: &[ScriptLine], chain: &ShiftChain) -> Ripple {
    let members = chain.members();
    let Some(first) = members.first() else {
        return Ripple {
            lines: lines.to_vec(),
            evicted: None,
        };
    };

    let mut next = lines.to_vec();
    for pair in members.windows(2) {
        next[pair[0].position].audio_id = lines[pair[1].position].audio_id;
    }
    if let Some(last) = members.last() {
        next[last.position].audio_id = None;
    }

    Ripple {
        lines: next,
        evicted: lines[first.position].audio_id,
    }
}
