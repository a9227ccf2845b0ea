//! Timeline editing: shift chains, ripple planning and the edit operations
//! built on them

pub mod chain;
pub mod editor;
pub mod ripple;

pub use chain::{resolve_shift_chain, Anchor, ChainMember, ShiftChain};
pub use editor::{EditReport, TimelineEditor};
pub use ripple::{ripple_backward, ripple_forward, Ripple};
