//! # VATL Timeline Editor Library (vatl-ed)
//!
//! Per-line audio editing for voiced scripts.
//!
//! **Purpose:** Split, ripple-shift and merge the audio assigned to script
//! lines across a chapter, a speaking role or a voice talent, and export a
//! chapter as one WAV with a cue marker per line.
//!
//! **Architecture:** symphonia decode, rubato resample and hound encode behind
//! the [`audio::AudioCodec`] trait; pure chain resolution and ripple planning
//! in [`timeline`]; atomic commits through [`store::ProjectStore`].

pub mod audio;
pub mod error;
pub mod export;
pub mod store;
pub mod timeline;

pub use error::{Error, Result, ValidationError};
pub use timeline::{EditReport, TimelineEditor};
