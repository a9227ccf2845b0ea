//! Error types for vatl-ed
//!
//! Validation and decode failures are reported before anything is written,
//! so callers can surface them to the user knowing nothing changed.

use thiserror::Error;
use vatl_common::{AssetId, ChapterId, LineId};

/// Main error type for vatl-ed
#[derive(Error, Debug)]
pub enum Error {
    /// Request rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Audio payload could not be decoded
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Sample buffer could not be written to the native asset format
    #[error("Audio encode error: {0}")]
    Encode(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Asset or project store failure outside the database
    #[error("Store error: {0}")]
    Store(String),

    /// Errors bubbled up from vatl-common
    #[error("Common error: {0}")]
    Common(#[from] vatl_common::Error),

    /// Internal inconsistency while building output (programmer error)
    #[error("Format invariant violated: {0}")]
    FormatInvariant(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for rejections the user can act on (nothing was mutated)
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Reasons an edit request is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("chapter {0} not found")]
    ChapterNotFound(ChapterId),

    #[error("line {line} not found in chapter {chapter}")]
    LineNotFound { chapter: ChapterId, line: LineId },

    #[error("line {0} has no audio")]
    NoAudio(LineId),

    #[error("audio asset {0} is referenced but missing from the store")]
    AssetMissing(AssetId),

    #[error("split point {split_seconds:.3}s is outside the audio (duration {duration_seconds:.3}s)")]
    SplitOutOfRange {
        split_seconds: f64,
        duration_seconds: f64,
    },

    #[error("no eligible lines from line {0} in this scope")]
    NoEligibleLines(LineId),

    #[error("no next eligible line after line {0} in this scope")]
    NoNextEligibleLine(LineId),

    #[error("no later line shares the role of line {0}")]
    NoNextSameRoleLine(LineId),

    #[error("line {0} is the last line of the chapter")]
    NoAdjacentLine(LineId),

    #[error("sample rates differ ({first} Hz vs {second} Hz)")]
    SampleRateMismatch { first: u32, second: u32 },

    #[error("channel counts differ ({first} vs {second})")]
    ChannelMismatch { first: u16, second: u16 },

    #[error("invalid sample range {from}..{to} for buffer of {frames} frames")]
    InvalidRange { from: usize, to: usize, frames: usize },
}

/// Convenience Result type using vatl-ed Error
pub type Result<T> = std::result::Result<T, Error>;
