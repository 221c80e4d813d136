//! Error types emitted by the splitting and reassembly layer.
//!
//! Splitting errors surface to callers of `send`. Reassembly errors never
//! reach the application; the proxy absorbs and counts them.

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

use crate::hash::Hash;

/// Errors produced while splitting an outbound message.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The message, its header or its body could not be encoded.
    #[error("failed to encode message: {0}")]
    Encode(#[from] EncodeError),
    /// The message needs more parts than a `u32` can count.
    #[error("message of {size} bytes needs too many parts")]
    TooManyParts { size: usize },
}

/// Reasons a frame is refused before it touches any assembly.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MalformedFrame {
    /// The part number lies outside `[0, num_parts)`.
    #[error("part {part_num} out of range for {num_parts} parts")]
    PartOutOfRange { part_num: u32, num_parts: u32 },
    /// The part count exceeds the configured limit.
    #[error("{num_parts} parts exceeds the limit of {limit}")]
    TooManyParts { num_parts: u32, limit: u32 },
    /// The part count disagrees with an assembly already in progress.
    #[error("assembly {data_hash:?} expects {expected} parts, frame claims {found}")]
    PartCountMismatch {
        data_hash: Hash,
        expected: u32,
        found: u32,
    },
}

impl MalformedFrame {
    /// Short label used for logs and metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::PartOutOfRange { .. } => "part_out_of_range",
            Self::TooManyParts { .. } => "too_many_parts",
            Self::PartCountMismatch { .. } => "part_count_mismatch",
        }
    }
}

/// Errors produced by [`ReassemblyTable::insert`](crate::fragment::ReassemblyTable::insert).
#[derive(Debug, Error)]
pub enum ReassemblyError {
    /// The frame was rejected without modifying the table.
    #[error("malformed frame: {0}")]
    Malformed(#[from] MalformedFrame),
    /// The assembly completed but its bytes did not decode; it was discarded.
    #[error("assembly {data_hash:?} failed to decode: {source}")]
    Decode {
        data_hash: Hash,
        #[source]
        source: DecodeError,
    },
}
