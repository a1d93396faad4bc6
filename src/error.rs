//! Error type shared by the codec, the containers and record (de)serialization.

use std::io;

use crate::offset::OffsetTag;

/// Errors produced while encoding, decoding or (de)serializing offsets.
///
/// Hot-path precondition violations (advancing a cursor past its last element)
/// are not reported here; they panic.
#[derive(thiserror::Error, Debug)]
pub enum OffsetError {
    /// The underlying reader or writer failed, including short reads.
    #[error("i/o error on offset record: {0}")]
    Io(#[from] io::Error),

    /// The leading tag byte does not name a known encoding.
    #[error("unknown offset encoding tag {0}")]
    UnknownTag(u8),

    /// A decoded field holds a value no valid record can contain.
    #[error("corrupt offset record: {field} = {value}")]
    Corrupt {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was read or computed.
        value: i64,
    },

    /// Input offsets were not strictly increasing.
    #[error("offsets are not strictly increasing at index {index}: prev={prev}, next={next}")]
    NotStrictlyIncreasing {
        /// Index of the element that violated the ordering.
        index: usize,
        /// Previous offset.
        prev: u32,
        /// Offending offset (expected greater than `prev`).
        next: u32,
    },

    /// A gap does not fit an encoding without escapes.
    #[error("gap {gap} at index {index} exceeds the maximum of {max}")]
    GapTooLarge {
        /// Index of the element closing the gap.
        index: usize,
        /// Gap size.
        gap: u32,
        /// Largest gap the encoding can hold.
        max: u32,
    },

    /// A forced encoding was asked to hold a sequence of the wrong length.
    #[error("{tag:?} encoding cannot hold {got} offsets (expected {expected})")]
    LengthMismatch {
        /// Requested encoding.
        tag: OffsetTag,
        /// Number of offsets the encoding holds.
        expected: usize,
        /// Number of offsets given.
        got: usize,
    },

    /// The appended sequence does not start after the current last offset.
    #[error("cannot append offsets starting at {next_first} after last offset {last}")]
    InvalidAppend {
        /// Last offset of the left-hand sequence.
        last: u32,
        /// First offset of the shifted right-hand sequence.
        next_first: u64,
    },
}

/// Result alias for offset operations.
pub type Result<T> = core::result::Result<T, OffsetError>;

impl OffsetError {
    /// Returns true for errors caused by malformed or truncated records.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Io(_) | Self::UnknownTag(_) | Self::Corrupt { .. })
    }

    pub(crate) fn corrupt(field: &'static str, value: impl Into<i64>) -> Self {
        Self::Corrupt {
            field,
            value: value.into(),
        }
    }
}
