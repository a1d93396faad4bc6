//! Variant tag stored as the first byte of every serialized record.

use serde::{Deserialize, Serialize};

use crate::error::OffsetError;

/// Identifies an offset encoding on disk.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OffsetTag {
    /// Byte gaps with zero-byte escapes.
    Byte = 0,
    /// `u16` gaps with zero-word escapes.
    Char = 1,
    /// Exactly one offset.
    Single = 2,
    /// No offsets.
    Empty = 3,
    /// Byte gaps, no escapes.
    ByteNz = 4,
}

impl OffsetTag {
    /// The tag byte.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OffsetTag {
    type Error = OffsetError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Byte),
            1 => Ok(Self::Char),
            2 => Ok(Self::Single),
            3 => Ok(Self::Empty),
            4 => Ok(Self::ByteNz),
            other => Err(OffsetError::UnknownTag(other)),
        }
    }
}
