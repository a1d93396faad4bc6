//! Degenerate containers: one offset, or none.

use std::io::{Read, Write};

use crate::error::{OffsetError, Result};
use crate::iter::PositionCursor;
use crate::memory;
use crate::offset::OffsetTag;

/// Exactly one offset. Nothing is packed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffsetSingle {
    offset: u32,
}

impl OffsetSingle {
    /// Container holding only `offset`.
    pub const fn new(offset: u32) -> Self {
        Self { offset }
    }

    /// The offset (also first and last).
    #[inline(always)]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Estimated resident size.
    pub const fn in_memory_size(&self) -> u64 {
        memory::OBJECT_HEADER + memory::INT
    }

    /// Tag plus one `i32`.
    pub const fn exact_size_on_disk(&self) -> u64 {
        1 + 4
    }

    /// Cursor parked on the offset.
    pub fn iter(&self) -> SingleIter {
        SingleIter { offset: self.offset }
    }

    /// Serializes the record.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let value = i32::try_from(self.offset).map_err(|_| OffsetError::corrupt("offset", self.offset))?;
        out.write_all(&[OffsetTag::Single.as_u8()])?;
        out.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Reads the record body after its tag byte.
    pub fn read_fields<R: Read>(input: &mut R) -> Result<Self> {
        let mut raw = [0u8; 4];
        input.read_exact(&mut raw)?;
        let value = i32::from_be_bytes(raw);
        let offset = u32::try_from(value).map_err(|_| OffsetError::corrupt("offset", value))?;
        Ok(Self { offset })
    }

    /// Shifts the offset down by `delta`.
    #[must_use]
    pub fn move_index(&self, delta: u32) -> Self {
        Self {
            offset: self.offset - delta,
        }
    }
}

/// Cursor over an [`OffsetSingle`]; it can never advance.
#[derive(Clone, Copy, Debug)]
pub struct SingleIter {
    offset: u32,
}

impl SingleIter {
    pub(crate) fn at(offset: u32) -> Self {
        Self { offset }
    }
}

impl PositionCursor for SingleIter {
    #[inline(always)]
    fn value(&self) -> u32 {
        self.offset
    }

    fn next(&mut self) -> u32 {
        panic!("advanced past the only offset {}", self.offset)
    }

    unsafe fn next_unchecked(&mut self) -> u32 {
        self.offset
    }

    #[inline(always)]
    fn has_next(&self) -> bool {
        false
    }

    #[inline(always)]
    fn data_index(&self) -> usize {
        0
    }

    #[inline(always)]
    fn offsets_index(&self) -> usize {
        0
    }
}

/// No offsets at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OffsetEmpty;

impl OffsetEmpty {
    /// Estimated resident size.
    pub const fn in_memory_size(&self) -> u64 {
        memory::OBJECT_HEADER
    }

    /// Tag only.
    pub const fn exact_size_on_disk(&self) -> u64 {
        1
    }

    /// Serializes the record.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&[OffsetTag::Empty.as_u8()])?;
        Ok(())
    }
}
