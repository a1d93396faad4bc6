//! Byte-packed offsets without escapes.
//!
//! Every gap is a single byte in `1..=255`, so the buffer position and the
//! logical element index always agree. Sequences with a wider gap must use
//! [`OffsetByte`](super::OffsetByte) or [`OffsetChar`](super::OffsetChar).

use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::Result;
use crate::iter::{OffsetCursor, PositionCursor};
use crate::memory;
use crate::offset::record::{self, RECORD_PREFIX_LEN};
use crate::offset::{OffsetSliceInfo, OffsetTag, Offsets};

/// Offsets stored as one unescaped byte per gap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffsetByteNz {
    offsets: Arc<[u8]>,
    offset_to_first: u32,
    offset_to_last: u32,
}

impl OffsetByteNz {
    /// Wraps a packed gap buffer and its cached bounds.
    ///
    /// Nothing is validated: every gap must be `<= 255` and summing the gaps
    /// from `offset_to_first` must reach `offset_to_last`. Use
    /// [`factory::create`](crate::factory::create) to build from raw offsets.
    pub fn new(offsets: impl Into<Arc<[u8]>>, offset_to_first: u32, offset_to_last: u32) -> Self {
        Self {
            offsets: offsets.into(),
            offset_to_first,
            offset_to_last,
        }
    }

    /// First offset.
    #[inline(always)]
    pub fn offset_to_first(&self) -> u32 {
        self.offset_to_first
    }

    /// Last offset.
    #[inline(always)]
    pub fn offset_to_last(&self) -> u32 {
        self.offset_to_last
    }

    /// The packed gap bytes.
    #[inline]
    pub fn packed(&self) -> &[u8] {
        &self.offsets
    }

    /// Number of offsets, counting the implicit first one.
    #[inline]
    pub fn size(&self) -> usize {
        self.offsets.len() + 1
    }

    /// Estimated resident size of this container.
    pub fn in_memory_size(&self) -> u64 {
        Self::estimate_in_memory_size(self.offsets.len())
    }

    /// Estimated resident size of a container holding `n_bytes` packed bytes.
    pub const fn estimate_in_memory_size(n_bytes: usize) -> u64 {
        // header, two bounds, buffer reference
        memory::OBJECT_HEADER + memory::INT + memory::INT + memory::REFERENCE + memory::byte_array_cost(n_bytes)
    }

    /// Exact length of the serialized record.
    pub fn exact_size_on_disk(&self) -> u64 {
        RECORD_PREFIX_LEN + self.offsets.len() as u64
    }

    /// Position cursor at the first offset.
    #[inline]
    pub fn iter(&self) -> ByteNzIter<'_> {
        ByteNzIter {
            bytes: &self.offsets,
            offset: self.offset_to_first,
            index: 0,
        }
    }

    /// Position cursor resumed at a known `(index, offset)` pair.
    #[inline]
    pub fn iter_from(&self, index: usize, offset: u32) -> ByteNzIter<'_> {
        debug_assert!(index <= self.offsets.len());
        ByteNzIter {
            bytes: &self.offsets,
            offset,
            index,
        }
    }

    /// Offset-only cursor at the first offset.
    #[inline]
    pub fn offset_iter(&self) -> ByteNzOffsetIter<'_> {
        ByteNzOffsetIter {
            bytes: &self.offsets,
            offset: self.offset_to_first,
            index: 0,
        }
    }

    /// Serializes the record.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        record::write_record(out, OffsetTag::ByteNz, self.offset_to_first, self.offset_to_last, &self.offsets[..])
    }

    /// Reads the record body after its tag byte.
    pub fn read_fields<R: Read>(input: &mut R) -> Result<Self> {
        let (first, offsets, last) = record::read_record::<R, u8>(input)?;
        Ok(Self {
            offsets,
            offset_to_first: first,
            offset_to_last: last,
        })
    }

    /// Cuts `packed[low_off..high_off]` into a new container.
    ///
    /// The bounds come from a previous scan; no search happens here. The
    /// returned slice info covers the logical range `[low, high + 1)`.
    ///
    /// # Panics
    /// Panics if `low_off..high_off` is not a valid range of the buffer.
    pub fn slice(
        &self,
        low_off: usize,
        high_off: usize,
        low_value: u32,
        high_value: u32,
        low: usize,
        high: usize,
    ) -> OffsetSliceInfo {
        let bytes: Arc<[u8]> = self.offsets[low_off..high_off].into();
        let offsets = Offsets::ByteNz(Self::new(bytes, low_value, high_value));
        OffsetSliceInfo::new(low, high + 1, offsets)
    }

    /// Shifts both bounds down by `delta`, sharing the packed buffer.
    ///
    /// # Panics
    /// Panics in debug builds if `delta > offset_to_first`.
    #[must_use]
    pub fn move_index(&self, delta: u32) -> Self {
        Self {
            offsets: Arc::clone(&self.offsets),
            offset_to_first: self.offset_to_first - delta,
            offset_to_last: self.offset_to_last - delta,
        }
    }

    /// True when both containers share one packed buffer allocation.
    pub fn shares_buffer_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.offsets, &other.offsets)
    }
}

/// Position cursor over an [`OffsetByteNz`].
#[derive(Clone, Debug)]
pub struct ByteNzIter<'a> {
    bytes: &'a [u8],
    offset: u32,
    index: usize,
}

impl PositionCursor for ByteNzIter<'_> {
    #[inline(always)]
    fn value(&self) -> u32 {
        self.offset
    }

    #[inline(always)]
    fn next(&mut self) -> u32 {
        self.offset += u32::from(self.bytes[self.index]);
        self.index += 1;
        self.offset
    }

    #[inline(always)]
    unsafe fn next_unchecked(&mut self) -> u32 {
        self.offset += u32::from(*self.bytes.get_unchecked(self.index));
        self.index += 1;
        self.offset
    }

    #[inline(always)]
    fn has_next(&self) -> bool {
        self.index < self.bytes.len()
    }

    #[inline]
    fn skip_to(&mut self, target: u32) -> u32 {
        while self.offset < target && self.index < self.bytes.len() {
            // SAFETY: index < len checked by the loop condition.
            unsafe {
                self.next_unchecked();
            }
        }
        self.offset
    }

    #[inline(always)]
    fn data_index(&self) -> usize {
        self.index
    }

    #[inline(always)]
    fn offsets_index(&self) -> usize {
        self.index
    }
}

/// Offset-only cursor over an [`OffsetByteNz`].
#[derive(Clone, Debug)]
pub struct ByteNzOffsetIter<'a> {
    bytes: &'a [u8],
    offset: u32,
    index: usize,
}

impl OffsetCursor for ByteNzOffsetIter<'_> {
    #[inline(always)]
    fn value(&self) -> u32 {
        self.offset
    }

    #[inline(always)]
    fn next(&mut self) -> u32 {
        self.offset += u32::from(self.bytes[self.index]);
        self.index += 1;
        self.offset
    }

    #[inline(always)]
    unsafe fn next_unchecked(&mut self) -> u32 {
        self.offset += u32::from(*self.bytes.get_unchecked(self.index));
        self.index += 1;
        self.offset
    }

    #[inline(always)]
    fn has_next(&self) -> bool {
        self.index < self.bytes.len()
    }
}
