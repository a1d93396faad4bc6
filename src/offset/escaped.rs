//! Gap-packed offsets with zero-word escapes.
//!
//! A zero word advances the cursor by the word maximum without producing an
//! element, so the buffer position (`offsets_index`) runs ahead of the element
//! count (`data_index`) once an escape has been consumed.

use std::io::{Read, Write};
use std::sync::Arc;

use num_traits::{AsPrimitive, Zero};

use crate::codec::PackedWord;
use crate::error::Result;
use crate::iter::{OffsetCursor, PositionCursor};
use crate::memory;
use crate::offset::record::{self, RECORD_PREFIX_LEN};
use crate::offset::{OffsetSliceInfo, OffsetTag, Offsets};

/// Byte gaps, zero byte escapes `+255`.
pub type OffsetByte = OffsetEscaped<u8>;

/// `u16` gaps, zero word escapes `+65535`.
pub type OffsetChar = OffsetEscaped<u16>;

/// A word type that backs an escaped encoding.
pub trait EscapedWord: PackedWord {
    /// Tag written in front of records of this encoding.
    const TAG: OffsetTag;

    /// Estimated resident size of an array of `len` words.
    fn array_cost(len: usize) -> u64;

    /// Lifts a container into the [`Offsets`] sum type.
    fn wrap(offsets: OffsetEscaped<Self>) -> Offsets;
}

impl EscapedWord for u8 {
    const TAG: OffsetTag = OffsetTag::Byte;

    fn array_cost(len: usize) -> u64 {
        memory::byte_array_cost(len)
    }

    fn wrap(offsets: OffsetEscaped<Self>) -> Offsets {
        Offsets::Byte(offsets)
    }
}

impl EscapedWord for u16 {
    const TAG: OffsetTag = OffsetTag::Char;

    fn array_cost(len: usize) -> u64 {
        memory::char_array_cost(len)
    }

    fn wrap(offsets: OffsetEscaped<Self>) -> Offsets {
        Offsets::Char(offsets)
    }
}

/// Offsets stored as escaped gap words of type `W`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffsetEscaped<W: EscapedWord> {
    offsets: Arc<[W]>,
    offset_to_first: u32,
    offset_to_last: u32,
    size: usize,
}

impl<W: EscapedWord> OffsetEscaped<W> {
    /// Wraps an escaped gap buffer and its cached bounds.
    ///
    /// The buffer must follow the escape grammar of [`crate::codec`] and must
    /// not end in an escape word.
    pub fn new(offsets: impl Into<Arc<[W]>>, offset_to_first: u32, offset_to_last: u32) -> Self {
        let offsets = offsets.into();
        let size = offsets.iter().filter(|w| !w.is_zero()).count() + 1;
        Self {
            offsets,
            offset_to_first,
            offset_to_last,
            size,
        }
    }

    /// Encodes strictly increasing, non-empty `offsets`.
    ///
    /// # Panics
    /// Panics if `offsets` is empty.
    pub fn from_offsets(offsets: &[u32]) -> Self {
        let words = crate::codec::encode_escaped::<W>(offsets);
        Self {
            offsets: words.into(),
            offset_to_first: offsets[0],
            offset_to_last: offsets[offsets.len() - 1],
            size: offsets.len(),
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

    /// The packed gap words, escapes included.
    #[inline]
    pub fn packed(&self) -> &[W] {
        &self.offsets
    }

    /// Number of offsets.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Estimated resident size of this container.
    pub fn in_memory_size(&self) -> u64 {
        Self::estimate_in_memory_size(self.offsets.len())
    }

    /// Estimated resident size of a container with `n_words` packed words.
    pub fn estimate_in_memory_size(n_words: usize) -> u64 {
        // header, two bounds, size, buffer reference
        memory::OBJECT_HEADER + 3 * memory::INT + memory::REFERENCE + W::array_cost(n_words)
    }

    /// Exact length of the serialized record.
    pub fn exact_size_on_disk(&self) -> u64 {
        RECORD_PREFIX_LEN + (self.offsets.len() * W::WIDTH) as u64
    }

    /// Position cursor at the first offset.
    #[inline]
    pub fn iter(&self) -> EscapedIter<'_, W> {
        self.iter_from(0, 0, self.offset_to_first)
    }

    /// Position cursor resumed at a known `(data_index, off_index, offset)`.
    #[inline]
    pub fn iter_from(&self, data_index: usize, off_index: usize, offset: u32) -> EscapedIter<'_, W> {
        debug_assert!(off_index <= self.offsets.len());
        EscapedIter {
            reader: GapReader {
                words: &self.offsets,
                offset,
                index: off_index,
            },
            data_index,
        }
    }

    /// Offset-only cursor at the first offset.
    #[inline]
    pub fn offset_iter(&self) -> EscapedOffsetIter<'_, W> {
        EscapedOffsetIter {
            reader: GapReader {
                words: &self.offsets,
                offset: self.offset_to_first,
                index: 0,
            },
        }
    }

    /// Serializes the record.
    pub fn write_to<O: Write>(&self, out: &mut O) -> Result<()> {
        record::write_record(out, W::TAG, self.offset_to_first, self.offset_to_last, &self.offsets[..])
    }

    /// Reads the record body after its tag byte.
    pub fn read_fields<R: Read>(input: &mut R) -> Result<Self> {
        let (first, offsets, last) = record::read_record::<R, W>(input)?;
        Ok(Self::new(offsets, first, last))
    }

    /// Cuts `packed[low_off..high_off]` into a new container covering the
    /// logical range `[low, high + 1)`.
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
        let words: Arc<[W]> = self.offsets[low_off..high_off].into();
        let sliced = Self {
            offsets: words,
            offset_to_first: low_value,
            offset_to_last: high_value,
            size: high - low + 1,
        };
        OffsetSliceInfo::new(low, high + 1, W::wrap(sliced))
    }

    /// Shifts both bounds down by `delta`, sharing the packed buffer.
    #[must_use]
    pub fn move_index(&self, delta: u32) -> Self {
        Self {
            offsets: Arc::clone(&self.offsets),
            offset_to_first: self.offset_to_first - delta,
            offset_to_last: self.offset_to_last - delta,
            size: self.size,
        }
    }
}

/// Decoding state shared by both escaped cursors.
#[derive(Clone, Debug)]
struct GapReader<'a, W> {
    words: &'a [W],
    offset: u32,
    index: usize,
}

impl<'a, W: PackedWord> GapReader<'a, W> {
    /// Consumes any escape words and the gap word that follows, fetching
    /// words through `word`.
    #[inline(always)]
    fn advance(&mut self, word: impl Fn(&'a [W], usize) -> W) -> u32 {
        let mut w = word(self.words, self.index);
        while w.is_zero() {
            self.offset += W::step();
            self.index += 1;
            w = word(self.words, self.index);
        }
        self.offset += AsPrimitive::<u32>::as_(w);
        self.index += 1;
        self.offset
    }

    #[inline(always)]
    fn next(&mut self) -> u32 {
        self.advance(|words, i| words[i])
    }

    /// # Safety
    /// A gap word must follow `index` in the buffer.
    #[inline(always)]
    unsafe fn next_unchecked(&mut self) -> u32 {
        // SAFETY: the caller guarantees every index read here is in bounds.
        self.advance(|words, i| unsafe { *words.get_unchecked(i) })
    }

    #[inline(always)]
    fn has_next(&self) -> bool {
        self.index < self.words.len()
    }
}

/// Position cursor over an escaped buffer.
#[derive(Clone, Debug)]
pub struct EscapedIter<'a, W> {
    reader: GapReader<'a, W>,
    data_index: usize,
}

impl<W: PackedWord> PositionCursor for EscapedIter<'_, W> {
    #[inline(always)]
    fn value(&self) -> u32 {
        self.reader.offset
    }

    #[inline]
    fn next(&mut self) -> u32 {
        self.data_index += 1;
        self.reader.next()
    }

    #[inline]
    unsafe fn next_unchecked(&mut self) -> u32 {
        self.data_index += 1;
        self.reader.next_unchecked()
    }

    #[inline(always)]
    fn has_next(&self) -> bool {
        self.reader.has_next()
    }

    #[inline(always)]
    fn data_index(&self) -> usize {
        self.data_index
    }

    #[inline(always)]
    fn offsets_index(&self) -> usize {
        self.reader.index
    }
}

/// Offset-only cursor over an escaped buffer.
#[derive(Clone, Debug)]
pub struct EscapedOffsetIter<'a, W> {
    reader: GapReader<'a, W>,
}

impl<W: PackedWord> OffsetCursor for EscapedOffsetIter<'_, W> {
    #[inline(always)]
    fn value(&self) -> u32 {
        self.reader.offset
    }

    #[inline]
    fn next(&mut self) -> u32 {
        self.reader.next()
    }

    #[inline]
    unsafe fn next_unchecked(&mut self) -> u32 {
        self.reader.next_unchecked()
    }

    #[inline(always)]
    fn has_next(&self) -> bool {
        self.reader.has_next()
    }
}
