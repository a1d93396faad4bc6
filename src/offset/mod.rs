//! Offset containers and the [`Offsets`] sum type.
//!
//! Each variant owns an immutable packed buffer behind an [`Arc`](std::sync::Arc),
//! so containers are `Send + Sync` and any number of cursors may scan one
//! container concurrently. [`Offsets`] adds the operations that only need the
//! cursor contract: search-then-slice, resume points, partitioned scans,
//! concatenation and verification.

pub mod byte_nz;
pub mod escaped;
pub mod factory;
pub(crate) mod record;
pub mod single;
mod tag;

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

pub use byte_nz::OffsetByteNz;
pub use escaped::{OffsetByte, OffsetChar, OffsetEscaped};
pub use single::{OffsetEmpty, OffsetSingle};
pub use tag::OffsetTag;

use crate::codec;
use crate::config::EncodingOptions;
use crate::error::{OffsetError, Result};
use crate::iter::{OffsetIter, OffsetsIter, PartitionRows, PositionCursor, PositionIter};
use single::SingleIter;

/// A cursor position that can be resumed without rescanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResumePoint {
    /// Index into the owning column group's value array.
    pub data_index: usize,
    /// Position in the packed buffer.
    pub off_index: usize,
    /// Offset at that position.
    pub row: u32,
}

/// A sliced container together with the logical element range it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffsetSliceInfo {
    /// First element index covered (inclusive).
    pub l_index: usize,
    /// Element index one past the last covered.
    pub u_index: usize,
    /// The sliced offsets.
    pub offsets: Offsets,
}

impl OffsetSliceInfo {
    /// Slice covering `[l_index, u_index)`.
    pub fn new(l_index: usize, u_index: usize, offsets: Offsets) -> Self {
        Self {
            l_index,
            u_index,
            offsets,
        }
    }

    /// Empty slice positioned at element index `at`.
    pub fn empty(at: usize) -> Self {
        Self::new(at, at, Offsets::Empty(OffsetEmpty))
    }

    /// Number of elements covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.u_index - self.l_index
    }

    /// True if no element is covered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.u_index == self.l_index
    }
}

/// Serializable summary of a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetStats {
    /// Encoding in use.
    pub tag: OffsetTag,
    /// Number of offsets.
    pub size: usize,
    /// First offset, if any.
    pub first: Option<u32>,
    /// Last offset, if any.
    pub last: Option<u32>,
    /// Largest gap between consecutive offsets.
    pub max_gap: u32,
    /// Exact serialized length.
    pub bytes_on_disk: u64,
    /// Estimated resident size.
    pub bytes_in_memory: u64,
}

/// Any offset encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Offsets {
    /// No offsets.
    Empty(OffsetEmpty),
    /// One offset.
    Single(OffsetSingle),
    /// Unescaped byte gaps.
    ByteNz(OffsetByteNz),
    /// Escaped byte gaps.
    Byte(OffsetByte),
    /// Escaped `u16` gaps.
    Char(OffsetChar),
}

impl Offsets {
    /// Encoding tag.
    pub fn tag(&self) -> OffsetTag {
        match self {
            Self::Empty(_) => OffsetTag::Empty,
            Self::Single(_) => OffsetTag::Single,
            Self::ByteNz(_) => OffsetTag::ByteNz,
            Self::Byte(_) => OffsetTag::Byte,
            Self::Char(_) => OffsetTag::Char,
        }
    }

    /// Number of offsets.
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            Self::Empty(_) => 0,
            Self::Single(_) => 1,
            Self::ByteNz(o) => o.size(),
            Self::Byte(o) => o.size(),
            Self::Char(o) => o.size(),
        }
    }

    /// True if there are no offsets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    /// First offset.
    #[inline]
    pub fn offset_to_first(&self) -> Option<u32> {
        match self {
            Self::Empty(_) => None,
            Self::Single(o) => Some(o.offset()),
            Self::ByteNz(o) => Some(o.offset_to_first()),
            Self::Byte(o) => Some(o.offset_to_first()),
            Self::Char(o) => Some(o.offset_to_first()),
        }
    }

    /// Last offset.
    #[inline]
    pub fn offset_to_last(&self) -> Option<u32> {
        match self {
            Self::Empty(_) => None,
            Self::Single(o) => Some(o.offset()),
            Self::ByteNz(o) => Some(o.offset_to_last()),
            Self::Byte(o) => Some(o.offset_to_last()),
            Self::Char(o) => Some(o.offset_to_last()),
        }
    }

    /// Estimated resident size.
    pub fn in_memory_size(&self) -> u64 {
        match self {
            Self::Empty(o) => o.in_memory_size(),
            Self::Single(o) => o.in_memory_size(),
            Self::ByteNz(o) => o.in_memory_size(),
            Self::Byte(o) => o.in_memory_size(),
            Self::Char(o) => o.in_memory_size(),
        }
    }

    /// Exact serialized length.
    pub fn exact_size_on_disk(&self) -> u64 {
        match self {
            Self::Empty(o) => o.exact_size_on_disk(),
            Self::Single(o) => o.exact_size_on_disk(),
            Self::ByteNz(o) => o.exact_size_on_disk(),
            Self::Byte(o) => o.exact_size_on_disk(),
            Self::Char(o) => o.exact_size_on_disk(),
        }
    }

    /// Serializes the tagged record.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            Self::Empty(o) => o.write_to(out),
            Self::Single(o) => o.write_to(out),
            Self::ByteNz(o) => o.write_to(out),
            Self::Byte(o) => o.write_to(out),
            Self::Char(o) => o.write_to(out),
        }
    }

    /// Serializes into a fresh, exactly sized buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(usize::try_from(self.exact_size_on_disk()).unwrap_or(0));
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Reads a tagged record, dispatching on the tag byte.
    pub fn read_from<R: Read>(input: &mut R) -> Result<Self> {
        factory::read_from(input)
    }

    /// Rebases every offset by `-delta`. Packed buffers are shared.
    ///
    /// # Panics
    /// Panics in debug builds if `delta` exceeds the first offset.
    #[must_use]
    pub fn move_index(&self, delta: u32) -> Self {
        match self {
            Self::Empty(o) => Self::Empty(*o),
            Self::Single(o) => Self::Single(o.move_index(delta)),
            Self::ByteNz(o) => Self::ByteNz(o.move_index(delta)),
            Self::Byte(o) => Self::Byte(o.move_index(delta)),
            Self::Char(o) => Self::Char(o.move_index(delta)),
        }
    }

    /// Position cursor at the first offset, `None` when empty.
    #[inline]
    pub fn iterator(&self) -> Option<PositionIter<'_>> {
        Some(match self {
            Self::Empty(_) => return None,
            Self::Single(o) => PositionIter::Single(o.iter()),
            Self::ByteNz(o) => PositionIter::ByteNz(o.iter()),
            Self::Byte(o) => PositionIter::Byte(o.iter()),
            Self::Char(o) => PositionIter::Char(o.iter()),
        })
    }

    /// Offset-only cursor at the first offset, `None` when empty.
    #[inline]
    pub fn offset_iterator(&self) -> Option<OffsetIter<'_>> {
        Some(match self {
            Self::Empty(_) => return None,
            Self::Single(o) => OffsetIter::Single(o.iter()),
            Self::ByteNz(o) => OffsetIter::ByteNz(o.offset_iter()),
            Self::Byte(o) => OffsetIter::Byte(o.offset_iter()),
            Self::Char(o) => OffsetIter::Char(o.offset_iter()),
        })
    }

    /// Position cursor resumed from a point recorded by an earlier scan of
    /// this same container.
    #[inline]
    pub fn iterator_from(&self, at: ResumePoint) -> Option<PositionIter<'_>> {
        Some(match self {
            Self::Empty(_) => return None,
            Self::Single(_) => PositionIter::Single(SingleIter::at(at.row)),
            Self::ByteNz(o) => PositionIter::ByteNz(o.iter_from(at.off_index, at.row)),
            Self::Byte(o) => PositionIter::Byte(o.iter_from(at.data_index, at.off_index, at.row)),
            Self::Char(o) => PositionIter::Char(o.iter_from(at.data_index, at.off_index, at.row)),
        })
    }

    /// Position cursor on the first offset `>= row`, `None` if there is none.
    pub fn iterator_at(&self, row: u32) -> Option<PositionIter<'_>> {
        let mut it = self.iterator()?;
        (it.skip_to(row) >= row).then_some(it)
    }

    /// Std iterator over all offsets.
    #[inline]
    pub fn iter(&self) -> OffsetsIter<'_> {
        OffsetsIter::new(self.offset_iterator(), self.size())
    }

    /// Materializes all offsets.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Resume points for the first offset `>= b` of each boundary `b`, in one
    /// linear scan. Boundaries must be non-decreasing.
    pub fn resume_points(&self, boundaries: &[u32]) -> Vec<Option<ResumePoint>> {
        debug_assert!(boundaries.windows(2).all(|w| w[0] <= w[1]), "boundaries must be sorted");
        let Some(mut it) = self.iterator() else {
            return vec![None; boundaries.len()];
        };
        boundaries
            .iter()
            .map(|&b| (it.skip_to(b) >= b).then(|| it.resume_point()))
            .collect()
    }

    /// Applies `f` to the rows of each partition `[boundaries[i], boundaries[i + 1])`.
    pub fn map_partitions<T, F>(&self, boundaries: &[u32], f: F) -> Vec<T>
    where
        F: Fn(usize, PartitionRows<'_>) -> T,
    {
        if boundaries.len() < 2 {
            return Vec::new();
        }
        let starts = self.resume_points(&boundaries[..boundaries.len() - 1]);
        starts
            .into_iter()
            .enumerate()
            .map(|(i, start)| {
                let cursor = start.and_then(|rp| self.iterator_from(rp));
                f(i, PartitionRows::new(cursor, boundaries[i + 1]))
            })
            .collect()
    }

    /// Parallel [`map_partitions`](Self::map_partitions); every partition
    /// drives its own resumed cursor.
    #[cfg(feature = "parallel")]
    pub fn par_map_partitions<T, F>(&self, boundaries: &[u32], f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize, PartitionRows<'_>) -> T + Sync + Send,
    {
        use rayon::prelude::*;

        if boundaries.len() < 2 {
            return Vec::new();
        }
        let starts = self.resume_points(&boundaries[..boundaries.len() - 1]);
        starts
            .into_par_iter()
            .enumerate()
            .map(|(i, start)| {
                let cursor = start.and_then(|rp| self.iterator_from(rp));
                f(i, PartitionRows::new(cursor, boundaries[i + 1]))
            })
            .collect()
    }

    /// Slices the offsets falling in the row window `[l, u)`.
    ///
    /// The result is rebased to the window (`offset - l`) and reports the
    /// element range it covers in this container.
    pub fn slice_rows(&self, l: u32, u: u32) -> OffsetSliceInfo {
        if l >= u {
            return OffsetSliceInfo::empty(0);
        }
        let info = match self {
            Self::Empty(_) => OffsetSliceInfo::empty(0),
            Self::Single(o) => {
                let v = o.offset();
                if v < l {
                    OffsetSliceInfo::empty(1)
                } else if v >= u {
                    OffsetSliceInfo::empty(0)
                } else {
                    OffsetSliceInfo::new(0, 1, Self::Single(OffsetSingle::new(v - l)))
                }
            }
            Self::ByteNz(o) => self.slice_or_move(o.offset_to_first(), o.offset_to_last(), l, u, || {
                slice_scan(o.iter(), o.size(), l, u, |lo, hi, lv, hv, low, high| o.slice(lo, hi, lv, hv, low, high))
            }),
            Self::Byte(o) => self.slice_or_move(o.offset_to_first(), o.offset_to_last(), l, u, || {
                slice_scan(o.iter(), o.size(), l, u, |lo, hi, lv, hv, low, high| o.slice(lo, hi, lv, hv, low, high))
            }),
            Self::Char(o) => self.slice_or_move(o.offset_to_first(), o.offset_to_last(), l, u, || {
                slice_scan(o.iter(), o.size(), l, u, |lo, hi, lv, hv, low, high| o.slice(lo, hi, lv, hv, low, high))
            }),
        };
        log_debug!(l, u, from = info.l_index, to = info.u_index, "sliced offsets");
        info
    }

    fn slice_or_move(
        &self,
        first: u32,
        last: u32,
        l: u32,
        u: u32,
        scan: impl FnOnce() -> OffsetSliceInfo,
    ) -> OffsetSliceInfo {
        if l <= first && last < u {
            // Whole container inside the window: rebase, keep the buffer.
            OffsetSliceInfo::new(0, self.size(), self.move_index(l))
        } else {
            scan()
        }
    }

    /// Concatenates `other`, shifted up by `shift`, after these offsets.
    pub fn append(&self, other: &Offsets, shift: u32) -> Result<Offsets> {
        self.append_with(other, shift, &EncodingOptions::default())
    }

    /// [`append`](Self::append) with explicit encoding options.
    pub fn append_with(&self, other: &Offsets, shift: u32, options: &EncodingOptions) -> Result<Offsets> {
        if let (Some(last), Some(first)) = (self.offset_to_last(), other.offset_to_first()) {
            let next_first = u64::from(first) + u64::from(shift);
            if next_first <= u64::from(last) {
                return Err(OffsetError::InvalidAppend { last, next_first });
            }
        }
        let mut rows = Vec::with_capacity(self.size() + other.size());
        rows.extend(self.iter());
        for o in other.iter() {
            let shifted = o.checked_add(shift).ok_or(OffsetError::Corrupt {
                field: "appended offset",
                value: i64::from(o) + i64::from(shift),
            })?;
            rows.push(shifted);
        }
        factory::create_with(&rows, options)
    }

    /// Largest gap between consecutive offsets.
    pub fn max_gap(&self) -> u32 {
        let mut it = self.iter();
        let Some(mut prev) = it.next() else {
            return 0;
        };
        let mut max = 0;
        for cur in it {
            max = max.max(cur - prev);
            prev = cur;
        }
        max
    }

    /// Summary of this container.
    pub fn stats(&self) -> OffsetStats {
        OffsetStats {
            tag: self.tag(),
            size: self.size(),
            first: self.offset_to_first(),
            last: self.offset_to_last(),
            max_gap: self.max_gap(),
            bytes_on_disk: self.exact_size_on_disk(),
            bytes_in_memory: self.in_memory_size(),
        }
    }

    /// Re-scans the buffer and checks it against the cached bounds.
    ///
    /// The scan is overflow-checked, so a corrupt record is reported rather
    /// than decoded.
    pub fn verify(&self) -> Result<()> {
        let trailing_escape = match self {
            Self::Byte(o) => o.packed().last() == Some(&0),
            Self::Char(o) => o.packed().last() == Some(&0),
            _ => false,
        };
        if trailing_escape {
            return Err(OffsetError::corrupt("trailing escape", 0));
        }

        let (prev, count) = match self {
            Self::Empty(_) => return Ok(()),
            Self::Single(o) => (o.offset(), 1),
            Self::ByteNz(o) => (codec::checked_last_no_escape(o.offset_to_first(), o.packed())?, o.size()),
            Self::Byte(o) => codec::checked_last_escaped(o.offset_to_first(), o.packed())?,
            Self::Char(o) => codec::checked_last_escaped(o.offset_to_first(), o.packed())?,
        };
        if Some(prev) != self.offset_to_last() {
            return Err(OffsetError::corrupt("offset_to_last", prev));
        }
        if count != self.size() {
            return Err(OffsetError::Corrupt {
                field: "size",
                value: i64::try_from(count).unwrap_or(i64::MAX),
            });
        }
        Ok(())
    }
}

/// Locates the elements inside `[l, u)` with `it` and hands the bounds to `cut`.
fn slice_scan<C, F>(mut it: C, size: usize, l: u32, u: u32, cut: F) -> OffsetSliceInfo
where
    C: PositionCursor,
    F: FnOnce(usize, usize, u32, u32, usize, usize) -> OffsetSliceInfo,
{
    let low_value = it.skip_to(l);
    if low_value < l {
        return OffsetSliceInfo::empty(size);
    }
    if low_value >= u {
        return OffsetSliceInfo::empty(it.data_index());
    }

    let mut high = it.clone();
    loop {
        let mut probe = high.clone();
        match probe.try_next() {
            Some(v) if v < u => high = probe,
            _ => break,
        }
    }

    cut(
        it.offsets_index(),
        high.offsets_index(),
        low_value - l,
        high.value() - l,
        it.data_index(),
        high.data_index(),
    )
}

impl From<OffsetByteNz> for Offsets {
    fn from(o: OffsetByteNz) -> Self {
        Self::ByteNz(o)
    }
}

impl From<OffsetSingle> for Offsets {
    fn from(o: OffsetSingle) -> Self {
        Self::Single(o)
    }
}

impl<'a> IntoIterator for &'a Offsets {
    type Item = u32;
    type IntoIter = OffsetsIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests;
