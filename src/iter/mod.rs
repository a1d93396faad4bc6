//! Cursor contracts and the variant-dispatching cursors.
//!
//! Cursors are not [`Iterator`]s: they are always positioned on a valid
//! offset and `next` reports no exhaustion. Callers track the element count
//! themselves, or use the checked `try_next`. [`OffsetsIter`] adapts a cursor
//! to a std iterator for convenience code.

use std::iter::FusedIterator;

use crate::offset::byte_nz::{ByteNzIter, ByteNzOffsetIter};
use crate::offset::escaped::{EscapedIter, EscapedOffsetIter};
use crate::offset::single::SingleIter;
use crate::offset::ResumePoint;

/// Cursor yielding offsets together with their value-array index.
pub trait PositionCursor: Clone {
    /// Current offset.
    fn value(&self) -> u32;

    /// Advances one element and returns the new offset.
    ///
    /// # Panics
    /// Panics if the cursor is already on the last element.
    fn next(&mut self) -> u32;

    /// Advances one element without any bounds checks.
    ///
    /// # Safety
    /// The cursor must not be on the last element.
    unsafe fn next_unchecked(&mut self) -> u32;

    /// True if another element follows the current one.
    fn has_next(&self) -> bool;

    /// Advances if another element follows.
    #[inline]
    fn try_next(&mut self) -> Option<u32> {
        if self.has_next() {
            Some(self.next())
        } else {
            None
        }
    }

    /// Advances while the offset is below `target` and elements remain.
    ///
    /// Returns the resulting offset, which is below `target` only when the
    /// sequence ends before it.
    #[inline]
    fn skip_to(&mut self, target: u32) -> u32 {
        while self.value() < target && self.has_next() {
            self.next();
        }
        self.value()
    }

    /// Index of the current element in the owning column group's values.
    fn data_index(&self) -> usize;

    /// Position in the packed buffer.
    fn offsets_index(&self) -> usize;

    /// True while the current offset is below `last`.
    #[inline(always)]
    fn is_not_over(&self, last: u32) -> bool {
        self.value() < last
    }

    /// The triple this cursor can later be resumed from.
    #[inline]
    fn resume_point(&self) -> ResumePoint {
        ResumePoint {
            data_index: self.data_index(),
            off_index: self.offsets_index(),
            row: self.value(),
        }
    }
}

/// Cursor yielding offsets only.
pub trait OffsetCursor: Clone {
    /// Current offset.
    fn value(&self) -> u32;

    /// Advances one element and returns the new offset.
    ///
    /// # Panics
    /// Panics if the cursor is already on the last element.
    fn next(&mut self) -> u32;

    /// Advances one element without any bounds checks.
    ///
    /// # Safety
    /// The cursor must not be on the last element.
    unsafe fn next_unchecked(&mut self) -> u32;

    /// True if another element follows the current one.
    fn has_next(&self) -> bool;

    /// Advances if another element follows.
    #[inline]
    fn try_next(&mut self) -> Option<u32> {
        if self.has_next() {
            Some(self.next())
        } else {
            None
        }
    }

    /// Same contract as [`PositionCursor::skip_to`].
    #[inline]
    fn skip_to(&mut self, target: u32) -> u32 {
        while self.value() < target && self.has_next() {
            self.next();
        }
        self.value()
    }
}

macro_rules! dispatch {
    ($enum:ident, $self:expr, $it:ident => $body:expr) => {
        match $self {
            $enum::ByteNz($it) => $body,
            $enum::Byte($it) => $body,
            $enum::Char($it) => $body,
            $enum::Single($it) => $body,
        }
    };
}

/// Position cursor over any [`Offsets`](crate::Offsets) variant.
#[derive(Clone, Debug)]
pub enum PositionIter<'a> {
    /// Over [`OffsetByteNz`](crate::OffsetByteNz).
    ByteNz(ByteNzIter<'a>),
    /// Over [`OffsetByte`](crate::OffsetByte).
    Byte(EscapedIter<'a, u8>),
    /// Over [`OffsetChar`](crate::OffsetChar).
    Char(EscapedIter<'a, u16>),
    /// Over [`OffsetSingle`](crate::OffsetSingle).
    Single(SingleIter),
}

impl PositionCursor for PositionIter<'_> {
    #[inline]
    fn value(&self) -> u32 {
        dispatch!(PositionIter, self, it => it.value())
    }

    #[inline]
    fn next(&mut self) -> u32 {
        dispatch!(PositionIter, self, it => it.next())
    }

    #[inline]
    unsafe fn next_unchecked(&mut self) -> u32 {
        dispatch!(PositionIter, self, it => it.next_unchecked())
    }

    #[inline]
    fn has_next(&self) -> bool {
        dispatch!(PositionIter, self, it => it.has_next())
    }

    #[inline]
    fn skip_to(&mut self, target: u32) -> u32 {
        dispatch!(PositionIter, self, it => it.skip_to(target))
    }

    #[inline]
    fn data_index(&self) -> usize {
        dispatch!(PositionIter, self, it => it.data_index())
    }

    #[inline]
    fn offsets_index(&self) -> usize {
        dispatch!(PositionIter, self, it => it.offsets_index())
    }
}

/// Offset-only cursor over any [`Offsets`](crate::Offsets) variant.
#[derive(Clone, Debug)]
pub enum OffsetIter<'a> {
    /// Over [`OffsetByteNz`](crate::OffsetByteNz).
    ByteNz(ByteNzOffsetIter<'a>),
    /// Over [`OffsetByte`](crate::OffsetByte).
    Byte(EscapedOffsetIter<'a, u8>),
    /// Over [`OffsetChar`](crate::OffsetChar).
    Char(EscapedOffsetIter<'a, u16>),
    /// Over [`OffsetSingle`](crate::OffsetSingle).
    Single(SingleIter),
}

impl OffsetCursor for OffsetIter<'_> {
    #[inline]
    fn value(&self) -> u32 {
        dispatch!(OffsetIter, self, it => it.value())
    }

    #[inline]
    fn next(&mut self) -> u32 {
        dispatch!(OffsetIter, self, it => it.next())
    }

    #[inline]
    unsafe fn next_unchecked(&mut self) -> u32 {
        dispatch!(OffsetIter, self, it => it.next_unchecked())
    }

    #[inline]
    fn has_next(&self) -> bool {
        dispatch!(OffsetIter, self, it => it.has_next())
    }
}

/// Std iterator over every offset of a container, first one included.
#[derive(Clone, Debug)]
pub struct OffsetsIter<'a> {
    cursor: Option<OffsetIter<'a>>,
    started: bool,
    remaining: usize,
}

impl<'a> OffsetsIter<'a> {
    pub(crate) fn new(cursor: Option<OffsetIter<'a>>, len: usize) -> Self {
        Self {
            cursor,
            started: false,
            remaining: len,
        }
    }
}

impl Iterator for OffsetsIter<'_> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        let cursor = self.cursor.as_mut()?;
        self.remaining -= 1;
        if self.started {
            Some(OffsetCursor::next(cursor))
        } else {
            self.started = true;
            Some(cursor.value())
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for OffsetsIter<'_> {}

impl FusedIterator for OffsetsIter<'_> {}

/// Rows of one partition `[start, end)`, each paired with its data index.
///
/// Produced by [`Offsets::map_partitions`](crate::Offsets::map_partitions)
/// from a resumed cursor.
#[derive(Clone, Debug)]
pub struct PartitionRows<'a> {
    cursor: Option<PositionIter<'a>>,
    end: u32,
    started: bool,
}

impl<'a> PartitionRows<'a> {
    pub(crate) fn new(cursor: Option<PositionIter<'a>>, end: u32) -> Self {
        Self {
            cursor,
            end,
            started: false,
        }
    }
}

impl Iterator for PartitionRows<'_> {
    type Item = (usize, u32);

    fn next(&mut self) -> Option<(usize, u32)> {
        let cursor = self.cursor.as_mut()?;
        if self.started {
            if cursor.try_next().is_none() {
                self.cursor = None;
                return None;
            }
        } else {
            self.started = true;
        }
        let row = cursor.value();
        if row >= self.end {
            self.cursor = None;
            return None;
        }
        Some((cursor.data_index(), row))
    }
}

impl FusedIterator for PartitionRows<'_> {}
