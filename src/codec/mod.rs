//! Delta codec for sorted row offsets.
//!
//! A sequence `o_0 < o_1 < ... < o_{n-1}` is stored as `o_0` out of band plus
//! one gap `o_i - o_{i-1}` per following element. Two buffer grammars exist:
//!
//! - **no escape**: one byte per gap, every gap must be `<= 255`;
//! - **escaped**: a gap `g` becomes `(g - 1) / step` zero words followed by
//!   the remainder in `1..=step`, where `step` is the word maximum.
//!
//! Gaps are never zero because offsets are strictly increasing, so the zero
//! word is free to act as the escape.

mod word;

pub use word::PackedWord;

use num_traits::{AsPrimitive, Zero};

use crate::error::{OffsetError, Result};

/// Largest gap the no-escape byte encoding holds.
pub const MAX_NO_ESCAPE_GAP: u32 = u8::MAX as u32;

/// Iterator over consecutive differences of `offsets`.
#[inline]
pub fn gaps(offsets: &[u32]) -> impl Iterator<Item = u32> + '_ {
    offsets.windows(2).map(|w| w[1].wrapping_sub(w[0]))
}

/// Largest gap between consecutive offsets, `0` for fewer than two offsets.
#[inline]
pub fn max_gap(offsets: &[u32]) -> u32 {
    gaps(offsets).max().unwrap_or(0)
}

/// Checks that `offsets` is strictly increasing.
pub fn check_strictly_increasing(offsets: &[u32]) -> Result<()> {
    for (i, w) in offsets.windows(2).enumerate() {
        if w[1] <= w[0] {
            return Err(OffsetError::NotStrictlyIncreasing {
                index: i + 1,
                prev: w[0],
                next: w[1],
            });
        }
    }
    Ok(())
}

/// Encodes the gaps of `offsets` one byte each.
///
/// Fails with [`OffsetError::GapTooLarge`] if a gap exceeds 255. The input
/// must already be strictly increasing.
pub fn encode_no_escape(offsets: &[u32]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(offsets.len().saturating_sub(1));
    for (i, gap) in gaps(offsets).enumerate() {
        if gap > MAX_NO_ESCAPE_GAP {
            return Err(OffsetError::GapTooLarge {
                index: i + 1,
                gap,
                max: MAX_NO_ESCAPE_GAP,
            });
        }
        out.push(gap as u8);
    }
    Ok(out)
}

/// Number of words [`encode_escaped`] produces for `offsets`.
pub fn encoded_len_escaped<W: PackedWord>(offsets: &[u32]) -> usize {
    let step = W::step();
    gaps(offsets).map(|g| escapes_for(g, step) as usize + 1).sum()
}

/// Encodes the gaps of `offsets` with zero-word escapes.
///
/// The input must be strictly increasing.
pub fn encode_escaped<W: PackedWord>(offsets: &[u32]) -> Vec<W> {
    let step = W::step();
    let mut out = Vec::with_capacity(encoded_len_escaped::<W>(offsets));
    for gap in gaps(offsets) {
        debug_assert!(gap > 0, "zero gap in offsets");
        let escapes = escapes_for(gap, step);
        out.extend(std::iter::repeat(W::zero()).take(escapes as usize));
        out.push(W::from_gap(gap - escapes * step));
    }
    out
}

/// Decodes a no-escape byte buffer starting at `first`.
pub fn decode_no_escape(first: u32, bytes: &[u8]) -> Vec<u32> {
    let mut out = Vec::with_capacity(bytes.len() + 1);
    let mut cur = first;
    out.push(cur);
    for &b in bytes {
        cur += u32::from(b);
        out.push(cur);
    }
    out
}

/// Decodes an escaped word buffer starting at `first`.
pub fn decode_escaped<W: PackedWord>(first: u32, words: &[W]) -> Vec<u32> {
    let step = W::step();
    let mut out = Vec::with_capacity(words.len() + 1);
    let mut cur = first;
    out.push(cur);
    for &w in words {
        if w.is_zero() {
            cur += step;
        } else {
            cur += w.as_();
            out.push(cur);
        }
    }
    out
}

/// Sums a no-escape buffer from `first` and returns the last offset.
///
/// Unlike the cursors this never overflows: a zero gap or a running offset
/// beyond `u32::MAX` is reported as [`OffsetError::Corrupt`].
pub fn checked_last_no_escape(first: u32, bytes: &[u8]) -> Result<u32> {
    let mut cur = u64::from(first);
    for &b in bytes {
        if b == 0 {
            return Err(OffsetError::corrupt("gap", 0));
        }
        cur = checked_offset(cur + u64::from(b))?;
    }
    Ok(cur as u32)
}

/// Sums an escaped buffer from `first`; returns the last offset and the
/// number of offsets, with the same overflow reporting as
/// [`checked_last_no_escape`].
pub fn checked_last_escaped<W: PackedWord>(first: u32, words: &[W]) -> Result<(u32, usize)> {
    let step = u64::from(W::step());
    let mut cur = u64::from(first);
    let mut count = 1usize;
    for &w in words {
        if w.is_zero() {
            cur = checked_offset(cur + step)?;
        } else {
            cur = checked_offset(cur + u64::from(AsPrimitive::<u32>::as_(w)))?;
            count += 1;
        }
    }
    Ok((cur as u32, count))
}

#[inline]
fn checked_offset(cur: u64) -> Result<u64> {
    if cur > u64::from(u32::MAX) {
        return Err(OffsetError::Corrupt {
            field: "offset",
            value: i64::try_from(cur).unwrap_or(i64::MAX),
        });
    }
    Ok(cur)
}

#[inline]
fn escapes_for(gap: u32, step: u32) -> u32 {
    gap.saturating_sub(1) / step
}
