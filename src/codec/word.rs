//! Packed word types for the gap buffers.

use std::fmt::Debug;
use std::io::{self, Write};

use num_traits::{AsPrimitive, PrimInt, Unsigned};

/// An unsigned word a gap buffer is made of.
///
/// The word's maximum value doubles as the escape step: a zero word means
/// "advance by `max` and keep reading".
pub trait PackedWord: PrimInt + Unsigned + AsPrimitive<u32> + Debug + Send + Sync + 'static {
    /// Width in bytes of one word on disk.
    const WIDTH: usize;

    /// Escape step and largest gap a single word holds.
    #[inline]
    fn step() -> u32 {
        Self::max_value().as_()
    }

    /// Narrows a gap known to be in `1..=step()`.
    fn from_gap(gap: u32) -> Self;

    /// Writes `words` big-endian.
    fn write_all_be<W: Write>(words: &[Self], out: &mut W) -> io::Result<()>;

    /// Decodes a big-endian byte buffer whose length is a multiple of `WIDTH`.
    fn from_be_bytes_vec(bytes: &[u8]) -> Vec<Self>;
}

impl PackedWord for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn from_gap(gap: u32) -> Self {
        debug_assert!(gap <= u32::from(u8::MAX));
        gap as u8
    }

    fn write_all_be<W: Write>(words: &[Self], out: &mut W) -> io::Result<()> {
        out.write_all(words)
    }

    fn from_be_bytes_vec(bytes: &[u8]) -> Vec<Self> {
        bytes.to_vec()
    }
}

impl PackedWord for u16 {
    const WIDTH: usize = 2;

    #[inline]
    fn from_gap(gap: u32) -> Self {
        debug_assert!(gap <= u32::from(u16::MAX));
        gap as u16
    }

    fn write_all_be<W: Write>(words: &[Self], out: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(words.len() * Self::WIDTH);
        for w in words {
            buf.extend_from_slice(&w.to_be_bytes());
        }
        out.write_all(&buf)
    }

    fn from_be_bytes_vec(bytes: &[u8]) -> Vec<Self> {
        bytes
            .chunks_exact(Self::WIDTH)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect()
    }
}
