//! Fixed-layout record header and buffer (de)serialization.
//!
//! ```text
//! | tag u8 | first i32 BE | len i32 BE | last i32 BE | len * WIDTH bytes |
//! ```
//!
//! The tag is written here but read by the dispatcher, so [`read_record`]
//! starts at `first`.

use std::io::{Read, Write};
use std::sync::Arc;

use zerocopy::byteorder::{BigEndian, I32};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

use crate::codec::PackedWord;
use crate::error::{OffsetError, Result};
use crate::offset::OffsetTag;

/// Size of the tag plus header on disk.
pub const RECORD_PREFIX_LEN: u64 = 1 + 4 + 4 + 4;

/// The three header integers following the tag byte.
#[derive(FromZeroes, FromBytes, AsBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C)]
pub struct RecordHeader {
    first: I32<BigEndian>,
    len: I32<BigEndian>,
    last: I32<BigEndian>,
}

impl RecordHeader {
    fn new(first: u32, len: usize, last: u32) -> Result<Self> {
        Ok(Self {
            first: I32::new(to_i32("offset_to_first", u64::from(first))?),
            len: I32::new(to_i32("length", len as u64)?),
            last: I32::new(to_i32("offset_to_last", u64::from(last))?),
        })
    }

    fn decode(&self) -> Result<(u32, usize, u32)> {
        let first = non_negative("offset_to_first", self.first.get())?;
        let len = non_negative("length", self.len.get())?;
        let last = non_negative("offset_to_last", self.last.get())?;
        Ok((first, len as usize, last))
    }
}

fn to_i32(field: &'static str, value: u64) -> Result<i32> {
    i32::try_from(value).map_err(|_| OffsetError::Corrupt {
        field,
        value: i64::try_from(value).unwrap_or(i64::MAX),
    })
}

fn non_negative(field: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        log_warn!(field, value, "rejecting offset record with negative field");
        OffsetError::corrupt(field, value)
    })
}

/// Writes a full record: tag, header, then the packed words.
pub(crate) fn write_record<O: Write, P: PackedWord>(
    out: &mut O,
    tag: OffsetTag,
    first: u32,
    last: u32,
    words: &[P],
) -> Result<()> {
    let header = RecordHeader::new(first, words.len(), last)?;
    out.write_all(&[tag.as_u8()])?;
    out.write_all(header.as_bytes())?;
    P::write_all_be(words, out)?;
    Ok(())
}

/// Reads a header and exactly `len` words. The tag must already be consumed.
pub(crate) fn read_record<R: Read, P: PackedWord>(input: &mut R) -> Result<(u32, Arc<[P]>, u32)> {
    let mut raw = [0u8; 12];
    input.read_exact(&mut raw)?;
    let header = RecordHeader::read_from(&raw[..]).ok_or(OffsetError::corrupt("header", 0))?;
    let (first, len, last) = header.decode()?;

    let byte_len = len * P::WIDTH;
    // Read through `take` so a corrupt length cannot force a huge allocation
    // before the stream runs dry.
    let mut bytes = Vec::new();
    input.by_ref().take(byte_len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != byte_len {
        log_warn!(expected = byte_len, got = bytes.len(), "truncated offset record");
        return Err(OffsetError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("offset buffer truncated: expected {byte_len} bytes, got {}", bytes.len()),
        )));
    }
    Ok((first, P::from_be_bytes_vec(&bytes).into(), last))
}
