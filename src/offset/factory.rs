//! Variant selection, construction and tag-dispatched reads.

use std::io::Read;

use crate::codec::{self, MAX_NO_ESCAPE_GAP};
use crate::config::EncodingOptions;
use crate::error::{OffsetError, Result};
use crate::offset::{OffsetByte, OffsetByteNz, OffsetChar, OffsetEmpty, OffsetSingle, OffsetTag, Offsets};

/// Picks the encoding for a strictly increasing `offsets` sequence.
///
/// Sequences whose gaps all fit a byte use [`OffsetByteNz`]; otherwise the
/// escaped encoding with the smaller estimated footprint wins, ties going to
/// [`OffsetByte`].
pub fn choose_tag(offsets: &[u32], options: &EncodingOptions) -> OffsetTag {
    match offsets.len() {
        0 => OffsetTag::Empty,
        1 => OffsetTag::Single,
        _ if codec::max_gap(offsets) <= MAX_NO_ESCAPE_GAP => OffsetTag::ByteNz,
        _ if !options.allow_char => OffsetTag::Byte,
        _ => {
            let byte_size = OffsetByte::estimate_in_memory_size(codec::encoded_len_escaped::<u8>(offsets));
            let char_size = OffsetChar::estimate_in_memory_size(codec::encoded_len_escaped::<u16>(offsets));
            if char_size < byte_size {
                OffsetTag::Char
            } else {
                OffsetTag::Byte
            }
        }
    }
}

/// Builds offsets with the default [`EncodingOptions`].
pub fn create(offsets: &[u32]) -> Result<Offsets> {
    create_with(offsets, &EncodingOptions::default())
}

/// Builds offsets from a strictly increasing sequence.
pub fn create_with(offsets: &[u32], options: &EncodingOptions) -> Result<Offsets> {
    codec::check_strictly_increasing(offsets)?;
    let tag = choose_tag(offsets, options);
    let built = build(tag, offsets)?;
    log_debug!(?tag, size = offsets.len(), "selected offset encoding");
    if options.verify {
        built.verify()?;
    }
    Ok(built)
}

/// Builds offsets with a forced encoding.
///
/// Fails with [`OffsetError::GapTooLarge`] when `tag` is
/// [`OffsetTag::ByteNz`] and a gap exceeds 255, and with
/// [`OffsetError::LengthMismatch`] when `Empty` or `Single` get a sequence of
/// another length or a packed encoding gets no offsets.
pub fn create_as(tag: OffsetTag, offsets: &[u32]) -> Result<Offsets> {
    codec::check_strictly_increasing(offsets)?;
    build(tag, offsets)
}

fn build(tag: OffsetTag, offsets: &[u32]) -> Result<Offsets> {
    let expected_len = match tag {
        OffsetTag::Empty => Some(0),
        OffsetTag::Single => Some(1),
        _ if offsets.is_empty() => Some(1),
        _ => None,
    };
    if let Some(expected) = expected_len {
        if offsets.len() != expected {
            return Err(OffsetError::LengthMismatch {
                tag,
                expected,
                got: offsets.len(),
            });
        }
    }

    Ok(match tag {
        OffsetTag::Empty => Offsets::Empty(OffsetEmpty),
        OffsetTag::Single => Offsets::Single(OffsetSingle::new(offsets[0])),
        OffsetTag::ByteNz => {
            let packed = codec::encode_no_escape(offsets)?;
            Offsets::ByteNz(OffsetByteNz::new(packed, offsets[0], offsets[offsets.len() - 1]))
        }
        OffsetTag::Byte => Offsets::Byte(OffsetByte::from_offsets(offsets)),
        OffsetTag::Char => Offsets::Char(OffsetChar::from_offsets(offsets)),
    })
}

/// Reads one tagged record.
pub fn read_from<R: Read>(input: &mut R) -> Result<Offsets> {
    let mut tag = [0u8; 1];
    input.read_exact(&mut tag)?;
    let tag = OffsetTag::try_from(tag[0]).map_err(|e| {
        log_warn!(tag = tag[0], "unknown offset encoding tag");
        e
    })?;

    Ok(match tag {
        OffsetTag::Empty => Offsets::Empty(OffsetEmpty),
        OffsetTag::Single => Offsets::Single(OffsetSingle::read_fields(input)?),
        OffsetTag::ByteNz => Offsets::ByteNz(OffsetByteNz::read_fields(input)?),
        OffsetTag::Byte => Offsets::Byte(OffsetByte::read_fields(input)?),
        OffsetTag::Char => Offsets::Char(OffsetChar::read_fields(input)?),
    })
}

/// Reads one tagged record and verifies it when `options.verify` is set.
pub fn read_from_with<R: Read>(input: &mut R, options: &EncodingOptions) -> Result<Offsets> {
    let offsets = read_from(input)?;
    if options.verify {
        offsets.verify()?;
    }
    Ok(offsets)
}

/// Reads one tagged record from a byte slice.
pub fn from_bytes(mut bytes: &[u8]) -> Result<Offsets> {
    read_from(&mut bytes)
}
