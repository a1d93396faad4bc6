//! Allocation-free memory accounting.
//!
//! Sizes follow the managed-heap object model of the column-group engine that
//! owns these containers: 16 byte object headers, 8 byte references and
//! arrays padded to 8 bytes after their first 4 payload bytes.

/// Bytes charged for a plain object header.
pub const OBJECT_HEADER: u64 = 16;

/// Bytes charged for a reference field.
pub const REFERENCE: u64 = 8;

/// Bytes charged for an `i32` field.
pub const INT: u64 = 4;

const ARRAY_HEADER: u64 = 20;

/// Estimated resident size of an array of `len` elements of `width` bytes,
/// including the reference that points at it.
#[inline]
pub const fn array_cost(len: usize, width: usize) -> u64 {
    let payload = (len as u64) * (width as u64);
    let mut size = REFERENCE + ARRAY_HEADER;
    if payload <= 4 {
        size += 4;
    } else {
        size += payload;
        let rem = (payload - 4) % 8;
        if rem > 0 {
            size += 8 - rem;
        }
    }
    size
}

/// Estimated resident size of a byte array of length `len`.
#[inline]
pub const fn byte_array_cost(len: usize) -> u64 {
    array_cost(len, 1)
}

/// Estimated resident size of a `u16` array of length `len`.
#[inline]
pub const fn char_array_cost(len: usize) -> u64 {
    array_cost(len, 2)
}
