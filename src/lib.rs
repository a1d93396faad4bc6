//! # `colgroup-offsets` - Row-Offset Encodings for Compressed Column Groups
//!
//! A compressed column group keeps the rows that hold a non-default value as a
//! strictly increasing sequence of row offsets. This crate stores that sequence
//! in compact gap-encoded buffers and provides cursors that scan, skip, resume
//! and slice it without ever materializing the full `u32` array.
//!
//! ## Encodings
//!
//! | Variant | Buffer | Gap range |
//! |---|---|---|
//! | [`OffsetByteNz`] | one byte per gap | `1..=255` only |
//! | [`OffsetByte`] | bytes, zero byte escapes `+255` | unbounded |
//! | [`OffsetChar`] | `u16` words, zero word escapes `+65535` | unbounded |
//! | [`OffsetSingle`] | none | single offset |
//! | [`OffsetEmpty`] | none | no offsets |
//!
//! [`Offsets`] is the closed sum over all variants. The leading tag byte of a
//! serialized record selects the variant on read ([`factory::read_from`]).
//!
//! ## Cursors
//!
//! - [`PositionIter`] yields offsets together with the index into the parallel
//!   value array of the owning column group.
//! - [`OffsetIter`] yields offsets only.
//!
//! Both borrow the container's immutable buffer; cloning a cursor forks an
//! independent scan over the same buffer.
//!
//! ## Example
//!
//! ```rust
//! use colgroup_offsets::{factory, PositionCursor};
//!
//! let offsets = factory::create(&[10, 15, 200, 255]).unwrap();
//! let mut it = offsets.iterator().unwrap();
//!
//! assert_eq!(it.value(), 10);
//! assert_eq!(it.skip_to(100), 200);
//! assert_eq!(it.data_index(), 2);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

/// Emits a `tracing` debug event when the `tracing` feature is enabled.
macro_rules! log_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::debug!($($arg)*);
        }
    };
}

/// Emits a `tracing` warn event when the `tracing` feature is enabled.
macro_rules! log_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::warn!($($arg)*);
        }
    };
}

pub mod codec;
pub mod config;
pub mod error;
pub mod iter;
pub mod memory;
pub mod offset;

pub use config::EncodingOptions;
pub use error::{OffsetError, Result};
pub use iter::{OffsetCursor, OffsetIter, OffsetsIter, PartitionRows, PositionCursor, PositionIter};
pub use offset::{
    factory, OffsetByte, OffsetByteNz, OffsetChar, OffsetEmpty, OffsetSingle, OffsetSliceInfo, OffsetStats,
    OffsetTag, Offsets, ResumePoint,
};

// Layout checks for the types that sit on hot scan paths.
const _: () = {
    use core::mem;

    assert!(mem::size_of::<offset::record::RecordHeader>() == 12);
    assert!(mem::align_of::<offset::record::RecordHeader>() == 1);

    // Cursors should stay a handful of words so cloning them is free.
    assert!(mem::size_of::<offset::byte_nz::ByteNzIter<'static>>() <= mem::size_of::<usize>() * 4);
    assert!(mem::size_of::<OffsetEmpty>() == 0);
};
