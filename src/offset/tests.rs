//! Tests for offset containers.

use super::*;
use crate::iter::{OffsetCursor, PositionCursor};

fn sample() -> OffsetByteNz {
    // offsets [10, 15, 200, 255]
    OffsetByteNz::new(vec![5u8, 185, 55], 10, 255)
}

#[test]
fn byte_nz_sizes() {
    let off = sample();
    assert_eq!(off.size(), 4);
    assert_eq!(off.exact_size_on_disk(), 13 + 3);
    assert_eq!(off.in_memory_size(), OffsetByteNz::estimate_in_memory_size(3));
    assert_eq!(OffsetByteNz::estimate_in_memory_size(0), 32 + 32);
}

#[test]
fn byte_nz_memory_estimate_is_monotonic() {
    for n in 0..1024 {
        assert!(OffsetByteNz::estimate_in_memory_size(n) <= OffsetByteNz::estimate_in_memory_size(n + 1));
    }
}

#[test]
fn byte_nz_record_layout() {
    let bytes = Offsets::ByteNz(sample()).to_bytes().unwrap();
    assert_eq!(
        bytes,
        vec![
            OffsetTag::ByteNz.as_u8(),
            0, 0, 0, 10, // first
            0, 0, 0, 3, // length
            0, 0, 0, 255, // last
            5, 185, 55,
        ]
    );
    assert_eq!(bytes.len() as u64, sample().exact_size_on_disk());
}

#[test]
fn byte_nz_round_trip() {
    let original = Offsets::ByteNz(sample());
    let bytes = original.to_bytes().unwrap();
    let read = factory::from_bytes(&bytes).unwrap();
    assert_eq!(read, original);
}

#[test]
fn byte_nz_iteration_visits_every_offset() {
    let off = sample();
    let mut it = off.iter();
    let mut seen = vec![it.value()];
    for _ in 0..off.size() - 1 {
        seen.push(it.next());
    }
    assert_eq!(seen, vec![10, 15, 200, 255]);
    assert_eq!(it.value(), off.offset_to_last());
    assert!(!it.has_next());
    assert_eq!(it.try_next(), None);
}

#[test]
#[should_panic(expected = "index out of bounds")]
fn byte_nz_next_past_end_panics() {
    let off = sample();
    let mut it = off.iter();
    for _ in 0..off.size() {
        it.next();
    }
}

#[test]
fn byte_nz_skip_to() {
    let off = sample();
    let mut it = off.iter();
    assert_eq!(it.skip_to(0), 10);
    assert_eq!(it.skip_to(11), 15);
    assert_eq!(it.skip_to(15), 15);
    assert_eq!(it.skip_to(16), 200);
    assert_eq!(it.data_index(), 2);
    assert_eq!(it.offsets_index(), 2);
    // past the last offset the cursor parks on it
    assert_eq!(it.skip_to(1000), 255);
    assert_eq!(it.data_index(), 3);
}

#[test]
fn byte_nz_clone_is_independent() {
    let off = sample();
    let mut a = off.iter();
    a.next();
    let b = a.clone();
    a.next();
    assert_eq!(b.value(), 15);
    assert_eq!(b.data_index(), 1);
    assert_eq!(a.value(), 200);
}

#[test]
fn byte_nz_offset_iterator() {
    let off = sample();
    let mut it = off.offset_iter();
    assert_eq!(it.value(), 10);
    assert_eq!(it.next(), 15);
    assert_eq!(it.skip_to(201), 255);
    assert_eq!(it.try_next(), None);
}

#[test]
fn byte_nz_slice_middle() {
    let off = sample();
    let info = off.slice(1, 2, 15, 200, 1, 2);
    assert_eq!(info.l_index, 1);
    assert_eq!(info.u_index, 3);
    match &info.offsets {
        Offsets::ByteNz(s) => {
            assert_eq!(s.packed(), &[185]);
            assert_eq!(s.offset_to_first(), 15);
            assert_eq!(s.offset_to_last(), 200);
            assert!(!s.shares_buffer_with(&off));
        }
        other => panic!("unexpected variant {other:?}"),
    }
    assert_eq!(info.offsets.to_vec(), vec![15, 200]);
}

#[test]
fn byte_nz_slice_is_a_pure_cut() {
    let off = sample();
    let info = off.slice(1, 3, 15, 255, 1, 3);
    assert_eq!(info.offsets.to_vec(), vec![15, 200, 255]);
    assert_eq!((info.l_index, info.u_index), (1, 4));
}

#[test]
fn byte_nz_move_index() {
    let off = sample();
    let moved = off.move_index(10);
    assert_eq!(moved.offset_to_first(), 0);
    assert_eq!(moved.offset_to_last(), 245);
    assert_eq!(moved.packed(), off.packed());
    assert!(moved.shares_buffer_with(&off));
    assert_eq!(off.offset_to_first(), 10);
}

#[test]
fn single_element_byte_nz() {
    let off = OffsetByteNz::new(Vec::<u8>::new(), 42, 42);
    assert_eq!(off.size(), 1);
    let mut it = off.iter();
    assert_eq!(it.value(), 42);
    assert_eq!(it.skip_to(100), 42);
    assert_eq!(it.try_next(), None);
}

#[test]
fn escaped_byte_indices_diverge() {
    let offsets = factory::create(&[0, 300, 301, 1000]).unwrap();
    assert_eq!(offsets.tag(), OffsetTag::Byte);
    let Offsets::Byte(inner) = &offsets else {
        panic!("expected byte encoding");
    };
    // 300 = esc + 45, 1 = 1, 699 = esc esc + 189
    assert_eq!(inner.packed(), &[0, 45, 1, 0, 0, 189]);

    let mut it = offsets.iterator().unwrap();
    assert_eq!(it.next(), 300);
    assert_eq!((it.data_index(), it.offsets_index()), (1, 2));
    assert_eq!(it.next(), 301);
    assert_eq!(it.next(), 1000);
    assert_eq!((it.data_index(), it.offsets_index()), (3, 6));
    assert_eq!(offsets.to_vec(), vec![0, 300, 301, 1000]);
}

#[test]
fn escaped_cursors_step_over_escapes_alike() {
    let rows = [0, 255, 256, 1021, 70_000, 200_000];
    for tag in [OffsetTag::Byte, OffsetTag::Char] {
        let offsets = factory::create_as(tag, &rows).unwrap();
        let mut pos = offsets.iterator().unwrap();
        let mut pos_fast = pos.clone();
        let mut off = offsets.offset_iterator().unwrap();
        let mut off_fast = off.clone();
        for (i, &row) in rows.iter().enumerate().skip(1) {
            assert_eq!(PositionCursor::next(&mut pos), row);
            assert_eq!(OffsetCursor::next(&mut off), row);
            // SAFETY: the cursor sits before `row`, so a gap word follows it.
            assert_eq!(unsafe { PositionCursor::next_unchecked(&mut pos_fast) }, row);
            // SAFETY: as above.
            assert_eq!(unsafe { OffsetCursor::next_unchecked(&mut off_fast) }, row);
            assert_eq!(pos.data_index(), i);
            assert_eq!(pos_fast.offsets_index(), pos.offsets_index());
        }
        assert!(!pos.has_next() && !off.has_next());
    }
}

#[test]
fn escaped_round_trip_and_size() {
    for rows in [vec![1, 2, 600, 100_000], vec![5, 70_000, 140_001, 140_002]] {
        for options in [EncodingOptions::default(), EncodingOptions::default().with_allow_char(false)] {
            let offsets = factory::create_with(&rows, &options).unwrap();
            let bytes = offsets.to_bytes().unwrap();
            assert_eq!(bytes.len() as u64, offsets.exact_size_on_disk());
            let read = factory::from_bytes(&bytes).unwrap();
            assert_eq!(read, offsets);
            assert_eq!(read.to_vec(), rows);
            assert_eq!(read.size(), rows.len());
        }
    }
}

#[test]
fn factory_variant_selection() {
    let opts = EncodingOptions::default();
    assert_eq!(factory::choose_tag(&[], &opts), OffsetTag::Empty);
    assert_eq!(factory::choose_tag(&[9], &opts), OffsetTag::Single);
    assert_eq!(factory::choose_tag(&[0, 255, 510], &opts), OffsetTag::ByteNz);
    assert_eq!(factory::choose_tag(&[0, 256], &opts), OffsetTag::Byte);
    // very wide gaps are cheaper as u16 words
    let wide: Vec<u32> = (0..64).map(|i| i * 60_000).collect();
    assert_eq!(factory::choose_tag(&wide, &opts), OffsetTag::Char);
    assert_eq!(factory::choose_tag(&wide, &opts.with_allow_char(false)), OffsetTag::Byte);
}

#[test]
fn factory_rejects_unsorted_input() {
    let err = factory::create(&[3, 2]).unwrap_err();
    assert!(matches!(err, OffsetError::NotStrictlyIncreasing { index: 1, .. }));
}

#[test]
fn forced_no_escape_rejects_wide_gap() {
    let err = factory::create_as(OffsetTag::ByteNz, &[0, 1000]).unwrap_err();
    assert!(matches!(err, OffsetError::GapTooLarge { gap: 1000, .. }));
}

#[test]
fn forced_encoding_rejects_wrong_length() {
    let err = factory::create_as(OffsetTag::Single, &[1, 2, 3]).unwrap_err();
    assert!(matches!(err, OffsetError::LengthMismatch { tag: OffsetTag::Single, expected: 1, got: 3 }));
    assert!(!err.is_format_error());

    let err = factory::create_as(OffsetTag::Char, &[]).unwrap_err();
    assert!(matches!(err, OffsetError::LengthMismatch { expected: 1, got: 0, .. }));
}

#[test]
fn single_and_empty_records() {
    for rows in [vec![], vec![77]] {
        let offsets = factory::create(&rows).unwrap();
        let bytes = offsets.to_bytes().unwrap();
        assert_eq!(bytes.len() as u64, offsets.exact_size_on_disk());
        assert_eq!(factory::from_bytes(&bytes).unwrap(), offsets);
    }
    assert!(factory::create(&[]).unwrap().iterator().is_none());
}

#[test]
fn read_rejects_bad_records() {
    let good = Offsets::ByteNz(sample()).to_bytes().unwrap();

    let truncated = &good[..good.len() - 1];
    let err = factory::from_bytes(truncated).unwrap_err();
    assert!(matches!(&err, OffsetError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    assert!(err.is_format_error());

    let mut negative = good.clone();
    negative[5..9].copy_from_slice(&(-1i32).to_be_bytes());
    let err = factory::from_bytes(&negative).unwrap_err();
    assert!(matches!(err, OffsetError::Corrupt { field: "length", value: -1 }));

    let mut unknown = good;
    unknown[0] = 99;
    assert!(matches!(factory::from_bytes(&unknown).unwrap_err(), OffsetError::UnknownTag(99)));

    assert!(matches!(factory::from_bytes(&[]).unwrap_err(), OffsetError::Io(_)));
}

#[test]
fn absurd_length_fails_without_allocating_it() {
    let mut bytes = vec![OffsetTag::ByteNz.as_u8()];
    bytes.extend_from_slice(&0i32.to_be_bytes());
    bytes.extend_from_slice(&i32::MAX.to_be_bytes());
    bytes.extend_from_slice(&10i32.to_be_bytes());
    bytes.extend_from_slice(&[1, 2, 3]);
    assert!(matches!(factory::from_bytes(&bytes).unwrap_err(), OffsetError::Io(_)));
}

#[test]
fn verify_catches_inconsistent_bounds() {
    let bad = Offsets::ByteNz(OffsetByteNz::new(vec![5u8, 185, 55], 10, 300));
    assert!(matches!(bad.verify(), Err(OffsetError::Corrupt { field: "offset_to_last", .. })));

    let dup = Offsets::ByteNz(OffsetByteNz::new(vec![5u8, 0], 10, 15));
    assert!(matches!(dup.verify(), Err(OffsetError::Corrupt { field: "gap", .. })));

    let trailing = Offsets::Byte(OffsetByte::new(vec![3u8, 0], 0, 3));
    assert!(matches!(trailing.verify(), Err(OffsetError::Corrupt { field: "trailing escape", .. })));

    let bytes = bad.to_bytes().unwrap();
    assert!(factory::read_from(&mut bytes.as_slice()).is_ok());
    assert!(factory::read_from_with(&mut bytes.as_slice(), &EncodingOptions::default().with_verify(true)).is_err());
}

#[test]
fn verify_rejects_offsets_past_u32_range() {
    // Escapes alone carry the running offset past u32::MAX.
    let escapes: i32 = 32_769;
    let mut bytes = vec![OffsetTag::Char.as_u8()];
    bytes.extend_from_slice(&i32::MAX.to_be_bytes());
    bytes.extend_from_slice(&(escapes + 1).to_be_bytes());
    bytes.extend_from_slice(&i32::MAX.to_be_bytes());
    bytes.extend(std::iter::repeat(0u8).take(2 * escapes as usize));
    bytes.extend_from_slice(&1u16.to_be_bytes());

    let options = EncodingOptions::default().with_verify(true);
    let err = factory::read_from_with(&mut bytes.as_slice(), &options).unwrap_err();
    assert!(matches!(err, OffsetError::Corrupt { field: "offset", .. }));
    assert!(err.is_format_error());
}

#[test]
fn slice_rows_matches_filtering() {
    let rows = vec![3, 10, 11, 300, 301, 302, 1000, 70_000];
    let offsets = factory::create(&rows).unwrap();
    for (l, u) in [(0, 5), (4, 11), (10, 302), (11, 1000), (303, 999), (1000, 1001), (0, 100_000), (80_000, 90_000)] {
        let info = offsets.slice_rows(l, u);
        let expected: Vec<u32> = rows.iter().copied().filter(|&r| r >= l && r < u).map(|r| r - l).collect();
        assert_eq!(info.offsets.to_vec(), expected, "window [{l}, {u})");
        assert_eq!(info.len(), expected.len(), "window [{l}, {u})");
        if !expected.is_empty() {
            let first = rows.iter().position(|&r| r >= l).unwrap();
            assert_eq!(info.l_index, first);
        }
    }
}

#[test]
fn slice_rows_whole_window_shares_buffer() {
    let offsets = Offsets::ByteNz(sample());
    let info = offsets.slice_rows(5, 1000);
    assert_eq!((info.l_index, info.u_index), (0, 4));
    assert_eq!(info.offsets.to_vec(), vec![5, 10, 195, 250]);
    if let (Offsets::ByteNz(a), Offsets::ByteNz(b)) = (&offsets, &info.offsets) {
        assert!(a.shares_buffer_with(b));
    }
}

#[test]
fn slice_rows_on_single() {
    let offsets = factory::create(&[50]).unwrap();
    assert_eq!(offsets.slice_rows(40, 60).offsets.to_vec(), vec![10]);
    assert!(offsets.slice_rows(51, 60).is_empty());
    assert!(offsets.slice_rows(0, 50).is_empty());
}

#[test]
fn append_concatenates() {
    let left = factory::create(&[1, 5, 9]).unwrap();
    let right = factory::create(&[0, 2, 1000]).unwrap();
    let joined = left.append(&right, 10).unwrap();
    assert_eq!(joined.to_vec(), vec![1, 5, 9, 10, 12, 1010]);
    assert_eq!(joined.tag(), OffsetTag::Byte);

    let err = left.append(&right, 9).unwrap_err();
    assert!(matches!(err, OffsetError::InvalidAppend { last: 9, next_first: 9 }));

    let empty = factory::create(&[]).unwrap();
    assert_eq!(empty.append(&left, 0).unwrap(), left);
    assert_eq!(left.append(&empty, 0).unwrap(), left);
}

#[test]
fn iterator_at_and_resume() {
    let rows = vec![2, 4, 600, 601, 90_000];
    let offsets = factory::create(&rows).unwrap();

    let it = offsets.iterator_at(5).unwrap();
    assert_eq!(it.value(), 600);
    assert_eq!(it.data_index(), 2);
    assert!(offsets.iterator_at(90_001).is_none());

    let mut resumed = offsets.iterator_from(it.resume_point()).unwrap();
    assert_eq!(resumed.value(), 600);
    assert_eq!(resumed.next(), 601);
    assert_eq!(resumed.next(), 90_000);
    assert_eq!(resumed.data_index(), 4);
}

#[test]
fn resume_points_and_partitions() {
    let mut rows: Vec<u32> = (0..500).map(|i| i * 7 + (i % 3) * 400).collect();
    rows.sort_unstable();
    rows.dedup();
    let offsets = factory::create(&rows).unwrap();

    let bounds = [0, 100, 1000, 1001, 2500, 10_000];
    let parts = offsets.map_partitions(&bounds, |_, part| part.collect::<Vec<_>>());
    assert_eq!(parts.len(), bounds.len() - 1);

    let mut flattened = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        for &(data_index, row) in part {
            assert!(row >= bounds[i] && row < bounds[i + 1]);
            assert_eq!(rows[data_index], row);
            flattened.push(row);
        }
    }
    assert_eq!(flattened, rows);

    let points = offsets.resume_points(&[0, 20_000]);
    assert_eq!(points[0].map(|p| p.row), Some(rows[0]));
    assert!(points[1].is_none());
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_partitions_match_sequential() {
    let rows: Vec<u32> = (0..10_000).map(|i| i * 3).collect();
    let offsets = factory::create(&rows).unwrap();
    let bounds: Vec<u32> = (0..=30).map(|i| i * 1000).collect();
    let seq = offsets.map_partitions(&bounds, |_, part| part.count());
    let par = offsets.par_map_partitions(&bounds, |_, part| part.count());
    assert_eq!(seq, par);
    assert_eq!(par.iter().sum::<usize>(), rows.len());
}

#[test]
fn stats_summary() {
    let offsets = Offsets::ByteNz(sample());
    let stats = offsets.stats();
    assert_eq!(stats.tag, OffsetTag::ByteNz);
    assert_eq!(stats.size, 4);
    assert_eq!(stats.first, Some(10));
    assert_eq!(stats.last, Some(255));
    assert_eq!(stats.max_gap, 185);
    assert_eq!(stats.bytes_on_disk, 16);
    let json = serde_json::to_string(&stats).unwrap();
    let back: OffsetStats = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stats);
}
