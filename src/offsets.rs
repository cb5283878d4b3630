//! Translation between native byte offsets and UTF-16 string indices.
//!
//! The native engine reports every position as a byte offset into the UTF-8 form of the subject.
//! Callers hold the subject as UTF-16 and index it by code unit. This module converts between the
//! two without ever materialising the UTF-8 bytes: the width of each UTF-16 unit in UTF-8 is
//! known from its value alone.
//!
//! | UTF-16 unit            | UTF-8 bytes |
//! |------------------------|-------------|
//! | `0x0000..=0x007F`      | 1           |
//! | `0x0080..=0x07FF`      | 2           |
//! | surrogate half         | 2           |
//! | any other unit         | 3           |
//!
//! A surrogate pair therefore occupies four bytes, two per half, which matches the four-byte
//! UTF-8 sequence of the supplementary code point it encodes.
//!
//! # Mapping table
//!
//! [`map_offsets_to_indices`] walks the subject once and builds a table covering the byte region
//! touched by the output vector. Every byte inside a unit maps to the index of that unit, so
//! offsets that land inside a multi-byte sequence round down to the start of the sequence. The
//! byte just past the last unit maps to the index after it, which makes exclusive end offsets
//! come out right. Sentinel offsets (`-1`) of groups that did not participate pass through.
//!
//! # Example
//!
//! ```rust
//! use nativeregex::offsets::map_offsets_to_indices;
//! use widestring::u16str;
//!
//! // "Hello " is six bytes, the globe emoji four bytes (two UTF-16 units).
//! let subject = u16str!("Hello 🌐 World");
//! let indices = map_offsets_to_indices(subject, &[6, 10])?;
//! assert_eq!(indices, vec![6, 8]);
//! # Ok::<(), nativeregex::Error>(())
//! ```

use widestring::U16Str;

use crate::{backend::codes::UNSET_OFFSET, Result};

/// Number of UTF-8 bytes the given UTF-16 code unit contributes.
#[inline]
fn unit_width(unit: u16) -> usize {
    match unit {
        0x0000..=0x007F => 1,
        0x0080..=0x07FF => 2,
        0xD800..=0xDFFF => 2,
        _ => 3,
    }
}

#[inline]
fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

#[inline]
fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Length of the UTF-8 encoding of `subject`, in bytes.
#[must_use]
pub fn utf8_len(subject: &U16Str) -> usize {
    subject.as_slice().iter().map(|&u| unit_width(u)).sum()
}

/// Converts a UTF-16 code-unit index into the matching UTF-8 byte offset.
///
/// `index` may equal the length of the subject. An index between the two halves of a surrogate
/// pair has no byte counterpart and is rejected.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidArgument`] if `index` is past the end of the subject or splits a
/// surrogate pair.
pub fn index_to_byte_offset(subject: &U16Str, index: usize) -> Result<usize> {
    let units = subject.as_slice();
    if index > units.len() {
        return Err(invalid_argument!(
            "index {} is past the end of a subject of {} units",
            index,
            units.len()
        ));
    }

    if index > 0
        && index < units.len()
        && is_high_surrogate(units[index - 1])
        && is_low_surrogate(units[index])
    {
        return Err(invalid_argument!("index {} splits a surrogate pair", index));
    }

    Ok(units[..index].iter().map(|&u| unit_width(u)).sum())
}

/// Maps a native output vector of UTF-8 byte offsets to UTF-16 code-unit indices.
///
/// The result has the same length as `ovector`. A group whose start is `-1` did not take part
/// in the match; its end is ignored and both of its entries come out as `-1`. The
/// translation covers the overall match span widened to include every other set offset, so
/// capture groups reported outside the match (lookaround) translate as well.
///
/// Runs in time linear in the subject up to the end of the covered region and allocates one
/// table the size of that region.
///
/// # Arguments
///
/// * `subject` - The UTF-16 subject the offsets refer to
/// * `ovector` - Flat `(start, end)` pairs as reported by the engine
///
/// # Errors
///
/// Returns [`crate::Error::InvalidArgument`] when the vector is malformed: odd length, fewer than
/// two entries, an unset or inverted overall match, a negative offset in a set pair, an offset
/// past the end of the subject, or an index that does not fit in `i32`.
pub fn map_offsets_to_indices(subject: &U16Str, ovector: &[i64]) -> Result<Vec<i32>> {
    if ovector.len() < 2 {
        return Err(invalid_argument!(
            "output vector needs at least one pair, got {} entries",
            ovector.len()
        ));
    }
    if ovector.len() % 2 != 0 {
        return Err(invalid_argument!(
            "output vector length {} is odd",
            ovector.len()
        ));
    }
    if ovector[0] == UNSET_OFFSET {
        return Err(invalid_argument!("overall match is unset"));
    }
    if ovector[0] > ovector[1] {
        return Err(invalid_argument!(
            "overall match start {} is after its end {}",
            ovector[0],
            ovector[1]
        ));
    }

    let byte_len = utf8_len(subject);
    let mut lo = usize::MAX;
    let mut hi = 0usize;

    for (pair, chunk) in ovector.chunks_exact(2).enumerate() {
        let (start, end) = (chunk[0], chunk[1]);
        if start == UNSET_OFFSET {
            continue;
        }

        for offset in [start, end] {
            let offset = usize::try_from(offset)
                .map_err(|_| invalid_argument!("pair {} has negative offset {}", pair, offset))?;
            if offset > byte_len {
                return Err(invalid_argument!(
                    "offset {} is past the end of a {}-byte subject",
                    offset,
                    byte_len
                ));
            }
            lo = lo.min(offset);
            hi = hi.max(offset);
        }
    }

    let table = build_table(subject, lo, hi)?;
    let mut indices = Vec::with_capacity(ovector.len());
    for chunk in ovector.chunks_exact(2) {
        if chunk[0] == UNSET_OFFSET {
            indices.extend([-1, -1]);
        } else {
            // Validated above: lo <= offset <= hi
            indices.extend(chunk.iter().map(|&offset| table[offset as usize - lo]));
        }
    }

    Ok(indices)
}

/// Builds the byte-to-index table for the inclusive byte region `lo..=hi`.
fn build_table(subject: &U16Str, lo: usize, hi: usize) -> Result<Vec<i32>> {
    let mut table = vec![0i32; hi - lo + 1];
    let mut byte = 0usize;
    let mut index = 0usize;

    for &unit in subject.as_slice() {
        if byte > hi {
            break;
        }

        let value = i32::try_from(index)
            .map_err(|_| invalid_argument!("index {} does not fit in i32", index))?;
        let width = unit_width(unit);
        for b in byte.max(lo)..(byte + width).min(hi + 1) {
            table[b - lo] = value;
        }

        byte += width;
        index += 1;
    }

    if byte == hi {
        table[hi - lo] = i32::try_from(index)
            .map_err(|_| invalid_argument!("index {} does not fit in i32", index))?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use widestring::{u16str, U16String};

    use super::*;
    use crate::Error;

    /// Slices the subject by translated indices and returns it as a Rust string.
    fn extract(subject: &U16Str, indices: &[i32], pair: usize) -> String {
        let start = indices[pair * 2] as usize;
        let end = indices[pair * 2 + 1] as usize;
        String::from_utf16(&subject.as_slice()[start..end]).unwrap()
    }

    #[test]
    fn ascii_passes_through() {
        let subject = u16str!("user@example.com");
        let ovector = [0, 16, 0, 4, 5, 16];
        let indices = map_offsets_to_indices(subject, &ovector).unwrap();
        assert_eq!(indices, vec![0, 16, 0, 4, 5, 16]);
        assert_eq!(extract(subject, &indices, 1), "user");
        assert_eq!(extract(subject, &indices, 2), "example.com");
    }

    #[test]
    fn two_byte_characters() {
        // "é" is two bytes in UTF-8, one unit in UTF-16.
        let subject = u16str!("café au lait");
        // "au" starts at byte 6, index 5.
        let indices = map_offsets_to_indices(subject, &[6, 8]).unwrap();
        assert_eq!(indices, vec![5, 7]);
        assert_eq!(extract(subject, &indices, 0), "au");

        let indices = map_offsets_to_indices(subject, &[3, 5]).unwrap();
        assert_eq!(extract(subject, &indices, 0), "é");
    }

    #[test]
    fn three_byte_characters() {
        let subject = u16str!("日本語テキスト");
        // "語" is bytes 6..9
        let indices = map_offsets_to_indices(subject, &[6, 9]).unwrap();
        assert_eq!(indices, vec![2, 3]);
        assert_eq!(extract(subject, &indices, 0), "語");
    }

    #[test]
    fn surrogate_pairs() {
        let subject = u16str!("Hello 🌐 World");
        let indices = map_offsets_to_indices(subject, &[6, 10]).unwrap();
        assert_eq!(indices, vec![6, 8]);
        assert_eq!(extract(subject, &indices, 0), "🌐");

        let indices = map_offsets_to_indices(subject, &[11, 16]).unwrap();
        assert_eq!(extract(subject, &indices, 0), "World");
    }

    #[test]
    fn mixed_widths() {
        let subject = u16str!("a\u{e9}\u{65e5}\u{1F600}z");
        // bytes: a=0, é=1..3, 日=3..6, 😀=6..10, z=10..11
        let indices = map_offsets_to_indices(subject, &[0, 11, 1, 3, 3, 6, 6, 10, 10, 11]).unwrap();
        assert_eq!(indices, vec![0, 6, 1, 2, 2, 3, 3, 5, 5, 6]);
    }

    #[test]
    fn offsets_inside_a_sequence_round_down() {
        let subject = u16str!("x\u{65e5}y");
        let indices = map_offsets_to_indices(subject, &[0, 4, 2, 3]).unwrap();
        assert_eq!(indices, vec![0, 2, 1, 1]);
    }

    #[test]
    fn monotonic_over_every_offset() {
        let subject = u16str!("ab\u{e9}\u{65e5}\u{1F310}cd");
        let len = utf8_len(subject) as i64;
        let mut previous = -1;
        for offset in 0..=len {
            let indices = map_offsets_to_indices(subject, &[offset, offset]).unwrap();
            assert!(indices[0] >= previous);
            previous = indices[0];
        }
        assert_eq!(previous as usize, subject.len());
    }

    #[test]
    fn sentinels_pass_through() {
        let subject = u16str!("abc");
        let indices = map_offsets_to_indices(subject, &[0, 3, -1, -1, 1, 2]).unwrap();
        assert_eq!(indices, vec![0, 3, -1, -1, 1, 2]);
    }

    #[test]
    fn end_of_an_unset_group_is_ignored() {
        let subject = u16str!("a\u{e9}c");
        let indices = map_offsets_to_indices(subject, &[0, 4, -1, 2, -1, 99, -1, -7]).unwrap();
        assert_eq!(indices, vec![0, 3, -1, -1, -1, -1, -1, -1]);
    }

    #[test]
    fn captures_outside_the_match_are_covered() {
        let subject = u16str!("\u{e9}\u{e9}\u{e9}x");
        let indices = map_offsets_to_indices(subject, &[6, 7, 0, 2]).unwrap();
        assert_eq!(indices, vec![3, 4, 0, 1]);
    }

    #[test]
    fn empty_match_at_end() {
        let subject = u16str!("\u{65e5}");
        let indices = map_offsets_to_indices(subject, &[3, 3]).unwrap();
        assert_eq!(indices, vec![1, 1]);

        let empty = U16String::new();
        let indices = map_offsets_to_indices(&empty, &[0, 0]).unwrap();
        assert_eq!(indices, vec![0, 0]);
    }

    #[test]
    fn malformed_vectors_fail_fast() {
        let subject = u16str!("abc");
        let cases: [&[i64]; 8] = [
            &[],
            &[0],
            &[0, 1, 2],
            &[-1, -1],
            &[2, 1],
            &[0, 4],
            &[0, 3, -2, 1],
            &[0, 3, 1, -1],
        ];
        for ovector in cases {
            assert!(
                matches!(
                    map_offsets_to_indices(subject, ovector),
                    Err(Error::InvalidArgument { .. })
                ),
                "{ovector:?} accepted"
            );
        }
    }

    #[test]
    fn index_to_byte_offset_round_trips() {
        let subject = u16str!("a\u{e9}\u{65e5}\u{1F600}z");
        let expected = [(0, 0), (1, 1), (2, 3), (3, 6), (5, 10), (6, 11)];
        for (index, byte) in expected {
            assert_eq!(index_to_byte_offset(subject, index).unwrap(), byte);
        }
        assert!(index_to_byte_offset(subject, 4).is_err());
        assert!(index_to_byte_offset(subject, 7).is_err());
    }

    #[test]
    fn utf8_len_matches_std() {
        let text = "Grüße, 世界! 🌍";
        let subject = U16String::from_str(text);
        assert_eq!(utf8_len(&subject), text.len());
    }
}
