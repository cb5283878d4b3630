use std::ops::Range;

use widestring::U16Str;

use crate::{offsets::map_offsets_to_indices, Code, Result};

/// The groups of one match, as engine byte offsets and as UTF-16 indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    ovector: Vec<i64>,
    indices: Vec<i32>,
}

impl Captures {
    /// Translates an output vector produced for `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if the vector is malformed or does not fit the
    /// subject, see [`map_offsets_to_indices`].
    pub fn new(subject: &U16Str, ovector: Vec<i64>) -> Result<Self> {
        let indices = map_offsets_to_indices(subject, &ovector)?;
        Ok(Captures { ovector, indices })
    }

    /// Number of groups, including the overall match.
    pub fn len(&self) -> usize {
        self.indices.len() / 2
    }

    /// Always `false`; a match has at least the overall group.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// UTF-16 range of group `i`, `None` if it is unset or out of range.
    pub fn get(&self, i: usize) -> Option<Range<usize>> {
        let start = *self.indices.get(2 * i)?;
        let end = *self.indices.get(2 * i + 1)?;
        if start < 0 || end < 0 {
            return None;
        }
        Some(start as usize..end as usize)
    }

    /// Byte range of group `i` in the UTF-8 subject.
    pub fn byte_range(&self, i: usize) -> Option<Range<usize>> {
        let start = *self.ovector.get(2 * i)?;
        let end = *self.ovector.get(2 * i + 1)?;
        if start < 0 || end < 0 {
            return None;
        }
        Some(start as usize..end as usize)
    }

    /// Text of group `i`, sliced out of the subject the match was made against.
    pub fn get_u16<'s>(&self, subject: &'s U16Str, i: usize) -> Option<&'s U16Str> {
        self.get(i)
            .and_then(|range| subject.as_slice().get(range))
            .map(U16Str::from_slice)
    }

    /// UTF-16 range of the group called `name`.
    ///
    /// # Errors
    ///
    /// See [`Code::name_table`].
    pub fn name(&self, code: &Code, name: &str) -> Result<Option<Range<usize>>> {
        Ok(code
            .group_number(name)?
            .and_then(|group| self.get(group as usize)))
    }

    /// The raw output vector in bytes.
    pub fn ovector(&self) -> &[i64] {
        &self.ovector
    }

    /// The output vector translated to UTF-16 indices.
    pub fn indices(&self) -> &[i32] {
        &self.indices
    }
}
