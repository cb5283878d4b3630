//! UTF-16 subjects prepared for the native engine.

use std::ops::Range;

use widestring::U16Str;

use crate::{offsets, Result};

/// A subject string held in both its UTF-16 and UTF-8 forms.
///
/// The engine matches UTF-8 bytes while callers index UTF-16 units. Transcoding once up front
/// lets a subject be matched repeatedly (iteration, batch matching) without paying for the
/// conversion on every call.
#[derive(Debug, Clone)]
pub struct Subject<'a> {
    wide: &'a U16Str,
    utf8: String,
}

impl<'a> Subject<'a> {
    /// Prepares a subject.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if `subject` contains an unpaired surrogate,
    /// which has no UTF-8 form.
    pub fn new(subject: &'a U16Str) -> Result<Self> {
        let utf8 = String::from_utf16(subject.as_slice())
            .map_err(|_| invalid_argument!("subject contains an unpaired surrogate"))?;
        Ok(Subject {
            wide: subject,
            utf8,
        })
    }

    /// The UTF-16 form.
    #[must_use]
    pub fn as_u16(&self) -> &'a U16Str {
        self.wide
    }

    /// The UTF-8 bytes handed to the engine.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.utf8.as_bytes()
    }

    /// The UTF-8 form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.utf8
    }

    /// Length in UTF-16 code units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wide.len()
    }

    /// Returns `true` for the empty subject.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wide.is_empty()
    }

    /// Byte offset of a UTF-16 index, see [`offsets::index_to_byte_offset`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for indices past the end or inside a surrogate
    /// pair.
    pub fn byte_offset(&self, index: usize) -> Result<usize> {
        offsets::index_to_byte_offset(self.wide, index)
    }

    /// Slice of the UTF-16 form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if the range is inverted or out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Result<&'a U16Str> {
        self.wide
            .as_slice()
            .get(range.clone())
            .map(U16Str::from_slice)
            .ok_or_else(|| invalid_argument!("range {:?} is outside the subject", range))
    }
}
