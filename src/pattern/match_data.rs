use std::sync::Arc;

use crate::{
    resource::{MatchDataKind, NativeResource},
    Backend, Code, Handle, Result,
};

/// Native storage for the output vector of one match.
///
/// Match data is written by every match call that uses it, so each thread needs its own.
#[derive(Debug)]
pub struct MatchData {
    resource: NativeResource<MatchDataKind>,
    pairs: u32,
}

impl MatchData {
    /// Allocates match data with room for `pairs` offset pairs.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidArgument`] if `pairs` is zero
    /// - [`crate::Error::Allocation`] if the engine could not allocate it
    pub fn new(backend: &Arc<dyn Backend>, pairs: u32) -> Result<Self> {
        if pairs == 0 {
            return Err(invalid_argument!("match data needs at least one pair"));
        }

        let resource = NativeResource::create(backend, |b| b.match_data_create(pairs))?;
        Ok(MatchData { resource, pairs })
    }

    /// Allocates match data sized for every group of `code`.
    ///
    /// The pattern's handle is only read here; disposing `code` afterwards does not affect the
    /// match data.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Released`] if `code` was disposed
    /// - [`crate::Error::Allocation`] if the engine could not allocate it
    pub fn from_code(code: &Code) -> Result<Self> {
        let parent = code.handle()?;
        let resource = NativeResource::create(code.backend(), |b| {
            b.match_data_create_from_pattern(parent)
        })?;
        let pairs = resource.backend().ovector_count(resource.handle()?);
        Ok(MatchData { resource, pairs })
    }

    /// Number of offset pairs the output vector holds.
    pub fn ovector_pairs(&self) -> u32 {
        self.pairs
    }

    /// Copies the output vector of the last match.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal, or [`crate::Error::Native`] if the
    /// engine refuses the handle.
    pub fn ovector(&self) -> Result<Vec<i64>> {
        let handle = self.handle()?;
        let mut out = vec![0i64; self.pairs as usize * 2];
        let copied = crate::error::check(self.backend().ovector(handle, &mut out))?;
        out.truncate(copied as usize);
        Ok(out)
    }

    /// The native handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal.
    pub fn handle(&self) -> Result<Handle> {
        self.resource.handle()
    }

    /// The backend owning the match data.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        self.resource.backend()
    }

    /// Releases the match data now.
    pub fn dispose(&self) {
        self.resource.dispose();
    }

    /// Returns `true` once released.
    pub fn is_released(&self) -> bool {
        self.resource.is_released()
    }
}
