//! Opaque native handles.
//!
//! A [`Handle`] is a pointer-width integer that the native engine hands out for every object it
//! allocates. This layer never dereferences it; it only passes it back to the [`crate::Backend`]
//! that produced it. The value `0` is reserved and always means "absent" or "allocation failed".

use std::fmt;

/// A non-owning, copyable reference to a native engine object.
///
/// Ownership lives in [`crate::resource::NativeResource`]; a bare `Handle` carries no lifetime
/// and no identity beyond equality.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle(usize);

impl Handle {
    /// The reserved "no resource" handle.
    pub const NULL: Handle = Handle(0);

    /// Wraps a raw native value.
    #[must_use]
    pub const fn from_raw(raw: usize) -> Self {
        Handle(raw)
    }

    /// The raw native value.
    #[must_use]
    pub const fn as_raw(self) -> usize {
        self.0
    }

    /// Returns `true` for the reserved null handle.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle(null)")
        } else {
            write!(f, "Handle(0x{:x})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_default() {
        assert_eq!(Handle::default(), Handle::NULL);
        assert!(Handle::NULL.is_null());
        assert!(!Handle::from_raw(7).is_null());
        assert_eq!(Handle::from_raw(7).as_raw(), 7);
        assert_eq!(format!("{:?}", Handle::from_raw(255)), "Handle(0xff)");
    }
}
