use strum::{EnumCount, EnumIter};
use thiserror::Error;

use crate::backend::codes;

macro_rules! invalid_argument {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidArgument {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidArgument {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure that crosses the binding layer ends up in one of these variants. The split
/// mirrors where a failure is detected: before the native call (caller contract), at native
/// allocation, inside the native operation, or after the resource has already been released.
///
/// # Error Categories
///
/// - [`Error::InvalidArgument`] - Caller contract violation, detected before any native call
/// - [`Error::Allocation`] - A native constructor returned the null handle
/// - [`Error::Native`] - A native operation returned a negative result code
/// - [`Error::Compile`] - Pattern compilation failed, with the offending pattern offset
/// - [`Error::Released`] - A resource was used after it had been released
/// - [`Error::Internal`] - The native engine broke its own output contract
///
/// # Examples
///
/// ```rust
/// use nativeregex::{backend::default_backend, Code, CompileOptions, Error};
/// use widestring::u16str;
///
/// let backend = default_backend();
/// match Code::compile(&backend, u16str!("(unclosed"), CompileOptions::empty(), None) {
///     Ok(_) => unreachable!(),
///     Err(Error::Compile { code, offset, message }) => {
///         println!("compile error {code} at {offset}: {message}");
///     }
///     Err(e) => println!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument violated the contract of the called operation.
    ///
    /// These are raised before any native call is issued and are never retried. The error
    /// includes the source location where the violation was detected.
    #[error("Invalid argument - {file}:{line}: {message}")]
    InvalidArgument {
        /// Description of the violated contract
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The native engine could not create the requested resource.
    ///
    /// Raised when an allocating native call returns the null handle. No cleanup record is
    /// registered for a resource that failed to allocate.
    #[error("Native resource could not be created - {0}")]
    Allocation(&'static str),

    /// A native operation reported an error result code.
    #[error("{0}")]
    Native(#[from] NativeError),

    /// The pattern could not be compiled.
    ///
    /// `offset` is the byte offset into the UTF-8 form of the pattern at which the engine
    /// stopped.
    #[error("Compilation failed - code {code} at offset {offset}: {message}")]
    Compile {
        /// The positive native compile error code
        code: i32,
        /// Byte offset into the pattern
        offset: usize,
        /// Message text retrieved from the engine
        message: String,
    },

    /// A resource was used after it had been released.
    #[error("{0} used after release")]
    Released(&'static str),

    /// The native engine violated its own contract.
    ///
    /// Used when an output buffer is still too small after the single permitted retry, or
    /// when the engine reports values that cannot be represented on this side.
    #[error("Internal error - {0}")]
    Internal(String),
}

/// A negative result code returned by a native operation.
///
/// The original code is preserved so callers can branch on the exact native semantics; the
/// [`NativeError::kind`] accessor gives an exhaustive view for `match` statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("Native error {code} ({kind:?})", kind = NativeErrorKind::from_code(*.code))]
pub struct NativeError {
    code: i32,
}

impl NativeError {
    /// Wraps a native result code.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        NativeError { code }
    }

    /// The original native result code.
    #[must_use]
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Classifies the code.
    #[must_use]
    pub fn kind(&self) -> NativeErrorKind {
        NativeErrorKind::from_code(self.code)
    }
}

/// Classification of native result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum NativeErrorKind {
    /// The subject did not match
    NoMatch,
    /// Only a partial match was found
    Partial,
    /// The subject is not valid in the engine's encoding
    Utf,
    /// A value passed to the engine was out of range
    BadData,
    /// A handle did not refer to an object of the expected type
    BadMagic,
    /// A serialized blob came from an incompatible engine build
    BadMode,
    /// The start offset was past the end of the subject
    BadOffset,
    /// An option bit is not supported by the operation
    BadOption,
    /// The replacement string is malformed
    BadReplacement,
    /// The start offset is not on a character boundary
    BadUtfOffset,
    /// A callout failed
    Callout,
    /// The engine hit an internal inconsistency
    Internal,
    /// An option is not supported for JIT compilation
    JitBadOption,
    /// The JIT stack was too small
    JitStackLimit,
    /// The match step limit was exceeded
    MatchLimit,
    /// An output buffer was too small
    NoMemory,
    /// A referenced capture group does not exist
    NoSubstring,
    /// A group name is ambiguous
    NoUniqueSubstring,
    /// A required argument was null
    Null,
    /// The depth limit was exceeded
    DepthLimit,
    /// The requested information is not available
    Unavailable,
    /// A referenced capture group did not participate in the match
    Unset,
    /// An offset limit was set without enabling it at compile time
    BadOffsetLimit,
    /// A replacement group reference is missing its closing brace
    RepMissingBrace,
    /// A serialized blob is corrupt or truncated
    BadSerializedData,
    /// The heap limit was exceeded
    HeapLimit,
    /// Any code this binding does not know about
    Unknown,
}

impl NativeErrorKind {
    /// Classifies a raw native result code.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            codes::ERROR_NOMATCH => NativeErrorKind::NoMatch,
            codes::ERROR_PARTIAL => NativeErrorKind::Partial,
            codes::ERROR_UTF8_ERR21..=codes::ERROR_UTF8_ERR1 => NativeErrorKind::Utf,
            codes::ERROR_BADDATA => NativeErrorKind::BadData,
            codes::ERROR_BADMAGIC => NativeErrorKind::BadMagic,
            codes::ERROR_BADMODE => NativeErrorKind::BadMode,
            codes::ERROR_BADOFFSET => NativeErrorKind::BadOffset,
            codes::ERROR_BADOPTION => NativeErrorKind::BadOption,
            codes::ERROR_BADREPLACEMENT => NativeErrorKind::BadReplacement,
            codes::ERROR_BADUTFOFFSET => NativeErrorKind::BadUtfOffset,
            codes::ERROR_CALLOUT => NativeErrorKind::Callout,
            codes::ERROR_INTERNAL => NativeErrorKind::Internal,
            codes::ERROR_JIT_BADOPTION => NativeErrorKind::JitBadOption,
            codes::ERROR_JIT_STACKLIMIT => NativeErrorKind::JitStackLimit,
            codes::ERROR_MATCHLIMIT => NativeErrorKind::MatchLimit,
            codes::ERROR_NOMEMORY => NativeErrorKind::NoMemory,
            codes::ERROR_NOSUBSTRING => NativeErrorKind::NoSubstring,
            codes::ERROR_NOUNIQUESUBSTRING => NativeErrorKind::NoUniqueSubstring,
            codes::ERROR_NULL => NativeErrorKind::Null,
            codes::ERROR_DEPTHLIMIT => NativeErrorKind::DepthLimit,
            codes::ERROR_UNAVAILABLE => NativeErrorKind::Unavailable,
            codes::ERROR_UNSET => NativeErrorKind::Unset,
            codes::ERROR_BADOFFSETLIMIT => NativeErrorKind::BadOffsetLimit,
            codes::ERROR_REPMISSINGBRACE => NativeErrorKind::RepMissingBrace,
            codes::ERROR_BADSERIALIZEDDATA => NativeErrorKind::BadSerializedData,
            codes::ERROR_HEAPLIMIT => NativeErrorKind::HeapLimit,
            _ => NativeErrorKind::Unknown,
        }
    }
}

/// Converts a native result code into a `Result`, keeping non-negative codes as the value.
pub(crate) fn check(rc: i32) -> crate::Result<i32> {
    if rc < 0 {
        Err(Error::Native(NativeError::new(rc)))
    } else {
        Ok(rc)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kinds_round_trip_through_codes() {
        let samples = [
            (codes::ERROR_NOMATCH, NativeErrorKind::NoMatch),
            (codes::ERROR_MATCHLIMIT, NativeErrorKind::MatchLimit),
            (codes::ERROR_DEPTHLIMIT, NativeErrorKind::DepthLimit),
            (codes::ERROR_HEAPLIMIT, NativeErrorKind::HeapLimit),
            (codes::ERROR_UTF8_ERR1, NativeErrorKind::Utf),
            (codes::ERROR_UTF8_ERR21, NativeErrorKind::Utf),
            (-9999, NativeErrorKind::Unknown),
        ];
        for (code, kind) in samples {
            assert_eq!(NativeError::new(code).kind(), kind);
            assert_eq!(NativeError::new(code).code(), code);
        }
    }

    #[test]
    fn display_names_the_kind() {
        let text = NativeError::new(codes::ERROR_MATCHLIMIT).to_string();
        assert_eq!(text, format!("Native error {} (MatchLimit)", codes::ERROR_MATCHLIMIT));
    }

    #[test]
    fn every_kind_is_reachable() {
        // Each kind except Unknown must be produced by at least one catalogued code.
        let produced: Vec<NativeErrorKind> = (-100..0).map(NativeErrorKind::from_code).collect();
        for kind in NativeErrorKind::iter() {
            assert!(produced.contains(&kind), "{kind:?} has no code");
        }
        assert_eq!(NativeErrorKind::COUNT, 27);
    }

    #[test]
    fn check_splits_on_sign() {
        assert_eq!(check(3).unwrap(), 3);
        assert_eq!(check(0).unwrap(), 0);
        match check(codes::ERROR_NOMEMORY) {
            Err(Error::Native(e)) => assert_eq!(e.kind(), NativeErrorKind::NoMemory),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_argument_records_location() {
        let err = invalid_argument!("pairs must be positive, got {}", 0);
        match err {
            Error::InvalidArgument { message, file, .. } => {
                assert_eq!(message, "pairs must be positive, got 0");
                assert!(file.ends_with("error.rs"));
            }
            _ => panic!("wrong variant"),
        }
    }
}
