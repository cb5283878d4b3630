//! Safe wrappers around the native engine objects.
//!
//! Every type here owns exactly one native object through a
//! [`crate::resource::NativeResource`] and validates its arguments before the native call is
//! issued. Indices at this level are UTF-16 code-unit indices; byte offsets only appear where
//! they are explicitly asked for.
//!
//! # Key Components
//!
//! - [`Code`] - a compiled pattern: matching, iteration, substitution and pattern facts
//! - [`MatchData`] - the output vector of one match
//! - [`CompileContext`] / [`MatchContext`] - settings, limits and the callout handler
//! - [`JitStack`] - native stack for JIT-compiled matching
//! - [`Captures`] - one match, translated to UTF-16 indices
//! - [`serialize`] / [`deserialize`] - persisting compiled patterns
//!
//! # Thread Safety
//!
//! [`Code`] is `Send + Sync` and may be matched from many threads at once. [`MatchData`] and
//! [`MatchContext`] carry per-call state; give each thread its own.

mod captures;
mod code;
mod context;
mod jit;
mod match_data;
mod serialize;

use std::sync::Arc;

pub use captures::Captures;
pub use code::{Code, Matches, NameEntry, Substitution};
pub use context::{CompileContext, MatchContext};
pub use jit::JitStack;
pub use match_data::MatchData;
pub use serialize::{deserialize, serialize, serialized_pattern_count};

use crate::{
    backend::{codes, same_backend},
    probe::{probe_bytes, Growth, Probe},
    Backend, Result,
};

/// Initial buffer size for error messages.
const MESSAGE_BUFFER: usize = 64;

/// The engine's message text for a result or compile error code.
///
/// # Errors
///
/// Returns [`crate::Error::Native`] for codes the engine does not know, or
/// [`crate::Error::Internal`] if the message does not fit after one retry.
pub fn error_message(backend: &Arc<dyn Backend>, code: i32) -> Result<String> {
    let bytes = probe_bytes(MESSAGE_BUFFER, Growth::Double, |buffer| {
        match backend.error_message(code, buffer) {
            codes::ERROR_NOMEMORY => Probe::Insufficient { required: None },
            rc if rc < 0 => Probe::Failed(rc),
            rc => Probe::Complete(rc as usize),
        }
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(crate) fn ensure_same_backend(
    owner: &Arc<dyn Backend>,
    other: &Arc<dyn Backend>,
    what: &str,
) -> Result<()> {
    if same_backend(owner, other) {
        Ok(())
    } else {
        Err(invalid_argument!("{} belongs to a different backend", what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test::{backend, CountingBackend},
        Error, NativeErrorKind,
    };

    #[test]
    fn messages_come_from_the_engine() {
        let backend = backend();
        assert_eq!(error_message(&backend, codes::ERROR_NOMATCH).unwrap(), "no match");
        assert!(!error_message(&backend, codes::COMPILE_UNCLOSED_GROUP)
            .unwrap()
            .is_empty());

        match error_message(&backend, 12345) {
            Err(Error::Native(e)) => assert_eq!(e.kind(), NativeErrorKind::BadData),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn long_messages_double_the_buffer_once() {
        let counting = Arc::new(CountingBackend::new());
        let backend: Arc<dyn Backend> = counting.clone();
        let full = codes::message(codes::COMPILE_PATTERN_TOO_LONG).unwrap();

        // 54 visible bytes cannot hold the message, 118 can.
        counting.shorten_message_buffers(10);
        let text = error_message(&backend, codes::COMPILE_PATTERN_TOO_LONG).unwrap();
        assert_eq!(text, full);
        assert_eq!(counting.calls("error_message"), 2);

        // 28 visible bytes after doubling are still too few.
        counting.shorten_message_buffers(100);
        assert!(matches!(
            error_message(&backend, codes::COMPILE_PATTERN_TOO_LONG),
            Err(Error::Internal(_))
        ));
        assert_eq!(counting.calls("error_message"), 4);
    }
}
