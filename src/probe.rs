//! Probe-and-retry retrieval of variable-length native output.
//!
//! Several native calls write into a caller-supplied buffer whose required size is only known
//! after the call. The engine reports a shortage with [`crate::backend::codes::ERROR_NOMEMORY`]
//! and, for some calls, the size it needed. [`probe_bytes`] issues the call with an initial
//! buffer and retries exactly once with a larger one. If the second attempt still falls short
//! the engine has broken its own contract and the probe fails instead of returning truncated
//! output.

use crate::{Error, NativeError, Result};

/// How the retry buffer is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// Use the size reported by the engine, falling back to doubling if none was reported
    Reported,
    /// Double the previous buffer
    Double,
}

/// Outcome of one attempt, as reported by the probe callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The call succeeded and wrote this many bytes
    Complete(usize),
    /// The buffer was too small; `required` is the size the engine asked for, if it said
    Insufficient {
        /// Required buffer size in bytes
        required: Option<usize>,
    },
    /// The call failed with a native result code
    Failed(i32),
}

/// Runs `call` with a buffer of `initial` bytes and retries once if the buffer was too small.
///
/// Returns the buffer truncated to the length the successful attempt reported.
///
/// # Errors
///
/// - [`Error::Native`] if an attempt returns [`Probe::Failed`]
/// - [`Error::Internal`] if the retry is still too small, or a reported length exceeds the buffer
pub fn probe_bytes<F>(initial: usize, growth: Growth, mut call: F) -> Result<Vec<u8>>
where
    F: FnMut(&mut [u8]) -> Probe,
{
    let mut buffer = vec![0u8; initial.max(1)];

    for attempt in 0..2 {
        match call(&mut buffer) {
            Probe::Complete(len) => {
                if len > buffer.len() {
                    return Err(Error::Internal(format!(
                        "engine reported {} bytes written into a {}-byte buffer",
                        len,
                        buffer.len()
                    )));
                }
                buffer.truncate(len);
                return Ok(buffer);
            }
            Probe::Failed(code) => return Err(Error::Native(NativeError::new(code))),
            Probe::Insufficient { required } if attempt == 0 => {
                let next = match (growth, required) {
                    (Growth::Reported, Some(required)) if required > buffer.len() => required,
                    _ => buffer.len().saturating_mul(2),
                };
                buffer = vec![0u8; next];
            }
            Probe::Insufficient { .. } => break,
        }
    }

    Err(Error::Internal(format!(
        "output still does not fit after one retry with {} bytes",
        buffer.len()
    )))
}
