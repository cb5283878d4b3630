//! The foreign-call seam to the native regular-expression engine.
//!
//! [`Backend`] lists every native entry point the binding uses, expressed in the engine's own
//! vocabulary: integer [`Handle`]s with `0` meaning failure, signed result codes, caller-supplied
//! output buffers and a C-ABI callout function pointer. Nothing in this trait is "safe" in the
//! sense of the rest of the crate; the wrappers in [`crate::pattern`] validate arguments, own the
//! handles, translate offsets and map result codes before anything reaches a caller.
//!
//! # Implementations
//!
//! - [`AutomataBackend`] - in-process engine built on `regex-automata`, exposed through the same
//!   handle-based contract a C library would offer
//!
//! A binding for a dynamically loaded C engine implements the same trait by forwarding each
//! method to the corresponding foreign function.
//!
//! # Default backend
//!
//! Every resource constructor takes its backend explicitly. [`default_backend`] is an optional
//! convenience returning one lazily created, process-wide [`AutomataBackend`].

pub mod codes;

mod automata;

pub use automata::AutomataBackend;

use std::{
    ffi::{c_int, c_void},
    sync::{Arc, OnceLock},
};

use strum::{Display, EnumIter};

use crate::Handle;

/// Native callout entry point: receives the callout block and the registration's user data.
///
/// The return value is passed through to the engine unchanged: `0` continues, a positive value
/// makes the engine give up the current candidate, a negative value aborts the match with that
/// value as its result code.
pub type CalloutFn = unsafe extern "C" fn(block: *const CalloutBlock, data: *mut c_void) -> c_int;

/// Callout block layout version written by engines implementing this contract.
pub const CALLOUT_BLOCK_VERSION: u32 = 1;

/// Data describing one callout invocation, laid out for C callers.
///
/// All pointers are only valid for the duration of the callout.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CalloutBlock {
    /// Layout version, [`CALLOUT_BLOCK_VERSION`]
    pub version: u32,
    /// Callout number from the pattern (`255` for automatic callouts)
    pub callout_number: u32,
    /// One more than the highest group that is set
    pub capture_top: u32,
    /// Most recently closed group
    pub capture_last: u32,
    /// Output vector of the current candidate, `offset_vector_len` entries
    pub offset_vector: *const i64,
    /// Number of `i64` entries behind `offset_vector`
    pub offset_vector_len: usize,
    /// Subject bytes
    pub subject: *const u8,
    /// Subject length in bytes
    pub subject_length: usize,
    /// Byte offset where the current candidate starts
    pub start_match: usize,
    /// Current byte position in the subject
    pub current_position: usize,
    /// Byte offset of the callout item in the pattern
    pub pattern_position: usize,
    /// Callout string, or null for numbered callouts
    pub callout_string: *const u8,
    /// Length of the callout string in bytes
    pub callout_string_length: usize,
}

/// Compile failure details written by [`Backend::compile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStatus {
    /// Positive compile error code, `0` on success
    pub code: i32,
    /// Byte offset into the pattern where compilation stopped
    pub offset: usize,
}

/// Scalar facts about a compiled pattern, see [`Backend::pattern_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum PatternInfo {
    /// Number of capturing groups
    CaptureCount,
    /// Number of named groups
    NameCount,
    /// Size of one name-table entry in bytes
    NameEntrySize,
    /// Compile options the pattern was built with
    ArgOptions,
    /// Approximate size of the compiled pattern in bytes
    Size,
    /// Size of the JIT-compiled code, `0` when not JIT compiled
    JitSize,
}

/// The set of native entry points of a handle-based regular-expression engine.
///
/// Conventions shared by every method:
///
/// - Allocating methods return [`Handle::NULL`] on failure.
/// - Methods returning `i32` use `0` for success, a positive value for counts or sizes and a
///   negative [`codes`] value for errors.
/// - Output buffers are caller-owned. When one is too small the method returns
///   [`codes::ERROR_NOMEMORY`] and, where documented, reports the size it needed.
/// - Release methods return a negative code for handles they do not know; they never fault.
///
/// Implementations must be thread-safe: a compiled pattern may be used from many threads at
/// once, each with its own match data and match context.
pub trait Backend: Send + Sync {
    /// Engine version string; serialized blobs are only valid for the same version.
    fn version(&self) -> &str;

    /// Allocates a compile context.
    fn compile_context_create(&self) -> Handle;

    /// Releases a compile context.
    fn compile_context_free(&self, ccontext: Handle) -> i32;

    /// Sets the maximum pattern length in bytes.
    fn set_max_pattern_length(&self, ccontext: Handle, length: usize) -> i32;

    /// Sets the maximum parenthesis nesting depth.
    fn set_parens_nest_limit(&self, ccontext: Handle, limit: u32) -> i32;

    /// Sets the newline convention, one of the `NEWLINE_*` codes.
    fn set_newline(&self, ccontext: Handle, newline: u32) -> i32;

    /// Compiles `pattern` (UTF-8). `ccontext` may be null. On failure returns null and fills
    /// `status`.
    fn compile(
        &self,
        pattern: &[u8],
        options: u32,
        ccontext: Handle,
        status: &mut CompileStatus,
    ) -> Handle;

    /// Creates an independent copy of a compiled pattern.
    fn code_copy(&self, code: Handle) -> Handle;

    /// Releases a compiled pattern.
    fn code_free(&self, code: Handle) -> i32;

    /// Returns a scalar fact about a compiled pattern, or a negative code.
    fn pattern_info(&self, code: Handle, what: PatternInfo) -> i64;

    /// Copies the raw name table into `out`, returning the byte count or
    /// [`codes::ERROR_NOMEMORY`] when `out` is too small.
    fn name_table(&self, code: Handle, out: &mut [u8]) -> i32;

    /// JIT compiles a pattern.
    fn jit_compile(&self, code: Handle, options: u32) -> i32;

    /// Allocates a JIT stack.
    fn jit_stack_create(&self, start_size: usize, max_size: usize) -> Handle;

    /// Releases a JIT stack.
    fn jit_stack_free(&self, stack: Handle) -> i32;

    /// Allocates a match context.
    fn match_context_create(&self) -> Handle;

    /// Releases a match context.
    fn match_context_free(&self, mctx: Handle) -> i32;

    /// Sets the match step limit.
    fn set_match_limit(&self, mctx: Handle, limit: u32) -> i32;

    /// Sets the depth limit.
    fn set_depth_limit(&self, mctx: Handle, limit: u32) -> i32;

    /// Sets the heap limit in KiB.
    fn set_heap_limit(&self, mctx: Handle, limit_kib: u32) -> i32;

    /// Sets the offset limit; `None` clears it.
    fn set_offset_limit(&self, mctx: Handle, limit: Option<usize>) -> i32;

    /// Installs or clears the callout of a match context.
    ///
    /// # Safety
    ///
    /// When `callout` is `Some`, `data` must stay valid until the callout is replaced or cleared,
    /// or until the match context is released, and `callout` must be safe to call with it from
    /// any thread.
    unsafe fn set_callout(&self, mctx: Handle, callout: Option<CalloutFn>, data: *mut c_void)
        -> i32;

    /// Assigns a JIT stack to a match context; a null `stack` restores the default.
    fn jit_stack_assign(&self, mctx: Handle, stack: Handle) -> i32;

    /// Allocates match data with room for `pairs` offset pairs.
    fn match_data_create(&self, pairs: u32) -> Handle;

    /// Allocates match data sized for a compiled pattern.
    fn match_data_create_from_pattern(&self, code: Handle) -> Handle;

    /// Releases match data.
    fn match_data_free(&self, match_data: Handle) -> i32;

    /// Number of offset pairs the match data can hold, `0` for unknown handles.
    fn ovector_count(&self, match_data: Handle) -> u32;

    /// Copies the output vector into `out`, returning the number of `i64` values copied.
    fn ovector(&self, match_data: Handle, out: &mut [i64]) -> i32;

    /// Matches `subject` from byte offset `start`.
    ///
    /// Returns one more than the highest group that was set, `0` when the output vector was too
    /// small to hold every group, or a negative code ([`codes::ERROR_NOMATCH`] for no match).
    fn execute(
        &self,
        code: Handle,
        subject: &[u8],
        start: usize,
        options: u32,
        match_data: Handle,
        mctx: Handle,
    ) -> i32;

    /// Substitutes matches of `code` in `subject` with `replacement`, writing a NUL-terminated
    /// result into `out`.
    ///
    /// On success returns the number of replacements and sets `out_len` to the output length
    /// without the terminator. When `out` is too small returns [`codes::ERROR_NOMEMORY`]; with
    /// `SUBSTITUTE_OVERFLOW_LENGTH` set, `out_len` then holds the required size including the
    /// terminator, otherwise [`codes::UNSET_LENGTH`].
    #[allow(clippy::too_many_arguments)]
    fn substitute(
        &self,
        code: Handle,
        subject: &[u8],
        start: usize,
        options: u32,
        match_data: Handle,
        mctx: Handle,
        replacement: &[u8],
        out: &mut [u8],
        out_len: &mut usize,
    ) -> i32;

    /// Writes the NUL-terminated message for `code` into `out`, returning its length without the
    /// terminator, [`codes::ERROR_NOMEMORY`] if it was truncated, or [`codes::ERROR_BADDATA`] for
    /// unknown codes.
    fn error_message(&self, code: i32, out: &mut [u8]) -> i32;

    /// Serializes compiled patterns, appending the blob to `out`; returns the pattern count.
    fn serialize_encode(&self, codes: &[Handle], out: &mut Vec<u8>) -> i32;

    /// Rebuilds up to `codes.len()` patterns from a blob, returning how many were created.
    fn serialize_decode(&self, blob: &[u8], codes: &mut [Handle]) -> i32;

    /// Number of patterns stored in a blob, or a negative code.
    fn serialize_number_of_codes(&self, blob: &[u8]) -> i32;
}

static DEFAULT_BACKEND: OnceLock<Arc<dyn Backend>> = OnceLock::new();

/// Returns the process-wide default backend, creating it on first use.
///
/// This is a convenience only; resources created through different backends never mix.
pub fn default_backend() -> Arc<dyn Backend> {
    DEFAULT_BACKEND
        .get_or_init(|| Arc::new(AutomataBackend::new()))
        .clone()
}

/// Returns `true` if both references point at the same backend instance.
pub(crate) fn same_backend(a: &Arc<dyn Backend>, b: &Arc<dyn Backend>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
