//! Bridging native callouts to Rust closures.
//!
//! The engine calls back through a plain C function pointer plus an opaque data pointer. A
//! [`CalloutRegistration`] boxes a closure, exposes the box address as that data pointer and
//! provides a trampoline that turns the raw [`CalloutBlock`] into a borrowed [`Callout`] view
//! before invoking the closure.
//!
//! The registration must stay alive for as long as the engine may call it. [`crate::MatchContext`]
//! owns its registration and hands it to the cleanup path together with the native context, so
//! the closure is only dropped after the native context has been released.

use std::{
    ffi::{c_int, c_void},
    fmt,
    panic::{self, AssertUnwindSafe},
};

use crate::{
    backend::{codes, CalloutBlock, CalloutFn},
    Handle,
};

/// The closure type accepted as a callout handler.
///
/// The return value goes to the engine unchanged: `0` continues, a positive value rejects the
/// current candidate, a negative value aborts the match with that value as its error code.
pub type CalloutHandler = dyn Fn(&Callout<'_>) -> i32 + Send + Sync + 'static;

/// Borrowed view of one callout invocation.
pub struct Callout<'a> {
    block: &'a CalloutBlock,
}

impl<'a> Callout<'a> {
    /// Wraps a raw block.
    ///
    /// # Safety
    ///
    /// Every pointer/length pair in `block` must describe readable memory for `'a`.
    pub unsafe fn from_block(block: &'a CalloutBlock) -> Self {
        Callout { block }
    }

    /// Callout number; `255` for automatic callouts, `0` for string callouts.
    pub fn number(&self) -> u32 {
        self.block.callout_number
    }

    /// The callout string of a `(?C"...")` item.
    pub fn string(&self) -> Option<&'a str> {
        if self.block.callout_string.is_null() {
            return None;
        }
        // SAFETY: guaranteed by `from_block`
        let bytes = unsafe {
            std::slice::from_raw_parts(
                self.block.callout_string,
                self.block.callout_string_length,
            )
        };
        std::str::from_utf8(bytes).ok()
    }

    /// One more than the highest group set in the current candidate.
    pub fn capture_top(&self) -> u32 {
        self.block.capture_top
    }

    /// The most recently closed group.
    pub fn capture_last(&self) -> u32 {
        self.block.capture_last
    }

    /// Byte-offset output vector of the current candidate.
    pub fn offset_vector(&self) -> &'a [i64] {
        if self.block.offset_vector.is_null() {
            return &[];
        }
        // SAFETY: guaranteed by `from_block`
        unsafe {
            std::slice::from_raw_parts(self.block.offset_vector, self.block.offset_vector_len)
        }
    }

    /// Subject bytes.
    pub fn subject(&self) -> &'a [u8] {
        if self.block.subject.is_null() {
            return &[];
        }
        // SAFETY: guaranteed by `from_block`
        unsafe { std::slice::from_raw_parts(self.block.subject, self.block.subject_length) }
    }

    /// Byte offset where the current candidate starts.
    pub fn start_match(&self) -> usize {
        self.block.start_match
    }

    /// Current byte position in the subject.
    pub fn current_position(&self) -> usize {
        self.block.current_position
    }

    /// Byte offset of the callout item in the pattern.
    pub fn pattern_position(&self) -> usize {
        self.block.pattern_position
    }
}

impl fmt::Debug for Callout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callout")
            .field("number", &self.number())
            .field("string", &self.string())
            .field("start_match", &self.start_match())
            .field("current_position", &self.current_position())
            .finish()
    }
}

/// A closure registered as a native callout handler.
pub struct CalloutRegistration {
    // Double box: the outer allocation gives a thin, stable pointer for the engine.
    thunk: Box<Box<CalloutHandler>>,
}

impl CalloutRegistration {
    /// Boxes `handler` for use by the engine.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Callout<'_>) -> i32 + Send + Sync + 'static,
    {
        CalloutRegistration {
            thunk: Box::new(Box::new(handler)),
        }
    }

    /// Native identity of this registration, the address handed to the engine.
    pub fn handle(&self) -> Handle {
        Handle::from_raw(self.data() as usize)
    }

    /// The C entry point to install together with [`CalloutRegistration::data`].
    pub fn entry(&self) -> CalloutFn {
        trampoline
    }

    /// The user-data pointer to install together with [`CalloutRegistration::entry`].
    pub fn data(&self) -> *mut c_void {
        let inner: &Box<CalloutHandler> = &self.thunk;
        inner as *const Box<CalloutHandler> as *mut c_void
    }
}

impl fmt::Debug for CalloutRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CalloutRegistration")
            .field(&self.handle())
            .finish()
    }
}

unsafe extern "C" fn trampoline(block: *const CalloutBlock, data: *mut c_void) -> c_int {
    if block.is_null() || data.is_null() {
        return codes::ERROR_CALLOUT;
    }

    // SAFETY: `data` was produced by `CalloutRegistration::data`, which the owning match context
    // keeps alive while it is installed; `block` is valid for the duration of the call.
    let handler = &*(data as *const Box<CalloutHandler>);
    let view = Callout::from_block(&*block);

    match panic::catch_unwind(AssertUnwindSafe(|| handler(&view))) {
        Ok(signal) => signal,
        Err(_) => {
            log::error!("callout handler panicked, aborting the match");
            codes::ERROR_CALLOUT
        }
    }
}
