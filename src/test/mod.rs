//! Shared helpers for unit tests.

use std::{
    ffi::c_void,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use dashmap::DashMap;

use crate::{
    backend::{codes, CalloutFn, CompileStatus, PatternInfo},
    AutomataBackend, Backend, Handle,
};

// Helper function to create a fresh engine, so handle counts of one test never see another's
pub fn backend() -> Arc<dyn Backend> {
    Arc::new(AutomataBackend::new())
}

/// A [`Backend`] decorator that counts calls per entry point.
///
/// It can also understate the buffer size the engine reports after an output shortage, which
/// makes the retry of a probe fall short as well, and hide the tail of message buffers.
pub struct CountingBackend {
    inner: AutomataBackend,
    calls: DashMap<&'static str, usize>,
    understate: AtomicUsize,
    shorten: AtomicUsize,
}

impl CountingBackend {
    pub fn new() -> Self {
        CountingBackend {
            inner: AutomataBackend::new(),
            calls: DashMap::new(),
            understate: AtomicUsize::new(0),
            shorten: AtomicUsize::new(0),
        }
    }

    /// Number of calls made to `op` so far.
    pub fn calls(&self, op: &str) -> usize {
        self.calls.get(op).map(|count| *count).unwrap_or(0)
    }

    /// Subtract `bytes` from every size reported with `ERROR_NOMEMORY`.
    pub fn understate_sizes(&self, bytes: usize) {
        self.understate.store(bytes, Ordering::Relaxed);
    }

    /// Hide the last `bytes` of every buffer passed to `error_message`.
    pub fn shorten_message_buffers(&self, bytes: usize) {
        self.shorten.store(bytes, Ordering::Relaxed);
    }

    fn count(&self, op: &'static str) {
        *self.calls.entry(op).or_insert(0) += 1;
    }
}

impl Backend for CountingBackend {
    fn version(&self) -> &str {
        self.inner.version()
    }

    fn compile_context_create(&self) -> Handle {
        self.count("compile_context_create");
        self.inner.compile_context_create()
    }

    fn compile_context_free(&self, ccontext: Handle) -> i32 {
        self.count("compile_context_free");
        self.inner.compile_context_free(ccontext)
    }

    fn set_max_pattern_length(&self, ccontext: Handle, length: usize) -> i32 {
        self.count("set_max_pattern_length");
        self.inner.set_max_pattern_length(ccontext, length)
    }

    fn set_parens_nest_limit(&self, ccontext: Handle, limit: u32) -> i32 {
        self.count("set_parens_nest_limit");
        self.inner.set_parens_nest_limit(ccontext, limit)
    }

    fn set_newline(&self, ccontext: Handle, newline: u32) -> i32 {
        self.count("set_newline");
        self.inner.set_newline(ccontext, newline)
    }

    fn compile(
        &self,
        pattern: &[u8],
        options: u32,
        ccontext: Handle,
        status: &mut CompileStatus,
    ) -> Handle {
        self.count("compile");
        self.inner.compile(pattern, options, ccontext, status)
    }

    fn code_copy(&self, code: Handle) -> Handle {
        self.count("code_copy");
        self.inner.code_copy(code)
    }

    fn code_free(&self, code: Handle) -> i32 {
        self.count("code_free");
        self.inner.code_free(code)
    }

    fn pattern_info(&self, code: Handle, what: PatternInfo) -> i64 {
        self.count("pattern_info");
        self.inner.pattern_info(code, what)
    }

    fn name_table(&self, code: Handle, out: &mut [u8]) -> i32 {
        self.count("name_table");
        self.inner.name_table(code, out)
    }

    fn jit_compile(&self, code: Handle, options: u32) -> i32 {
        self.count("jit_compile");
        self.inner.jit_compile(code, options)
    }

    fn jit_stack_create(&self, start_size: usize, max_size: usize) -> Handle {
        self.count("jit_stack_create");
        self.inner.jit_stack_create(start_size, max_size)
    }

    fn jit_stack_free(&self, stack: Handle) -> i32 {
        self.count("jit_stack_free");
        self.inner.jit_stack_free(stack)
    }

    fn match_context_create(&self) -> Handle {
        self.count("match_context_create");
        self.inner.match_context_create()
    }

    fn match_context_free(&self, mctx: Handle) -> i32 {
        self.count("match_context_free");
        self.inner.match_context_free(mctx)
    }

    fn set_match_limit(&self, mctx: Handle, limit: u32) -> i32 {
        self.count("set_match_limit");
        self.inner.set_match_limit(mctx, limit)
    }

    fn set_depth_limit(&self, mctx: Handle, limit: u32) -> i32 {
        self.count("set_depth_limit");
        self.inner.set_depth_limit(mctx, limit)
    }

    fn set_heap_limit(&self, mctx: Handle, limit_kib: u32) -> i32 {
        self.count("set_heap_limit");
        self.inner.set_heap_limit(mctx, limit_kib)
    }

    fn set_offset_limit(&self, mctx: Handle, limit: Option<usize>) -> i32 {
        self.count("set_offset_limit");
        self.inner.set_offset_limit(mctx, limit)
    }

    unsafe fn set_callout(
        &self,
        mctx: Handle,
        callout: Option<CalloutFn>,
        data: *mut c_void,
    ) -> i32 {
        self.count("set_callout");
        // SAFETY: forwarded unchanged; the caller upholds the contract.
        unsafe { self.inner.set_callout(mctx, callout, data) }
    }

    fn jit_stack_assign(&self, mctx: Handle, stack: Handle) -> i32 {
        self.count("jit_stack_assign");
        self.inner.jit_stack_assign(mctx, stack)
    }

    fn match_data_create(&self, pairs: u32) -> Handle {
        self.count("match_data_create");
        self.inner.match_data_create(pairs)
    }

    fn match_data_create_from_pattern(&self, code: Handle) -> Handle {
        self.count("match_data_create_from_pattern");
        self.inner.match_data_create_from_pattern(code)
    }

    fn match_data_free(&self, match_data: Handle) -> i32 {
        self.count("match_data_free");
        self.inner.match_data_free(match_data)
    }

    fn ovector_count(&self, match_data: Handle) -> u32 {
        self.count("ovector_count");
        self.inner.ovector_count(match_data)
    }

    fn ovector(&self, match_data: Handle, out: &mut [i64]) -> i32 {
        self.count("ovector");
        self.inner.ovector(match_data, out)
    }

    fn execute(
        &self,
        code: Handle,
        subject: &[u8],
        start: usize,
        options: u32,
        match_data: Handle,
        mctx: Handle,
    ) -> i32 {
        self.count("execute");
        self.inner
            .execute(code, subject, start, options, match_data, mctx)
    }

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
    ) -> i32 {
        self.count("substitute");
        let rc = self.inner.substitute(
            code,
            subject,
            start,
            options,
            match_data,
            mctx,
            replacement,
            out,
            out_len,
        );
        if rc == codes::ERROR_NOMEMORY && *out_len != codes::UNSET_LENGTH {
            *out_len = out_len.saturating_sub(self.understate.load(Ordering::Relaxed));
        }
        rc
    }

    fn error_message(&self, code: i32, out: &mut [u8]) -> i32 {
        self.count("error_message");
        let visible = out.len().saturating_sub(self.shorten.load(Ordering::Relaxed));
        self.inner.error_message(code, &mut out[..visible])
    }

    fn serialize_encode(&self, codes: &[Handle], out: &mut Vec<u8>) -> i32 {
        self.count("serialize_encode");
        self.inner.serialize_encode(codes, out)
    }

    fn serialize_decode(&self, blob: &[u8], codes: &mut [Handle]) -> i32 {
        self.count("serialize_decode");
        self.inner.serialize_decode(blob, codes)
    }

    fn serialize_number_of_codes(&self, blob: &[u8]) -> i32 {
        self.count("serialize_number_of_codes");
        self.inner.serialize_number_of_codes(blob)
    }
}
