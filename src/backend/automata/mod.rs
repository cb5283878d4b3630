//! In-process engine exposing the handle-based [`Backend`] contract.
//!
//! [`AutomataBackend`] compiles patterns with `regex-automata` and keeps every object it hands
//! out in a handle table, the way a C engine keeps heap objects behind pointers. Handles are
//! drawn from a counter and never reused, so a stale or double free is detected instead of
//! hitting a different object; such frees are answered with a negative code and counted.
//!
//! # Object table
//!
//! Objects are stored behind `Arc` and cloned out of the table before use. No table lock is held
//! while a match runs, which lets callouts call back into the backend (for example to replace
//! the callout of the context that is executing).
//!
//! # Differences from a backtracking engine
//!
//! Matching follows `regex-automata`'s leftmost-first semantics. Look-around and
//! back-references are rejected at compile time, partial matching is not available and JIT
//! compilation only records that it was requested.

mod compile;
mod exec;
mod serialize;
mod substitute;

use std::{
    ffi::c_void,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use dashmap::DashMap;

use self::{
    compile::{CompileSettings, CompiledPattern},
    exec::MatchSettings,
};
use super::{codes, Backend, CalloutFn, CompileStatus, PatternInfo};
use crate::Handle;

/// Sizes requested for a JIT stack.
#[derive(Debug, Clone, Copy)]
struct JitStackSizes {
    start: usize,
    max: usize,
}

/// Output vector storage of a match-data object.
#[derive(Debug)]
struct MatchDataState {
    ovector: Vec<i64>,
}

#[derive(Debug, Clone)]
enum Object {
    Code(Arc<CompiledPattern>),
    CompileContext(Arc<Mutex<CompileSettings>>),
    MatchContext(Arc<Mutex<MatchSettings>>),
    MatchData(Arc<Mutex<MatchDataState>>),
    JitStack(JitStackSizes),
}

impl Object {
    fn kind(&self) -> &'static str {
        match self {
            Object::Code(_) => "code",
            Object::CompileContext(_) => "compile context",
            Object::MatchContext(_) => "match context",
            Object::MatchData(_) => "match data",
            Object::JitStack(_) => "JIT stack",
        }
    }
}

/// Handle-based regular-expression engine running in-process.
///
/// Each instance has its own handle table; handles from one instance mean nothing to another.
///
/// # Examples
///
/// ```rust
/// use nativeregex::{backend::{Backend, CompileStatus}, AutomataBackend};
///
/// let engine = AutomataBackend::new();
/// let mut status = CompileStatus::default();
/// let code = engine.compile(b"a+", 0, nativeregex::Handle::NULL, &mut status);
/// assert!(!code.is_null());
/// assert_eq!(engine.live_objects(), 1);
/// assert_eq!(engine.code_free(code), 0);
/// assert_eq!(engine.live_objects(), 0);
/// ```
#[derive(Debug)]
pub struct AutomataBackend {
    objects: DashMap<usize, Object>,
    next: AtomicUsize,
    invalid_frees: AtomicUsize,
}

impl Default for AutomataBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomataBackend {
    /// Creates an engine with an empty handle table.
    pub fn new() -> Self {
        AutomataBackend {
            objects: DashMap::new(),
            next: AtomicUsize::new(1),
            invalid_frees: AtomicUsize::new(0),
        }
    }

    /// Number of objects currently allocated.
    pub fn live_objects(&self) -> usize {
        self.objects.len()
    }

    /// Number of release calls that named an unknown handle or an object of another type.
    pub fn invalid_frees(&self) -> usize {
        self.invalid_frees.load(Ordering::Relaxed)
    }

    fn insert(&self, object: Object) -> Handle {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        self.objects.insert(raw, object);
        Handle::from_raw(raw)
    }

    fn get(&self, handle: Handle) -> Option<Object> {
        self.objects.get(&handle.as_raw()).map(|o| o.value().clone())
    }

    fn code(&self, handle: Handle) -> Option<Arc<CompiledPattern>> {
        match self.get(handle)? {
            Object::Code(code) => Some(code),
            _ => None,
        }
    }

    fn compile_context(&self, handle: Handle) -> Option<Arc<Mutex<CompileSettings>>> {
        match self.get(handle)? {
            Object::CompileContext(settings) => Some(settings),
            _ => None,
        }
    }

    fn match_context(&self, handle: Handle) -> Option<Arc<Mutex<MatchSettings>>> {
        match self.get(handle)? {
            Object::MatchContext(settings) => Some(settings),
            _ => None,
        }
    }

    fn match_data(&self, handle: Handle) -> Option<Arc<Mutex<MatchDataState>>> {
        match self.get(handle)? {
            Object::MatchData(state) => Some(state),
            _ => None,
        }
    }

    /// Removes an object of the expected kind.
    fn free(&self, handle: Handle, kind: &'static str) -> i32 {
        if handle.is_null() {
            return 0;
        }
        if self
            .objects
            .remove_if(&handle.as_raw(), |_, object| object.kind() == kind)
            .is_some()
        {
            return 0;
        }

        self.invalid_frees.fetch_add(1, Ordering::Relaxed);
        match self.get(handle) {
            Some(other) => {
                log::warn!("{kind} release called with a {} handle {handle:?}", other.kind());
                codes::ERROR_BADMAGIC
            }
            None => {
                log::warn!("{kind} release called with unknown handle {handle:?}");
                codes::ERROR_BADDATA
            }
        }
    }

    fn update_compile_context(
        &self,
        ccontext: Handle,
        f: impl FnOnce(&mut CompileSettings),
    ) -> i32 {
        match self.compile_context(ccontext) {
            Some(settings) => {
                f(&mut lock!(settings));
                0
            }
            None => codes::ERROR_BADMAGIC,
        }
    }

    fn update_match_context(&self, mctx: Handle, f: impl FnOnce(&mut MatchSettings)) -> i32 {
        match self.match_context(mctx) {
            Some(settings) => {
                f(&mut lock!(settings));
                0
            }
            None => codes::ERROR_BADMAGIC,
        }
    }

    /// Settings of a match context, or the defaults for the null handle.
    fn match_settings(&self, mctx: Handle) -> Result<MatchSettings, i32> {
        if mctx.is_null() {
            return Ok(MatchSettings::default());
        }
        self.match_context(mctx)
            .map(|settings| *lock!(settings))
            .ok_or(codes::ERROR_BADMAGIC)
    }
}

impl Backend for AutomataBackend {
    fn version(&self) -> &str {
        concat!("automata-", env!("CARGO_PKG_VERSION"))
    }

    fn compile_context_create(&self) -> Handle {
        self.insert(Object::CompileContext(Arc::new(Mutex::new(
            CompileSettings::default(),
        ))))
    }

    fn compile_context_free(&self, ccontext: Handle) -> i32 {
        self.free(ccontext, "compile context")
    }

    fn set_max_pattern_length(&self, ccontext: Handle, length: usize) -> i32 {
        self.update_compile_context(ccontext, |s| s.max_pattern_length = length)
    }

    fn set_parens_nest_limit(&self, ccontext: Handle, limit: u32) -> i32 {
        self.update_compile_context(ccontext, |s| s.parens_nest_limit = limit)
    }

    fn set_newline(&self, ccontext: Handle, newline: u32) -> i32 {
        // Unicode line breaks beyond CR and LF are not expressible as look-around here.
        if !(codes::NEWLINE_CR..=codes::NEWLINE_NUL).contains(&newline)
            || newline == codes::NEWLINE_ANY
        {
            return codes::ERROR_BADDATA;
        }
        self.update_compile_context(ccontext, |s| s.newline = newline)
    }

    fn compile(
        &self,
        pattern: &[u8],
        options: u32,
        ccontext: Handle,
        status: &mut CompileStatus,
    ) -> Handle {
        let settings = if ccontext.is_null() {
            CompileSettings::default()
        } else {
            match self.compile_context(ccontext) {
                Some(settings) => *lock!(settings),
                None => {
                    *status = CompileStatus {
                        code: codes::COMPILE_BAD_OPTIONS,
                        offset: 0,
                    };
                    return Handle::NULL;
                }
            }
        };

        match compile::compile(pattern, options, &settings) {
            Ok(compiled) => {
                *status = CompileStatus::default();
                self.insert(Object::Code(Arc::new(compiled)))
            }
            Err(failure) => {
                *status = failure;
                Handle::NULL
            }
        }
    }

    fn code_copy(&self, code: Handle) -> Handle {
        match self.code(code) {
            Some(compiled) => self.insert(Object::Code(Arc::new(compiled.as_ref().clone()))),
            None => Handle::NULL,
        }
    }

    fn code_free(&self, code: Handle) -> i32 {
        self.free(code, "code")
    }

    fn pattern_info(&self, code: Handle, what: PatternInfo) -> i64 {
        let Some(compiled) = self.code(code) else {
            return i64::from(codes::ERROR_BADMAGIC);
        };
        let size = (compiled.regex.memory_usage() + compiled.source.len()) as i64;
        match what {
            PatternInfo::CaptureCount => i64::from(compiled.capture_count),
            PatternInfo::NameCount => compiled.names.len() as i64,
            PatternInfo::NameEntrySize => compiled.name_entry_size() as i64,
            PatternInfo::ArgOptions => i64::from(compiled.options),
            PatternInfo::Size => size,
            PatternInfo::JitSize => {
                if compiled.is_jit() {
                    size
                } else {
                    0
                }
            }
        }
    }

    fn name_table(&self, code: Handle, out: &mut [u8]) -> i32 {
        let Some(compiled) = self.code(code) else {
            return codes::ERROR_BADMAGIC;
        };
        let entry = compiled.name_entry_size();
        let required = entry * compiled.names.len();
        if out.len() < required {
            return codes::ERROR_NOMEMORY;
        }

        for (slot, (name, group)) in out.chunks_exact_mut(entry.max(1)).zip(&compiled.names) {
            slot.fill(0);
            slot[..2].copy_from_slice(&(*group as u16).to_be_bytes());
            slot[2..2 + name.len()].copy_from_slice(name.as_bytes());
        }
        required as i32
    }

    fn jit_compile(&self, code: Handle, options: u32) -> i32 {
        let Some(compiled) = self.code(code) else {
            return codes::ERROR_BADMAGIC;
        };
        if options & !codes::JIT_COMPLETE != 0 || options == 0 {
            return codes::ERROR_JIT_BADOPTION;
        }
        compiled.set_jit();
        0
    }

    fn jit_stack_create(&self, start_size: usize, max_size: usize) -> Handle {
        if start_size == 0 || start_size > max_size {
            return Handle::NULL;
        }
        self.insert(Object::JitStack(JitStackSizes {
            start: start_size,
            max: max_size,
        }))
    }

    fn jit_stack_free(&self, stack: Handle) -> i32 {
        self.free(stack, "JIT stack")
    }

    fn match_context_create(&self) -> Handle {
        self.insert(Object::MatchContext(Arc::new(Mutex::new(
            MatchSettings::default(),
        ))))
    }

    fn match_context_free(&self, mctx: Handle) -> i32 {
        self.free(mctx, "match context")
    }

    fn set_match_limit(&self, mctx: Handle, limit: u32) -> i32 {
        self.update_match_context(mctx, |s| s.match_limit = limit)
    }

    fn set_depth_limit(&self, mctx: Handle, limit: u32) -> i32 {
        self.update_match_context(mctx, |s| s.depth_limit = limit)
    }

    fn set_heap_limit(&self, mctx: Handle, limit_kib: u32) -> i32 {
        self.update_match_context(mctx, |s| s.heap_limit_kib = limit_kib)
    }

    fn set_offset_limit(&self, mctx: Handle, limit: Option<usize>) -> i32 {
        self.update_match_context(mctx, |s| s.offset_limit = limit)
    }

    unsafe fn set_callout(
        &self,
        mctx: Handle,
        callout: Option<CalloutFn>,
        data: *mut c_void,
    ) -> i32 {
        let entry = callout.map(|f| (f, data as usize));
        self.update_match_context(mctx, |s| s.callout = entry)
    }

    fn jit_stack_assign(&self, mctx: Handle, stack: Handle) -> i32 {
        if !stack.is_null() {
            match self.get(stack) {
                Some(Object::JitStack(sizes)) => {
                    log::debug!(
                        "JIT stack {stack:?} ({}..{} bytes) assigned to {mctx:?}",
                        sizes.start,
                        sizes.max
                    );
                }
                _ => return codes::ERROR_BADMAGIC,
            }
        }
        self.update_match_context(mctx, |s| s.jit_stack = stack)
    }

    fn match_data_create(&self, pairs: u32) -> Handle {
        let pairs = pairs.max(1) as usize;
        self.insert(Object::MatchData(Arc::new(Mutex::new(MatchDataState {
            ovector: vec![codes::UNSET_OFFSET; pairs * 2],
        }))))
    }

    fn match_data_create_from_pattern(&self, code: Handle) -> Handle {
        match self.code(code) {
            Some(compiled) => self.match_data_create(compiled.capture_count + 1),
            None => Handle::NULL,
        }
    }

    fn match_data_free(&self, match_data: Handle) -> i32 {
        self.free(match_data, "match data")
    }

    fn ovector_count(&self, match_data: Handle) -> u32 {
        self.match_data(match_data)
            .map_or(0, |state| (lock!(state).ovector.len() / 2) as u32)
    }

    fn ovector(&self, match_data: Handle, out: &mut [i64]) -> i32 {
        let Some(state) = self.match_data(match_data) else {
            return codes::ERROR_BADMAGIC;
        };
        let state = lock!(state);
        let n = out.len().min(state.ovector.len());
        out[..n].copy_from_slice(&state.ovector[..n]);
        n as i32
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
        let (Some(compiled), Some(state)) = (self.code(code), self.match_data(match_data)) else {
            return codes::ERROR_BADMAGIC;
        };
        let settings = match self.match_settings(mctx) {
            Ok(settings) => settings,
            Err(code) => return code,
        };

        match exec::search(&compiled, subject, start, options, &settings) {
            Ok(found) => found.write_to(&mut lock!(state).ovector),
            Err(code) => code,
        }
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
        *out_len = codes::UNSET_LENGTH;
        let Some(compiled) = self.code(code) else {
            return codes::ERROR_BADMAGIC;
        };
        let state = if match_data.is_null() {
            None
        } else {
            match self.match_data(match_data) {
                Some(state) => Some(state),
                None => return codes::ERROR_BADMAGIC,
            }
        };
        let settings = match self.match_settings(mctx) {
            Ok(settings) => settings,
            Err(code) => return code,
        };

        let result = match substitute::substitute(
            &compiled,
            subject,
            start,
            options,
            &settings,
            replacement,
        ) {
            Ok(result) => result,
            Err(code) => return code,
        };

        if let (Some(state), Some(found)) = (state, &result.last) {
            found.write_to(&mut lock!(state).ovector);
        }

        let required = result.output.len() + 1;
        if out.len() < required {
            if options & codes::SUBSTITUTE_OVERFLOW_LENGTH != 0 {
                *out_len = required;
            }
            return codes::ERROR_NOMEMORY;
        }

        out[..result.output.len()].copy_from_slice(&result.output);
        out[result.output.len()] = 0;
        *out_len = result.output.len();
        i32::try_from(result.count).unwrap_or(i32::MAX)
    }

    fn error_message(&self, code: i32, out: &mut [u8]) -> i32 {
        let Some(text) = codes::message(code) else {
            return codes::ERROR_BADDATA;
        };
        if out.is_empty() {
            return codes::ERROR_NOMEMORY;
        }

        let bytes = text.as_bytes();
        if out.len() <= bytes.len() {
            let n = out.len() - 1;
            out[..n].copy_from_slice(&bytes[..n]);
            out[n] = 0;
            return codes::ERROR_NOMEMORY;
        }
        out[..bytes.len()].copy_from_slice(bytes);
        out[bytes.len()] = 0;
        bytes.len() as i32
    }

    fn serialize_encode(&self, codes_in: &[Handle], out: &mut Vec<u8>) -> i32 {
        if codes_in.is_empty() {
            return codes::ERROR_BADDATA;
        }
        let mut patterns = Vec::with_capacity(codes_in.len());
        for &handle in codes_in {
            if handle.is_null() {
                return codes::ERROR_NULL;
            }
            match self.code(handle) {
                Some(compiled) => patterns.push(compiled),
                None => return codes::ERROR_BADMAGIC,
            }
        }

        let borrowed: Vec<&CompiledPattern> = patterns.iter().map(Arc::as_ref).collect();
        match serialize::encode(self.version(), &borrowed, out) {
            Ok(()) => borrowed.len() as i32,
            Err(code) => code,
        }
    }

    fn serialize_decode(&self, blob: &[u8], codes_out: &mut [Handle]) -> i32 {
        if codes_out.is_empty() {
            return codes::ERROR_BADDATA;
        }
        let records = match serialize::decode(self.version(), blob, codes_out.len()) {
            Ok(records) => records,
            Err(code) => return code,
        };

        let mut created = Vec::with_capacity(records.len());
        for record in records {
            match compile::compile(&record.source, record.options, &record.settings) {
                Ok(compiled) => created.push(self.insert(Object::Code(Arc::new(compiled)))),
                Err(_) => {
                    for handle in created {
                        self.code_free(handle);
                    }
                    return codes::ERROR_BADSERIALIZEDDATA;
                }
            }
        }

        for (slot, handle) in codes_out.iter_mut().zip(&created) {
            *slot = *handle;
        }
        created.len() as i32
    }

    fn serialize_number_of_codes(&self, blob: &[u8]) -> i32 {
        match serialize::count(self.version(), blob) {
            Ok(count) => i32::try_from(count).unwrap_or(codes::ERROR_BADSERIALIZEDDATA),
            Err(code) => code,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::c_int;

    use super::*;
    use crate::backend::CalloutBlock;

    fn compile(engine: &AutomataBackend, pattern: &str, options: u32) -> Handle {
        let mut status = CompileStatus::default();
        let handle = engine.compile(pattern.as_bytes(), options, Handle::NULL, &mut status);
        assert!(!handle.is_null(), "compile failed: {status:?}");
        handle
    }

    #[test]
    fn handles_are_never_reused() {
        let engine = AutomataBackend::new();
        let a = engine.match_data_create(1);
        assert_eq!(engine.match_data_free(a), 0);
        let b = engine.match_data_create(1);
        assert_ne!(a, b);

        assert_eq!(engine.match_data_free(a), codes::ERROR_BADDATA);
        assert_eq!(engine.code_free(b), codes::ERROR_BADMAGIC);
        assert_eq!(engine.invalid_frees(), 2);
        assert_eq!(engine.live_objects(), 1);
    }

    #[test]
    fn execute_fills_match_data() {
        let engine = AutomataBackend::new();
        let code = compile(&engine, r"(\w+)@(\w+\.\w+)", 0);
        let md = engine.match_data_create_from_pattern(code);
        assert_eq!(engine.ovector_count(md), 3);

        let rc = engine.execute(code, b"user@example.com", 0, 0, md, Handle::NULL);
        assert_eq!(rc, 3);
        let mut ovector = [0i64; 6];
        assert_eq!(engine.ovector(md, &mut ovector), 6);
        assert_eq!(ovector, [0, 16, 0, 4, 5, 16]);

        let rc = engine.execute(code, b"nothing here", 0, 0, md, Handle::NULL);
        assert_eq!(rc, codes::ERROR_NOMATCH);
    }

    #[test]
    fn compile_context_settings_apply() {
        let engine = AutomataBackend::new();
        let ccontext = engine.compile_context_create();
        assert_eq!(engine.set_max_pattern_length(ccontext, 2), 0);
        assert_eq!(engine.set_newline(ccontext, 99), codes::ERROR_BADDATA);
        assert_eq!(engine.set_newline(ccontext, codes::NEWLINE_ANY), codes::ERROR_BADDATA);

        let mut status = CompileStatus::default();
        let code = engine.compile(b"abc", 0, ccontext, &mut status);
        assert!(code.is_null());
        assert_eq!(status.code, codes::COMPILE_PATTERN_TOO_LONG);
    }

    #[test]
    fn name_table_layout() {
        let engine = AutomataBackend::new();
        let code = compile(&engine, r"(?<b>x)(?<abc>y)", 0);
        assert_eq!(engine.pattern_info(code, PatternInfo::NameCount), 2);
        assert_eq!(engine.pattern_info(code, PatternInfo::NameEntrySize), 6);

        let mut small = [0u8; 4];
        assert_eq!(engine.name_table(code, &mut small), codes::ERROR_NOMEMORY);

        let mut table = [0xffu8; 12];
        assert_eq!(engine.name_table(code, &mut table), 12);
        assert_eq!(&table[..6], &[0, 2, b'a', b'b', b'c', 0]);
        assert_eq!(&table[6..], &[0, 1, b'b', 0, 0, 0]);
    }

    #[test]
    fn substitute_reports_required_size() {
        let engine = AutomataBackend::new();
        let code = compile(&engine, "o", 0);
        let options = codes::SUBSTITUTE_GLOBAL | codes::SUBSTITUTE_OVERFLOW_LENGTH;

        let mut out_len = 0usize;
        let mut small = [0u8; 4];
        let rc = engine.substitute(
            code, b"foo", 0, options, Handle::NULL, Handle::NULL, b"00", &mut small, &mut out_len,
        );
        assert_eq!(rc, codes::ERROR_NOMEMORY);
        assert_eq!(out_len, 6);

        let mut out = vec![0u8; out_len];
        let rc = engine.substitute(
            code, b"foo", 0, options, Handle::NULL, Handle::NULL, b"00", &mut out, &mut out_len,
        );
        assert_eq!(rc, 2);
        assert_eq!(&out[..out_len], b"f0000");
        assert_eq!(out[out_len], 0);
    }

    #[test]
    fn error_messages_are_truncated_with_a_code() {
        let engine = AutomataBackend::new();
        let mut out = [0u8; 64];
        let n = engine.error_message(codes::ERROR_NOMATCH, &mut out);
        assert_eq!(&out[..n as usize], b"no match");

        let mut tiny = [0u8; 4];
        assert_eq!(engine.error_message(codes::ERROR_NOMATCH, &mut tiny), codes::ERROR_NOMEMORY);
        assert_eq!(&tiny, b"no \0");

        assert_eq!(engine.error_message(12345, &mut out), codes::ERROR_BADDATA);
    }

    #[test]
    fn serialization_recompiles() {
        let engine = AutomataBackend::new();
        let a = compile(&engine, "a+", codes::CASELESS);
        let b = compile(&engine, "(b)(c)", 0);

        let mut blob = Vec::new();
        assert_eq!(engine.serialize_encode(&[a, b], &mut blob), 2);
        assert_eq!(engine.serialize_number_of_codes(&blob), 2);

        let mut decoded = [Handle::NULL; 2];
        assert_eq!(engine.serialize_decode(&blob, &mut decoded), 2);
        assert_eq!(
            engine.pattern_info(decoded[0], PatternInfo::ArgOptions),
            i64::from(codes::CASELESS)
        );
        assert_eq!(engine.pattern_info(decoded[1], PatternInfo::CaptureCount), 2);

        let other = AutomataBackend::new();
        assert_eq!(other.serialize_number_of_codes(&blob), 2);
        assert_eq!(
            other.serialize_decode(&blob[..blob.len() - 1], &mut decoded),
            codes::ERROR_BADSERIALIZEDDATA
        );
        assert_eq!(other.live_objects(), 0);
        assert_eq!(engine.serialize_encode(&[], &mut blob), codes::ERROR_BADDATA);
    }

    #[test]
    fn jit_is_recorded() {
        let engine = AutomataBackend::new();
        let code = compile(&engine, "a", 0);
        assert_eq!(engine.pattern_info(code, PatternInfo::JitSize), 0);
        assert_eq!(engine.jit_compile(code, codes::JIT_PARTIAL_SOFT), codes::ERROR_JIT_BADOPTION);
        assert_eq!(engine.jit_compile(code, codes::JIT_COMPLETE), 0);
        assert!(engine.pattern_info(code, PatternInfo::JitSize) > 0);

        let copy = engine.code_copy(code);
        assert_eq!(engine.pattern_info(copy, PatternInfo::JitSize), 0);
    }

    unsafe extern "C" fn count_calls(_block: *const CalloutBlock, data: *mut c_void) -> c_int {
        let counter = &*(data as *const AtomicUsize);
        counter.fetch_add(1, Ordering::SeqCst);
        0
    }

    #[test]
    fn callouts_run_through_the_match_context() {
        let engine = AutomataBackend::new();
        let code = compile(&engine, "a(?C1)(?C2)", 0);
        let md = engine.match_data_create(1);
        let mctx = engine.match_context_create();
        let counter = AtomicUsize::new(0);

        let rc = unsafe {
            engine.set_callout(
                mctx,
                Some(count_calls),
                &counter as *const AtomicUsize as *mut c_void,
            )
        };
        assert_eq!(rc, 0);
        assert_eq!(engine.execute(code, b"xa", 0, 0, md, mctx), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        let rc = unsafe { engine.set_callout(mctx, None, std::ptr::null_mut()) };
        assert_eq!(rc, 0);
        assert_eq!(engine.execute(code, b"xa", 0, 0, md, mctx), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
