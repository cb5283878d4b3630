//! The search loop of the in-process engine.
//!
//! A search walks candidate matches left to right. Each candidate found by the leftmost-first
//! regex passes through the empty-match rules and then through the pattern's callouts; a
//! rejected candidate resumes the search one character after its start. Every attempt is
//! charged against the match context's limits before its result is looked at. Heap use is the
//! compiled regex plus its search cache.

use std::ffi::c_void;

use regex_automata::{Anchored, Input};

use super::compile::CompiledPattern;
use crate::{
    backend::{codes, CalloutBlock, CalloutFn, CALLOUT_BLOCK_VERSION},
    Handle,
};

/// Every match option bit this engine understands.
pub(super) const SUPPORTED_MATCH_OPTIONS: u32 =
    codes::ANCHORED | codes::NOTEMPTY | codes::NOTEMPTY_ATSTART | codes::NO_JIT;

/// Settings held by a match context.
#[derive(Debug, Clone, Copy)]
pub(super) struct MatchSettings {
    pub match_limit: u32,
    pub depth_limit: u32,
    pub heap_limit_kib: u32,
    pub offset_limit: Option<usize>,
    /// Entry point and user data; the pointer is kept as an address.
    pub callout: Option<(CalloutFn, usize)>,
    pub jit_stack: Handle,
}

impl Default for MatchSettings {
    fn default() -> Self {
        MatchSettings {
            match_limit: 10_000_000,
            depth_limit: 10_000_000,
            heap_limit_kib: 20_000_000,
            offset_limit: None,
            callout: None,
            jit_stack: Handle::NULL,
        }
    }
}

/// A successful match: every group of the pattern plus the highest group that was set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Found {
    pub groups: Vec<i64>,
    pub top: usize,
}

impl Found {
    /// Copies as many pairs as fit into `ovector` and computes the native result code.
    pub fn write_to(&self, ovector: &mut [i64]) -> i32 {
        ovector.fill(codes::UNSET_OFFSET);
        let n = ovector.len().min(self.groups.len());
        ovector[..n].copy_from_slice(&self.groups[..n]);

        if self.top * 2 > ovector.len() {
            0
        } else {
            self.top as i32
        }
    }
}

/// Matches `subject` from byte offset `start`, returning the match or a negative result code.
pub(super) fn search(
    pattern: &CompiledPattern,
    subject: &[u8],
    start: usize,
    options: u32,
    settings: &MatchSettings,
) -> Result<Found, i32> {
    if options & !SUPPORTED_MATCH_OPTIONS != 0 {
        return Err(codes::ERROR_BADOPTION);
    }
    if start > subject.len() {
        return Err(codes::ERROR_BADOFFSET);
    }
    let utf = pattern.is_utf();
    if utf {
        if std::str::from_utf8(subject).is_err() {
            return Err(codes::ERROR_UTF8_ERR1);
        }
        if !is_boundary(subject, start) {
            return Err(codes::ERROR_BADUTFOFFSET);
        }
    }
    if settings.offset_limit.is_some() && !pattern.has(codes::USE_OFFSET_LIMIT) {
        return Err(codes::ERROR_BADOFFSETLIMIT);
    }

    let anchored = (options | pattern.options) & codes::ANCHORED != 0;
    let not_empty = options & codes::NOTEMPTY != 0;
    let not_empty_at_start = options & codes::NOTEMPTY_ATSTART != 0;
    let callouts = match settings.callout {
        Some(_) => pattern.callouts(),
        None => Vec::new(),
    };

    let regex = &pattern.regex;
    let mut cache = regex.create_cache();
    let mut caps = regex.create_captures();
    let heap_limit = u64::from(settings.heap_limit_kib) * 1024;
    let footprint = regex.memory_usage() as u64;
    let mut scanned = 0u64;
    let mut rejections = 0u32;
    let mut at = start;

    loop {
        if at > subject.len() || settings.offset_limit.is_some_and(|limit| at > limit) {
            return Err(codes::ERROR_NOMATCH);
        }

        if footprint + cache.memory_usage() as u64 > heap_limit {
            return Err(codes::ERROR_HEAPLIMIT);
        }

        let input = Input::new(subject)
            .span(at..subject.len())
            .anchored(if anchored { Anchored::Yes } else { Anchored::No });
        regex.search_captures_with(&mut cache, &input, &mut caps);

        scanned += (subject.len() - at) as u64 + 1;
        if scanned > u64::from(settings.match_limit) {
            return Err(codes::ERROR_MATCHLIMIT);
        }
        if footprint + cache.memory_usage() as u64 > heap_limit {
            return Err(codes::ERROR_HEAPLIMIT);
        }

        let Some(m) = caps.get_match() else {
            return Err(codes::ERROR_NOMATCH);
        };
        if settings.offset_limit.is_some_and(|limit| m.start() > limit) {
            return Err(codes::ERROR_NOMATCH);
        }

        let mut found = collect(&caps);
        if m.is_empty() && (not_empty || (not_empty_at_start && m.start() == start)) {
            match longest_non_empty(pattern, subject, m.start()) {
                Some(longer) => found = longer,
                None => {
                    if anchored {
                        return Err(codes::ERROR_NOMATCH);
                    }
                    at = next_position(subject, m.start(), utf);
                    continue;
                }
            }
        }

        if let Some((entry, data)) = settings.callout {
            let signal = run_callouts(pattern, &callouts, entry, data, subject, &found);
            if signal < 0 {
                return Err(signal);
            }
            if signal > 0 {
                rejections += 1;
                if rejections > settings.depth_limit {
                    return Err(codes::ERROR_DEPTHLIMIT);
                }
                if anchored {
                    return Err(codes::ERROR_NOMATCH);
                }
                at = next_position(subject, found.groups[0] as usize, utf);
                continue;
            }
        }

        return Ok(found);
    }
}

fn collect(caps: &regex_automata::util::captures::Captures) -> Found {
    let len = caps.group_len();
    let mut groups = vec![codes::UNSET_OFFSET; len * 2];
    let mut top = 0;
    for group in 0..len {
        if let Some(span) = caps.get_group(group) {
            groups[group * 2] = span.start as i64;
            groups[group * 2 + 1] = span.end as i64;
            top = group + 1;
        }
    }
    Found { groups, top }
}

/// Looks for a non-empty alternative anchored at `at`.
fn longest_non_empty(pattern: &CompiledPattern, subject: &[u8], at: usize) -> Option<Found> {
    let longest = pattern.longest()?;
    let mut cache = longest.create_cache();
    let mut caps = longest.create_captures();
    let input = Input::new(subject)
        .span(at..subject.len())
        .anchored(Anchored::Yes);
    longest.search_captures_with(&mut cache, &input, &mut caps);

    let m = caps.get_match()?;
    if m.is_empty() {
        None
    } else {
        Some(collect(&caps))
    }
}

/// Fires the callouts of one candidate in pattern order; returns the first non-zero signal.
fn run_callouts(
    pattern: &CompiledPattern,
    callouts: &[super::compile::CalloutItem],
    entry: CalloutFn,
    data: usize,
    subject: &[u8],
    found: &Found,
) -> i32 {
    for item in callouts {
        let text = item.text.as_deref();
        let block = CalloutBlock {
            version: CALLOUT_BLOCK_VERSION,
            callout_number: item.number,
            capture_top: found.top as u32,
            capture_last: found.top.saturating_sub(1) as u32,
            offset_vector: found.groups.as_ptr(),
            offset_vector_len: found.groups.len(),
            subject: subject.as_ptr(),
            subject_length: subject.len(),
            start_match: found.groups[0] as usize,
            current_position: found.groups[1] as usize,
            pattern_position: item.position.min(pattern.source.len()),
            callout_string: text.map_or(std::ptr::null(), str::as_ptr),
            callout_string_length: text.map_or(0, str::len),
        };

        // SAFETY: installing the callout obliged the caller to keep `data` valid while it is set.
        let signal = unsafe { entry(&block, data as *mut c_void) };
        if signal != 0 {
            return signal;
        }
    }
    0
}

fn is_boundary(subject: &[u8], at: usize) -> bool {
    at == subject.len() || subject.get(at).is_some_and(|b| b & 0xC0 != 0x80)
}

/// The next candidate start after `at`, one character further in UTF mode.
fn next_position(subject: &[u8], at: usize, utf: bool) -> usize {
    let mut next = at + 1;
    if utf {
        while next < subject.len() && !is_boundary(subject, next) {
            next += 1;
        }
    }
    next
}
