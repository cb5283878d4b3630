//! Pattern compilation for the in-process engine.
//!
//! Patterns are handed to `regex-automata` after two rewriting steps: callout items are cut out
//! of the pattern text and recorded separately, and the remaining options that the syntax
//! configuration cannot express are applied as wrappers (`LITERAL` escapes the whole pattern,
//! `ENDANCHORED` appends `\z`). Error offsets reported by the parser are mapped back through both
//! steps so they always point into the pattern the caller supplied.

use std::{
    cmp::min,
    sync::{
        atomic::{AtomicBool, Ordering},
        OnceLock,
    },
};

use regex_automata::{
    meta::{self, Regex},
    util::syntax,
    MatchKind, PatternID,
};
use regex_syntax::{ast, hir};

use crate::backend::{codes, CompileStatus};

/// Every compile option bit this engine understands.
pub(super) const SUPPORTED_OPTIONS: u32 = codes::CASELESS
    | codes::MULTILINE
    | codes::DOTALL
    | codes::EXTENDED
    | codes::UTF
    | codes::UCP
    | codes::UNGREEDY
    | codes::ANCHORED
    | codes::ENDANCHORED
    | codes::LITERAL
    | codes::AUTO_CALLOUT
    | codes::USE_OFFSET_LIMIT;

/// Callout number reported for automatic callouts.
pub(super) const AUTO_CALLOUT_NUMBER: u32 = 255;

const END_ANCHOR_PREFIX: &str = "(?:";

/// Settings held by a compile context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct CompileSettings {
    pub max_pattern_length: usize,
    pub parens_nest_limit: u32,
    pub newline: u32,
}

impl Default for CompileSettings {
    fn default() -> Self {
        CompileSettings {
            max_pattern_length: usize::MAX,
            parens_nest_limit: 250,
            newline: codes::NEWLINE_LF,
        }
    }
}

/// One callout item found in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct CalloutItem {
    pub number: u32,
    pub text: Option<String>,
    /// Byte offset of the item in the original pattern
    pub position: usize,
}

/// A compiled pattern as stored in the object table.
#[derive(Debug)]
pub(super) struct CompiledPattern {
    pub regex: Regex,
    longest: OnceLock<Option<Regex>>,
    expression: String,
    pub source: Vec<u8>,
    pub options: u32,
    pub settings: CompileSettings,
    pub callouts: Vec<CalloutItem>,
    /// Group names sorted by name
    pub names: Vec<(String, u32)>,
    pub capture_count: u32,
    pub jit: AtomicBool,
}

impl Clone for CompiledPattern {
    /// Copies the pattern without its JIT state.
    fn clone(&self) -> Self {
        CompiledPattern {
            regex: self.regex.clone(),
            longest: OnceLock::new(),
            expression: self.expression.clone(),
            source: self.source.clone(),
            options: self.options,
            settings: self.settings,
            callouts: self.callouts.clone(),
            names: self.names.clone(),
            capture_count: self.capture_count,
            jit: AtomicBool::new(false),
        }
    }
}

impl CompiledPattern {
    pub fn has(&self, option: u32) -> bool {
        self.options & option != 0
    }

    pub fn is_utf(&self) -> bool {
        self.has(codes::UTF)
    }

    pub fn is_jit(&self) -> bool {
        self.jit.load(Ordering::Acquire)
    }

    pub fn set_jit(&self) {
        self.jit.store(true, Ordering::Release);
    }

    /// The same expression compiled to report the longest match at a position, built on first
    /// use.
    pub fn longest(&self) -> Option<&Regex> {
        self.longest
            .get_or_init(|| {
                Regex::builder()
                    .configure(regex_config(MatchKind::All, self.options, &self.settings))
                    .syntax(syntax_config(self.options, &self.settings))
                    .build(&self.expression)
                    .ok()
            })
            .as_ref()
    }

    /// Callout items to fire at each candidate, in pattern order.
    pub fn callouts(&self) -> Vec<CalloutItem> {
        if self.callouts.is_empty() && self.has(codes::AUTO_CALLOUT) {
            vec![CalloutItem {
                number: AUTO_CALLOUT_NUMBER,
                text: None,
                position: self.source.len(),
            }]
        } else {
            self.callouts.clone()
        }
    }

    /// Size of one name-table entry: group number, longest name, terminator.
    pub fn name_entry_size(&self) -> usize {
        self.names
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .map_or(0, |longest| 2 + longest + 1)
    }
}

/// A removed stretch of pattern text, used to map error offsets back.
#[derive(Debug, Clone, Copy)]
struct Removed {
    /// Offset in the rewritten pattern where the removal happened
    at: usize,
    len: usize,
}

fn fail(code: i32, offset: usize) -> CompileStatus {
    CompileStatus { code, offset }
}

/// Compiles `pattern` with `options` and `settings`.
pub(super) fn compile(
    pattern: &[u8],
    options: u32,
    settings: &CompileSettings,
) -> Result<CompiledPattern, CompileStatus> {
    if options & !SUPPORTED_OPTIONS != 0 {
        return Err(fail(codes::COMPILE_BAD_OPTIONS, 0));
    }
    if pattern.len() > settings.max_pattern_length {
        return Err(fail(codes::COMPILE_PATTERN_TOO_LONG, 0));
    }
    let text = std::str::from_utf8(pattern)
        .map_err(|e| fail(codes::COMPILE_PATTERN_NOT_UTF8, e.valid_up_to()))?;

    let (mut expression, callouts, removed) = if options & codes::LITERAL != 0 {
        (regex_syntax::escape(text), Vec::new(), Vec::new())
    } else {
        extract_callouts(text)?
    };

    let prefix = if options & codes::ENDANCHORED != 0 {
        expression = format!("{END_ANCHOR_PREFIX}{expression})\\z");
        END_ANCHOR_PREFIX.len()
    } else {
        0
    };

    let regex = Regex::builder()
        .configure(regex_config(MatchKind::LeftmostFirst, options, settings))
        .syntax(syntax_config(options, settings))
        .build(&expression)
        .map_err(|e| {
            let (code, offset) = map_build_error(&e);
            let offset = if options & codes::LITERAL != 0 {
                0
            } else {
                original_offset(offset.saturating_sub(prefix), &removed)
            };
            fail(code, min(offset, pattern.len()))
        })?;

    let group_info = regex.group_info();
    let capture_count = group_info.group_len(PatternID::ZERO).saturating_sub(1) as u32;
    let mut names: Vec<(String, u32)> = group_info
        .pattern_names(PatternID::ZERO)
        .enumerate()
        .filter_map(|(group, name)| name.map(|n| (n.to_string(), group as u32)))
        .collect();
    names.sort();

    Ok(CompiledPattern {
        regex,
        longest: OnceLock::new(),
        expression,
        source: pattern.to_vec(),
        options,
        settings: *settings,
        callouts,
        names,
        capture_count,
        jit: AtomicBool::new(false),
    })
}

/// Multi-line anchors follow the look matcher's terminator, not the parser's.
fn regex_config(kind: MatchKind, options: u32, settings: &CompileSettings) -> meta::Config {
    let config = Regex::config()
        .match_kind(kind)
        .utf8_empty(options & codes::UTF != 0);
    match settings.newline {
        codes::NEWLINE_CR => config.line_terminator(b'\r'),
        codes::NEWLINE_NUL => config.line_terminator(0),
        _ => config,
    }
}

fn syntax_config(options: u32, settings: &CompileSettings) -> syntax::Config {
    let has = |bit: u32| options & bit != 0;
    let utf = has(codes::UTF);

    let config = syntax::Config::new()
        .case_insensitive(has(codes::CASELESS))
        .multi_line(has(codes::MULTILINE))
        .dot_matches_new_line(has(codes::DOTALL))
        .ignore_whitespace(has(codes::EXTENDED))
        .swap_greed(has(codes::UNGREEDY))
        .unicode(utf || has(codes::UCP))
        .utf8(utf)
        .nest_limit(settings.parens_nest_limit);

    match settings.newline {
        codes::NEWLINE_CR => config.line_terminator(b'\r'),
        codes::NEWLINE_NUL => config.line_terminator(0),
        codes::NEWLINE_CRLF | codes::NEWLINE_ANYCRLF => config.crlf(true),
        _ => config,
    }
}

/// Cuts `(?C)`, `(?Cn)` and `(?C"text")` items out of `pattern`.
fn extract_callouts(
    pattern: &str,
) -> Result<(String, Vec<CalloutItem>, Vec<Removed>), CompileStatus> {
    let bytes = pattern.as_bytes();
    let mut out = String::with_capacity(pattern.len());
    let mut callouts = Vec::new();
    let mut removed = Vec::new();
    let mut copied = 0usize;
    let mut in_class = false;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'[' if !in_class => {
                in_class = true;
                // A leading `]` (after an optional `^`) is a literal.
                i += 1;
                if bytes.get(i) == Some(&b'^') {
                    i += 1;
                }
                if bytes.get(i) == Some(&b']') {
                    i += 1;
                }
                continue;
            }
            b']' if in_class => in_class = false,
            b'(' if !in_class && bytes[i..].starts_with(b"(?C") => {
                let (item, len) = parse_callout(pattern, i)?;
                out.push_str(&pattern[copied..i]);
                removed.push(Removed {
                    at: out.len(),
                    len,
                });
                callouts.push(item);
                i += len;
                copied = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    out.push_str(&pattern[copied..]);
    Ok((out, callouts, removed))
}

/// Parses one callout item starting at `start`, returning it and its length in bytes.
fn parse_callout(pattern: &str, start: usize) -> Result<(CalloutItem, usize), CompileStatus> {
    let bytes = pattern.as_bytes();
    let mut i = start + 3;

    match bytes.get(i) {
        Some(b')') => Ok((
            CalloutItem {
                number: 0,
                text: None,
                position: start,
            },
            i + 1 - start,
        )),
        Some(b'0'..=b'9') => {
            let digits_start = i;
            while matches!(bytes.get(i), Some(b'0'..=b'9')) {
                i += 1;
            }
            let number: u32 = pattern[digits_start..i]
                .parse()
                .ok()
                .filter(|n| *n <= 255)
                .ok_or_else(|| fail(codes::COMPILE_CALLOUT_NUMBER, digits_start))?;
            if bytes.get(i) != Some(&b')') {
                return Err(fail(codes::COMPILE_BAD_CALLOUT, i));
            }
            Ok((
                CalloutItem {
                    number,
                    text: None,
                    position: start,
                },
                i + 1 - start,
            ))
        }
        Some(b'"') => {
            i += 1;
            let mut text = String::new();
            loop {
                match bytes.get(i) {
                    None => return Err(fail(codes::COMPILE_BAD_CALLOUT, i)),
                    // A doubled delimiter stands for itself.
                    Some(b'"') if bytes.get(i + 1) == Some(&b'"') => {
                        text.push('"');
                        i += 2;
                    }
                    Some(b'"') => {
                        i += 1;
                        break;
                    }
                    Some(_) => {
                        let next = pattern[i..]
                            .char_indices()
                            .nth(1)
                            .map_or(pattern.len(), |(n, _)| i + n);
                        text.push_str(&pattern[i..next]);
                        i = next;
                    }
                }
            }
            if bytes.get(i) != Some(&b')') {
                return Err(fail(codes::COMPILE_BAD_CALLOUT, i));
            }
            Ok((
                CalloutItem {
                    number: 0,
                    text: Some(text),
                    position: start,
                },
                i + 1 - start,
            ))
        }
        _ => Err(fail(codes::COMPILE_BAD_CALLOUT, i)),
    }
}

/// Maps an offset in the rewritten pattern back to the original pattern.
fn original_offset(offset: usize, removed: &[Removed]) -> usize {
    offset
        + removed
            .iter()
            .take_while(|r| r.at <= offset)
            .map(|r| r.len)
            .sum::<usize>()
}

fn map_build_error(err: &meta::BuildError) -> (i32, usize) {
    if let Some(syntax) = err.syntax_error() {
        return map_syntax_error(syntax);
    }
    (codes::COMPILE_TOO_LARGE, 0)
}

fn map_syntax_error(err: &regex_syntax::Error) -> (i32, usize) {
    match err {
        regex_syntax::Error::Parse(e) => map_ast_error(e),
        regex_syntax::Error::Translate(e) => {
            let code = match e.kind() {
                hir::ErrorKind::InvalidUtf8 => codes::COMPILE_INVALID_UTF,
                hir::ErrorKind::UnicodePropertyNotFound
                | hir::ErrorKind::UnicodePropertyValueNotFound
                | hir::ErrorKind::UnicodePerlClassNotFound
                | hir::ErrorKind::UnicodeCaseUnavailable
                | hir::ErrorKind::UnicodeNotAllowed => codes::COMPILE_BAD_PROPERTY,
                _ => codes::COMPILE_BAD_OPTIONS,
            };
            (code, e.span().start.offset)
        }
        _ => (codes::COMPILE_BAD_OPTIONS, 0),
    }
}

fn map_ast_error(err: &ast::Error) -> (i32, usize) {
    let code = match err.kind() {
        ast::ErrorKind::EscapeUnexpectedEof => codes::COMPILE_ESCAPE_AT_END,
        ast::ErrorKind::EscapeUnrecognized
        | ast::ErrorKind::EscapeHexEmpty
        | ast::ErrorKind::EscapeHexInvalid
        | ast::ErrorKind::EscapeHexInvalidDigit
        | ast::ErrorKind::UnsupportedBackreference => codes::COMPILE_UNKNOWN_ESCAPE,
        ast::ErrorKind::RepetitionCountInvalid => codes::COMPILE_REPEAT_ORDER,
        ast::ErrorKind::ClassUnclosed => codes::COMPILE_UNCLOSED_CLASS,
        ast::ErrorKind::ClassEscapeInvalid => codes::COMPILE_CLASS_ESCAPE,
        ast::ErrorKind::ClassRangeInvalid | ast::ErrorKind::ClassRangeLiteral => {
            codes::COMPILE_CLASS_RANGE
        }
        ast::ErrorKind::RepetitionMissing => codes::COMPILE_NOTHING_TO_REPEAT,
        ast::ErrorKind::RepetitionCountUnclosed
        | ast::ErrorKind::RepetitionCountDecimalEmpty
        | ast::ErrorKind::DecimalEmpty
        | ast::ErrorKind::DecimalInvalid => codes::COMPILE_BAD_REPEAT,
        ast::ErrorKind::GroupUnclosed => codes::COMPILE_UNCLOSED_GROUP,
        ast::ErrorKind::GroupUnopened => codes::COMPILE_UNOPENED_GROUP,
        ast::ErrorKind::NestLimitExceeded(_) => codes::COMPILE_NEST_LIMIT,
        ast::ErrorKind::GroupNameDuplicate { .. } => codes::COMPILE_DUPLICATE_NAME,
        ast::ErrorKind::GroupNameEmpty
        | ast::ErrorKind::GroupNameInvalid
        | ast::ErrorKind::GroupNameUnexpectedEof => codes::COMPILE_NAME_EXPECTED,
        ast::ErrorKind::CaptureLimitExceeded => codes::COMPILE_TOO_MANY_GROUPS,
        ast::ErrorKind::UnicodeClassInvalid => codes::COMPILE_BAD_PROPERTY,
        _ => codes::COMPILE_BAD_GROUP,
    };

    let offset = match err.kind() {
        // Report where the closing delimiter was expected.
        ast::ErrorKind::GroupUnclosed | ast::ErrorKind::ClassUnclosed => err.pattern().len(),
        _ => err.span().start.offset,
    };
    (code, offset)
}
