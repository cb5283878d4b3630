//! Resource-ceiling configuration for compiling and matching.
//!
//! The native engine cannot be interrupted once a call has started. The only protection against
//! runaway patterns is a set of ceilings handed to the engine beforehand, which it enforces and
//! reports as ordinary error results. This module groups those ceilings.
//!
//! - [`MatchLimits`] - applied to a [`crate::MatchContext`]
//! - [`CompileLimits`] - applied to a [`crate::CompileContext`]
//!
//! # Example
//!
//! ```rust
//! use nativeregex::config::MatchLimits;
//!
//! let limits = MatchLimits::new()
//!     .with_match_limit(100_000)
//!     .with_offset_limit(Some(64));
//! assert_eq!(limits.match_limit, 100_000);
//! ```

use strum::{Display, EnumIter};

use crate::backend::codes;

/// Ceilings enforced by the engine during a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchLimits {
    /// Maximum matching work, in the engine's step units
    pub match_limit: u32,

    /// Maximum backtracking depth
    pub depth_limit: u32,

    /// Maximum heap memory for one match, in KiB
    pub heap_limit_kib: u32,

    /// Latest byte offset at which a match may start; requires
    /// [`crate::CompileOptions::USE_OFFSET_LIMIT`] on the pattern
    pub offset_limit: Option<usize>,
}

impl Default for MatchLimits {
    /// The engine's built-in defaults.
    fn default() -> Self {
        Self {
            match_limit: 10_000_000,
            depth_limit: 10_000_000,
            heap_limit_kib: 20_000_000,
            offset_limit: None,
        }
    }
}

impl MatchLimits {
    /// Creates limits with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight ceilings for matching untrusted patterns against untrusted input.
    pub fn strict() -> Self {
        Self {
            match_limit: 1_000_000,
            depth_limit: 1_000,
            heap_limit_kib: 16 * 1024,
            offset_limit: None,
        }
    }

    /// Sets the match step limit.
    pub fn with_match_limit(mut self, limit: u32) -> Self {
        self.match_limit = limit;
        self
    }

    /// Sets the depth limit.
    pub fn with_depth_limit(mut self, limit: u32) -> Self {
        self.depth_limit = limit;
        self
    }

    /// Sets the heap limit in KiB.
    pub fn with_heap_limit_kib(mut self, limit: u32) -> Self {
        self.heap_limit_kib = limit;
        self
    }

    /// Sets or clears the offset limit.
    pub fn with_offset_limit(mut self, limit: Option<usize>) -> Self {
        self.offset_limit = limit;
        self
    }
}

/// Newline convention used by `^`, `$` and `.`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter)]
pub enum Newline {
    /// Carriage return only
    Cr,
    /// Line feed only
    Lf,
    /// Carriage return followed by line feed
    CrLf,
    /// Any Unicode line ending; the bundled engine rejects it
    Any,
    /// Any of CR, LF or CRLF
    AnyCrLf,
    /// The NUL character
    Nul,
}

impl Newline {
    /// The native code for this convention.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Newline::Cr => codes::NEWLINE_CR,
            Newline::Lf => codes::NEWLINE_LF,
            Newline::CrLf => codes::NEWLINE_CRLF,
            Newline::Any => codes::NEWLINE_ANY,
            Newline::AnyCrLf => codes::NEWLINE_ANYCRLF,
            Newline::Nul => codes::NEWLINE_NUL,
        }
    }
}

/// Ceilings and conventions enforced by the engine while compiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileLimits {
    /// Longest accepted pattern, in UTF-8 bytes
    pub max_pattern_length: usize,

    /// Deepest accepted parenthesis nesting
    pub parens_nest_limit: u32,

    /// Newline convention
    pub newline: Newline,
}

impl Default for CompileLimits {
    fn default() -> Self {
        Self {
            max_pattern_length: usize::MAX,
            parens_nest_limit: 250,
            newline: Newline::Lf,
        }
    }
}

impl CompileLimits {
    /// Creates limits with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum pattern length.
    pub fn with_max_pattern_length(mut self, length: usize) -> Self {
        self.max_pattern_length = length;
        self
    }

    /// Sets the parenthesis nesting limit.
    pub fn with_parens_nest_limit(mut self, limit: u32) -> Self {
        self.parens_nest_limit = limit;
        self
    }

    /// Sets the newline convention.
    pub fn with_newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }
}
