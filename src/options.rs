//! Option bitmasks passed through to the native engine.
//!
//! Each operation family gets its own flag type so a compile option cannot be handed to a match
//! call by accident. The named constants cover the bits the bundled engine understands; any
//! other bit survives [`bitflags`]' `from_bits_retain` and reaches the engine untouched, which
//! stays the authority on what it accepts.

use bitflags::bitflags;

use crate::backend::codes;

bitflags! {
    /// Options for [`crate::Code::compile`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CompileOptions: u32 {
        /// Case-insensitive matching
        const CASELESS = codes::CASELESS;
        /// `^` and `$` match at internal line boundaries
        const MULTILINE = codes::MULTILINE;
        /// `.` matches newline characters
        const DOTALL = codes::DOTALL;
        /// Whitespace and `#` comments in the pattern are ignored
        const EXTENDED = codes::EXTENDED;
        /// Pattern and subject are handled as UTF-8 code points
        const UTF = codes::UTF;
        /// `\w`, `\d`, `\s` and POSIX classes use Unicode properties
        const UCP = codes::UCP;
        /// Quantifiers are lazy by default
        const UNGREEDY = codes::UNGREEDY;
        /// The match must start at the start offset
        const ANCHORED = codes::ANCHORED;
        /// The match must end at the end of the subject
        const ENDANCHORED = codes::ENDANCHORED;
        /// The whole pattern is a literal string
        const LITERAL = codes::LITERAL;
        /// A callout numbered 255 fires at every candidate match
        const AUTO_CALLOUT = codes::AUTO_CALLOUT;
        /// Match contexts may limit how far a match may start
        const USE_OFFSET_LIMIT = codes::USE_OFFSET_LIMIT;

        const _ = !0;
    }
}

bitflags! {
    /// Options for matching calls
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MatchOptions: u32 {
        /// The match must start at the start offset
        const ANCHORED = codes::ANCHORED;
        /// An empty string is not a valid match
        const NOTEMPTY = codes::NOTEMPTY;
        /// An empty string at the start offset is not a valid match
        const NOTEMPTY_ATSTART = codes::NOTEMPTY_ATSTART;
        /// Soft partial matching
        const PARTIAL_SOFT = codes::PARTIAL_SOFT;
        /// Hard partial matching
        const PARTIAL_HARD = codes::PARTIAL_HARD;
        /// Skip the JIT-compiled code
        const NO_JIT = codes::NO_JIT;

        const _ = !0;
    }
}

bitflags! {
    /// Options for [`crate::Code::jit_compile`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct JitOptions: u32 {
        /// Compile code for complete matches
        const COMPLETE = codes::JIT_COMPLETE;
        /// Compile code for soft partial matches
        const PARTIAL_SOFT = codes::JIT_PARTIAL_SOFT;
        /// Compile code for hard partial matches
        const PARTIAL_HARD = codes::JIT_PARTIAL_HARD;

        const _ = !0;
    }
}

bitflags! {
    /// Options for [`crate::Code::substitute`]
    ///
    /// The binding always adds `SUBSTITUTE_OVERFLOW_LENGTH` itself so the engine reports the
    /// exact output size it needs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SubstituteOptions: u32 {
        /// Replace every match, not only the first
        const GLOBAL = codes::SUBSTITUTE_GLOBAL;
        /// Unset groups expand to the empty string instead of failing
        const UNSET_EMPTY = codes::SUBSTITUTE_UNSET_EMPTY;
        /// References to unknown groups are treated as unset groups
        const UNKNOWN_UNSET = codes::SUBSTITUTE_UNKNOWN_UNSET;
        /// The replacement is inserted verbatim, without `$` processing
        const LITERAL = codes::SUBSTITUTE_LITERAL;
        /// Only the replacement text is returned, not the untouched parts of the subject
        const REPLACEMENT_ONLY = codes::SUBSTITUTE_REPLACEMENT_ONLY;
        /// Anchor each match at its start position
        const ANCHORED = codes::ANCHORED;
        /// An empty string is not a valid match
        const NOTEMPTY = codes::NOTEMPTY;
        /// An empty string at the start offset is not a valid match
        const NOTEMPTY_ATSTART = codes::NOTEMPTY_ATSTART;

        const _ = !0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_are_retained() {
        let raw = codes::CASELESS | 0x0100_0000;
        let opts = CompileOptions::from_bits_retain(raw);
        assert!(opts.contains(CompileOptions::CASELESS));
        assert_eq!(opts.bits(), raw);
    }

    #[test]
    fn substitute_and_match_bits_line_up() {
        assert_eq!(SubstituteOptions::ANCHORED.bits(), MatchOptions::ANCHORED.bits());
        assert_eq!(SubstituteOptions::NOTEMPTY.bits(), MatchOptions::NOTEMPTY.bits());
        let global = MatchOptions::from_bits_retain(SubstituteOptions::GLOBAL.bits());
        assert!(!global.intersects(
            MatchOptions::ANCHORED | MatchOptions::NOTEMPTY | MatchOptions::NOTEMPTY_ATSTART
        ));
    }
}
