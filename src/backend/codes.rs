//! Native result codes, option bits and message texts.
//!
//! These values are part of the bit-exact boundary with the native engine. Result codes follow
//! one convention everywhere: `0` is success, a positive value is a count or size, and a
//! negative value is an error. Compile errors are reported separately as positive codes of
//! `100` and above together with a pattern offset.
//!
//! The option constants are opaque to the safe layer; they are only named here so that the
//! bitflags types in [`crate::options`] and the in-process engine agree on them.

/// Unset offset marker written into the output vector for groups that did not participate.
pub const UNSET_OFFSET: i64 = -1;

/// Marker reported through `out_len` when no required size is known.
pub const UNSET_LENGTH: usize = usize::MAX;

// Match and runtime errors
/// The subject did not match
pub const ERROR_NOMATCH: i32 = -1;
/// A partial match was found
pub const ERROR_PARTIAL: i32 = -2;
/// First of the UTF-8 validity errors
pub const ERROR_UTF8_ERR1: i32 = -3;
/// Last of the UTF-8 validity errors
pub const ERROR_UTF8_ERR21: i32 = -23;
/// A value passed to the engine is out of range, or a handle is unknown
pub const ERROR_BADDATA: i32 = -29;
/// A handle refers to an object of the wrong type
pub const ERROR_BADMAGIC: i32 = -31;
/// Serialized data was produced by an incompatible engine build
pub const ERROR_BADMODE: i32 = -32;
/// Start offset past the end of the subject
pub const ERROR_BADOFFSET: i32 = -33;
/// Unsupported option bits
pub const ERROR_BADOPTION: i32 = -34;
/// Malformed replacement string
pub const ERROR_BADREPLACEMENT: i32 = -35;
/// Start offset not on a character boundary
pub const ERROR_BADUTFOFFSET: i32 = -36;
/// A callout failed
pub const ERROR_CALLOUT: i32 = -37;
/// Internal engine inconsistency
pub const ERROR_INTERNAL: i32 = -44;
/// Option not supported for JIT compilation
pub const ERROR_JIT_BADOPTION: i32 = -45;
/// JIT stack exhausted
pub const ERROR_JIT_STACKLIMIT: i32 = -46;
/// Match step limit exceeded
pub const ERROR_MATCHLIMIT: i32 = -47;
/// Output buffer too small; the reserved code driving the growable probe
pub const ERROR_NOMEMORY: i32 = -48;
/// Referenced group does not exist
pub const ERROR_NOSUBSTRING: i32 = -49;
/// Group name is not unique
pub const ERROR_NOUNIQUESUBSTRING: i32 = -50;
/// Null argument
pub const ERROR_NULL: i32 = -51;
/// Depth limit exceeded
pub const ERROR_DEPTHLIMIT: i32 = -53;
/// Requested information not available
pub const ERROR_UNAVAILABLE: i32 = -54;
/// Referenced group is unset
pub const ERROR_UNSET: i32 = -55;
/// Offset limit used without the compile-time opt-in
pub const ERROR_BADOFFSETLIMIT: i32 = -56;
/// Missing closing brace in a replacement group reference
pub const ERROR_REPMISSINGBRACE: i32 = -58;
/// Corrupt or truncated serialized data
pub const ERROR_BADSERIALIZEDDATA: i32 = -62;
/// Heap limit exceeded
pub const ERROR_HEAPLIMIT: i32 = -63;

// Compile errors
/// `\` at end of pattern
pub const COMPILE_ESCAPE_AT_END: i32 = 101;
/// Unrecognized character follows `\`
pub const COMPILE_UNKNOWN_ESCAPE: i32 = 103;
/// Numbers out of order in `{}` quantifier
pub const COMPILE_REPEAT_ORDER: i32 = 104;
/// Missing terminating `]` for character class
pub const COMPILE_UNCLOSED_CLASS: i32 = 106;
/// Invalid escape sequence in character class
pub const COMPILE_CLASS_ESCAPE: i32 = 107;
/// Range out of order in character class
pub const COMPILE_CLASS_RANGE: i32 = 108;
/// Quantifier does not follow a repeatable item
pub const COMPILE_NOTHING_TO_REPEAT: i32 = 109;
/// Malformed quantifier
pub const COMPILE_BAD_REPEAT: i32 = 110;
/// Missing closing parenthesis
pub const COMPILE_UNCLOSED_GROUP: i32 = 114;
/// Unsupported or invalid option bits
pub const COMPILE_BAD_OPTIONS: i32 = 117;
/// Parentheses are too deeply nested
pub const COMPILE_NEST_LIMIT: i32 = 119;
/// Regular expression is too large
pub const COMPILE_TOO_LARGE: i32 = 120;
/// Unmatched closing parenthesis
pub const COMPILE_UNOPENED_GROUP: i32 = 122;
/// Unsupported group or flag syntax
pub const COMPILE_BAD_GROUP: i32 = 124;
/// Unknown Unicode property or class
pub const COMPILE_BAD_PROPERTY: i32 = 147;
/// Two named groups share a name
pub const COMPILE_DUPLICATE_NAME: i32 = 143;
/// Too many capturing groups
pub const COMPILE_TOO_MANY_GROUPS: i32 = 149;
/// Group name expected
pub const COMPILE_NAME_EXPECTED: i32 = 162;
/// Pattern can match invalid UTF-8
pub const COMPILE_INVALID_UTF: i32 = 174;
/// Callout number too large
pub const COMPILE_CALLOUT_NUMBER: i32 = 138;
/// Malformed callout
pub const COMPILE_BAD_CALLOUT: i32 = 181;
/// Pattern longer than the configured limit
pub const COMPILE_PATTERN_TOO_LONG: i32 = 188;
/// Pattern is not valid UTF-8
pub const COMPILE_PATTERN_NOT_UTF8: i32 = 190;

// Compile options
/// Case-insensitive matching
pub const CASELESS: u32 = 0x0000_0008;
/// `^`/`$` match at line boundaries
pub const MULTILINE: u32 = 0x0000_0400;
/// `.` matches newlines
pub const DOTALL: u32 = 0x0000_0020;
/// Ignore whitespace and `#` comments in the pattern
pub const EXTENDED: u32 = 0x0000_0080;
/// Treat pattern and subject as UTF-8
pub const UTF: u32 = 0x0008_0000;
/// Unicode character properties for `\w`, `\d`, `\s` and friends
pub const UCP: u32 = 0x0002_0000;
/// Invert greediness of quantifiers
pub const UNGREEDY: u32 = 0x0004_0000;
/// Anchor at the start offset (compile and match option)
pub const ANCHORED: u32 = 0x8000_0000;
/// Anchor at the end of the subject
pub const ENDANCHORED: u32 = 0x2000_0000;
/// Pattern is a literal string
pub const LITERAL: u32 = 0x0200_0000;
/// Fire callout 255 at every candidate match
pub const AUTO_CALLOUT: u32 = 0x0000_0004;
/// Allow an offset limit in the match context
pub const USE_OFFSET_LIMIT: u32 = 0x0080_0000;

// Match options
/// The empty string is not a valid match
pub const NOTEMPTY: u32 = 0x0000_0004;
/// An empty match at the start offset is not valid
pub const NOTEMPTY_ATSTART: u32 = 0x0000_0008;
/// Partial matching, soft
pub const PARTIAL_SOFT: u32 = 0x0000_0010;
/// Partial matching, hard
pub const PARTIAL_HARD: u32 = 0x0000_0020;
/// Do not use the JIT path
pub const NO_JIT: u32 = 0x0000_2000;

// JIT options
/// Compile for complete matching
pub const JIT_COMPLETE: u32 = 0x0000_0001;
/// Compile for soft partial matching
pub const JIT_PARTIAL_SOFT: u32 = 0x0000_0002;
/// Compile for hard partial matching
pub const JIT_PARTIAL_HARD: u32 = 0x0000_0004;

// Substitute options
/// Replace every match
pub const SUBSTITUTE_GLOBAL: u32 = 0x0000_0100;
/// Unset groups expand to the empty string
pub const SUBSTITUTE_UNSET_EMPTY: u32 = 0x0000_0400;
/// Unknown groups are treated as unset
pub const SUBSTITUTE_UNKNOWN_UNSET: u32 = 0x0000_0800;
/// Report the required size when the output does not fit
pub const SUBSTITUTE_OVERFLOW_LENGTH: u32 = 0x0000_1000;
/// The replacement is inserted verbatim
pub const SUBSTITUTE_LITERAL: u32 = 0x0000_8000;
/// Only the replacements are written to the output
pub const SUBSTITUTE_REPLACEMENT_ONLY: u32 = 0x0002_0000;

// Newline conventions
/// Carriage return
pub const NEWLINE_CR: u32 = 1;
/// Line feed
pub const NEWLINE_LF: u32 = 2;
/// Carriage return followed by line feed
pub const NEWLINE_CRLF: u32 = 3;
/// Any Unicode line ending
pub const NEWLINE_ANY: u32 = 4;
/// Any of CR, LF or CRLF
pub const NEWLINE_ANYCRLF: u32 = 5;
/// NUL character
pub const NEWLINE_NUL: u32 = 6;

/// Returns the engine's message for a result or compile code.
#[must_use]
pub fn message(code: i32) -> Option<&'static str> {
    let text = match code {
        ERROR_NOMATCH => "no match",
        ERROR_PARTIAL => "partial match",
        ERROR_UTF8_ERR21..=ERROR_UTF8_ERR1 => "UTF-8 error: subject is not a valid UTF-8 string",
        ERROR_BADDATA => "bad data value",
        ERROR_BADMAGIC => "handle does not refer to an object of the expected type",
        ERROR_BADMODE => "serialized data was produced by an incompatible engine build",
        ERROR_BADOFFSET => "bad offset value",
        ERROR_BADOPTION => "bad option value",
        ERROR_BADREPLACEMENT => "invalid replacement string",
        ERROR_BADUTFOFFSET => "start offset in a UTF subject is not at a character boundary",
        ERROR_CALLOUT => "callout error code",
        ERROR_INTERNAL => "internal error - pattern overwritten?",
        ERROR_JIT_BADOPTION => "bad JIT option",
        ERROR_JIT_STACKLIMIT => "JIT stack limit reached",
        ERROR_MATCHLIMIT => "match limit exceeded",
        ERROR_NOMEMORY => "no more memory",
        ERROR_NOSUBSTRING => "unknown substring",
        ERROR_NOUNIQUESUBSTRING => "non-unique substring name",
        ERROR_NULL => "NULL argument passed with non-zero length",
        ERROR_DEPTHLIMIT => "nested recursion at the same subject position",
        ERROR_UNAVAILABLE => "requested value is not available",
        ERROR_UNSET => "requested value is not set",
        ERROR_BADOFFSETLIMIT => "offset limit set without the compile-time offset limit option",
        ERROR_REPMISSINGBRACE => "expected closing curly bracket in replacement string",
        ERROR_BADSERIALIZEDDATA => "bad serialized data",
        ERROR_HEAPLIMIT => "heap limit exceeded",
        COMPILE_ESCAPE_AT_END => "\\ at end of pattern",
        COMPILE_UNKNOWN_ESCAPE => "unrecognized character follows \\",
        COMPILE_REPEAT_ORDER => "numbers out of order in {} quantifier",
        COMPILE_UNCLOSED_CLASS => "missing terminating ] for character class",
        COMPILE_CLASS_ESCAPE => "escape sequence is invalid in character class",
        COMPILE_CLASS_RANGE => "range out of order in character class",
        COMPILE_NOTHING_TO_REPEAT => "quantifier does not follow a repeatable item",
        COMPILE_BAD_REPEAT => "malformed quantifier",
        COMPILE_UNCLOSED_GROUP => "missing closing parenthesis",
        COMPILE_BAD_OPTIONS => "unsupported or invalid compile option bits",
        COMPILE_NEST_LIMIT => "parentheses are too deeply nested",
        COMPILE_TOO_LARGE => "regular expression is too large",
        COMPILE_UNOPENED_GROUP => "unmatched closing parenthesis",
        COMPILE_BAD_GROUP => "unrecognized character after (? or (?-",
        COMPILE_CALLOUT_NUMBER => "number after (?C is greater than 255",
        COMPILE_DUPLICATE_NAME => "two named subpatterns have the same name",
        COMPILE_BAD_PROPERTY => "unknown property after \\P or \\p",
        COMPILE_TOO_MANY_GROUPS => "too many capturing groups",
        COMPILE_NAME_EXPECTED => "subpattern name expected",
        COMPILE_INVALID_UTF => "pattern can match invalid UTF-8 in UTF mode",
        COMPILE_BAD_CALLOUT => "syntax error in (?C argument: closing delimiter or ) expected",
        COMPILE_PATTERN_TOO_LONG => {
            "pattern string is longer than the limit set by the application"
        }
        COMPILE_PATTERN_NOT_UTF8 => "pattern is not a valid UTF-8 string",
        _ => return None,
    };
    Some(text)
}
