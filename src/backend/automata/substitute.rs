//! Replacement-string expansion and the substitution loop.

use super::{
    compile::CompiledPattern,
    exec::{search, Found, MatchSettings},
};
use crate::backend::codes;

/// Substitute option bits handled here; everything else goes to the matcher.
const SUBSTITUTE_BITS: u32 = codes::SUBSTITUTE_GLOBAL
    | codes::SUBSTITUTE_UNSET_EMPTY
    | codes::SUBSTITUTE_UNKNOWN_UNSET
    | codes::SUBSTITUTE_OVERFLOW_LENGTH
    | codes::SUBSTITUTE_LITERAL
    | codes::SUBSTITUTE_REPLACEMENT_ONLY;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(Vec<u8>),
    Group(usize),
    Name(String),
}

/// Output of a successful substitution.
#[derive(Debug)]
pub(super) struct Substituted {
    pub output: Vec<u8>,
    pub count: usize,
    pub last: Option<Found>,
}

/// Runs a substitution, returning the full output or a negative result code.
pub(super) fn substitute(
    pattern: &CompiledPattern,
    subject: &[u8],
    start: usize,
    options: u32,
    settings: &MatchSettings,
    replacement: &[u8],
) -> Result<Substituted, i32> {
    let has = |bit: u32| options & bit != 0;
    let match_options = options & !SUBSTITUTE_BITS;

    let pieces = if has(codes::SUBSTITUTE_LITERAL) {
        vec![Piece::Text(replacement.to_vec())]
    } else {
        parse_replacement(replacement)?
    };

    if start > subject.len() {
        return Err(codes::ERROR_BADOFFSET);
    }

    let keep_subject = !has(codes::SUBSTITUTE_REPLACEMENT_ONLY);
    let mut output = Vec::with_capacity(subject.len() + replacement.len());
    if keep_subject {
        output.extend_from_slice(&subject[..start]);
    }

    let mut count = 0usize;
    let mut last_end = start;
    let mut last = None;
    let mut at = start;

    loop {
        let found = match search(pattern, subject, at, match_options, settings) {
            Ok(found) => found,
            Err(codes::ERROR_NOMATCH) => break,
            Err(code) => return Err(code),
        };

        let (s, e) = (found.groups[0] as usize, found.groups[1] as usize);
        if keep_subject {
            output.extend_from_slice(&subject[last_end..s]);
        }
        expand(&pieces, pattern, subject, &found, options, &mut output)?;
        count += 1;
        last_end = e;

        let empty = s == e;
        last = Some(found);
        if !has(codes::SUBSTITUTE_GLOBAL) {
            break;
        }
        if empty {
            if s >= subject.len() {
                break;
            }
            at = next_char(subject, s, pattern.is_utf());
        } else {
            at = e;
        }
    }

    if keep_subject {
        output.extend_from_slice(&subject[last_end..]);
    }

    Ok(Substituted {
        output,
        count,
        last,
    })
}

fn next_char(subject: &[u8], at: usize, utf: bool) -> usize {
    let mut next = at + 1;
    if utf {
        while next < subject.len() && subject[next] & 0xC0 == 0x80 {
            next += 1;
        }
    }
    next
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Splits a replacement string into literal text and group references.
fn parse_replacement(replacement: &[u8]) -> Result<Vec<Piece>, i32> {
    let mut pieces = Vec::new();
    let mut text = Vec::new();
    let mut i = 0usize;

    while i < replacement.len() {
        let b = replacement[i];
        if b != b'$' {
            text.push(b);
            i += 1;
            continue;
        }

        i += 1;
        let reference = match replacement.get(i) {
            Some(b'$') => {
                text.push(b'$');
                i += 1;
                continue;
            }
            Some(b'{') => {
                let close = replacement[i + 1..]
                    .iter()
                    .position(|&c| c == b'}')
                    .ok_or(codes::ERROR_REPMISSINGBRACE)?;
                let inner = &replacement[i + 1..i + 1 + close];
                i += close + 2;
                reference(inner)?
            }
            Some(c) if is_name_byte(*c) => {
                // A reference starting with a digit is a group number and ends at the first
                // non-digit.
                let continues: fn(u8) -> bool = if c.is_ascii_digit() {
                    |b: u8| b.is_ascii_digit()
                } else {
                    is_name_byte
                };
                let len = replacement[i..]
                    .iter()
                    .position(|&b| !continues(b))
                    .unwrap_or(replacement.len() - i);
                let inner = &replacement[i..i + len];
                i += len;
                reference(inner)?
            }
            _ => return Err(codes::ERROR_BADREPLACEMENT),
        };

        if !text.is_empty() {
            pieces.push(Piece::Text(std::mem::take(&mut text)));
        }
        pieces.push(reference);
    }

    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Ok(pieces)
}

fn reference(inner: &[u8]) -> Result<Piece, i32> {
    if inner.is_empty() || !inner.iter().all(|&b| is_name_byte(b)) {
        return Err(codes::ERROR_BADREPLACEMENT);
    }
    if inner.iter().all(u8::is_ascii_digit) {
        let number = std::str::from_utf8(inner)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(codes::ERROR_BADREPLACEMENT)?;
        return Ok(Piece::Group(number));
    }
    if inner[0].is_ascii_digit() {
        return Err(codes::ERROR_BADREPLACEMENT);
    }
    Ok(Piece::Name(String::from_utf8_lossy(inner).into_owned()))
}

fn expand(
    pieces: &[Piece],
    pattern: &CompiledPattern,
    subject: &[u8],
    found: &Found,
    options: u32,
    output: &mut Vec<u8>,
) -> Result<(), i32> {
    let unknown_unset = options & codes::SUBSTITUTE_UNKNOWN_UNSET != 0;
    let unset_empty = options & codes::SUBSTITUTE_UNSET_EMPTY != 0;

    for piece in pieces {
        let group = match piece {
            Piece::Text(text) => {
                output.extend_from_slice(text);
                continue;
            }
            Piece::Group(n) if *n <= pattern.capture_count as usize => Some(*n),
            Piece::Name(name) => pattern
                .names
                .iter()
                .find(|(candidate, _)| candidate == name)
                .map(|(_, n)| *n as usize),
            Piece::Group(_) => None,
        };

        let span = match group {
            Some(n) => {
                let (s, e) = (found.groups[n * 2], found.groups[n * 2 + 1]);
                (s != codes::UNSET_OFFSET).then_some((s as usize, e as usize))
            }
            None if unknown_unset => None,
            None => return Err(codes::ERROR_NOSUBSTRING),
        };

        match span {
            Some((s, e)) => output.extend_from_slice(&subject[s..e]),
            None if unset_empty => {}
            None => return Err(codes::ERROR_UNSET),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::automata::compile::{compile, CompileSettings};

    fn run(
        pattern: &str,
        subject: &str,
        options: u32,
        replacement: &str,
    ) -> Result<(String, usize), i32> {
        let p = compile(pattern.as_bytes(), 0, &CompileSettings::default()).unwrap();
        substitute(
            &p,
            subject.as_bytes(),
            0,
            options,
            &MatchSettings::default(),
            replacement.as_bytes(),
        )
        .map(|s| (String::from_utf8(s.output).unwrap(), s.count))
    }

    #[test]
    fn first_and_global() {
        assert_eq!(run("o", "foo boo", 0, "0"), Ok(("f0o boo".to_string(), 1)));
        assert_eq!(
            run("o", "foo boo", codes::SUBSTITUTE_GLOBAL, "0"),
            Ok(("f00 b00".to_string(), 4))
        );
        assert_eq!(run("x", "foo", codes::SUBSTITUTE_GLOBAL, "y"), Ok(("foo".to_string(), 0)));
    }

    #[test]
    fn group_references() {
        let swapped = run(r"(\w+)@(?<host>\w+)", "me@home", 0, "${host}:$1 $$");
        assert_eq!(swapped, Ok(("home:me $".to_string(), 1)));
        assert_eq!(
            run(r"(\w+)@(?<host>\w+)", "me@home", 0, "$host/$2"),
            Ok(("home/home".to_string(), 1))
        );
        assert_eq!(
            run(r"(\w+)@(?<host>\w+)", "me@home", 0, "$1x"),
            Ok(("mex".to_string(), 1))
        );
    }

    #[test]
    fn empty_matches_advance() {
        assert_eq!(
            run("a*", "baac", codes::SUBSTITUTE_GLOBAL, "-"),
            Ok(("-b--c-".to_string(), 4))
        );
    }

    #[test]
    fn replacement_errors() {
        assert_eq!(run("a", "a", 0, "$"), Err(codes::ERROR_BADREPLACEMENT));
        assert_eq!(run("a", "a", 0, "${1"), Err(codes::ERROR_REPMISSINGBRACE));
        assert_eq!(run("a", "a", 0, "$3"), Err(codes::ERROR_NOSUBSTRING));
        assert_eq!(run("a", "a", 0, "$nope"), Err(codes::ERROR_NOSUBSTRING));
        assert_eq!(run("(a)|(b)", "a", 0, "$2"), Err(codes::ERROR_UNSET));
    }

    #[test]
    fn unset_handling_options() {
        assert_eq!(
            run("(a)|(b)", "a", codes::SUBSTITUTE_UNSET_EMPTY, "[$2]"),
            Ok(("[]".to_string(), 1))
        );
        assert_eq!(
            run(
                "a",
                "a",
                codes::SUBSTITUTE_UNKNOWN_UNSET | codes::SUBSTITUTE_UNSET_EMPTY,
                "[$9]"
            ),
            Ok(("[]".to_string(), 1))
        );
    }

    #[test]
    fn literal_and_replacement_only() {
        assert_eq!(
            run("b", "abc", codes::SUBSTITUTE_LITERAL, "$1"),
            Ok(("a$1c".to_string(), 1))
        );
        assert_eq!(
            run(
                r"\d",
                "a1b2",
                codes::SUBSTITUTE_GLOBAL | codes::SUBSTITUTE_REPLACEMENT_ONLY,
                "<$0>"
            ),
            Ok(("<1><2>".to_string(), 2))
        );
    }
}
