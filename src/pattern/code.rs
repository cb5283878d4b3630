use std::{ops::Range, sync::Arc};

use rayon::prelude::*;
use widestring::{U16Str, U16String};

use crate::{
    backend::{codes, CompileStatus, PatternInfo},
    error::check,
    pattern::{ensure_same_backend, error_message, Captures, CompileContext, MatchContext},
    probe::{probe_bytes, Growth, Probe},
    resource::{CodeKind, NativeResource},
    Backend, CompileOptions, Error, Handle, JitOptions, MatchData, MatchOptions, NativeError,
    Result, Subject, SubstituteOptions,
};

/// One entry of a pattern's name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    /// Group name
    pub name: String,
    /// Group number the name refers to
    pub group: u32,
}

/// Result of [`Code::substitute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// The resulting string
    pub text: U16String,
    /// Number of replacements performed
    pub replacements: usize,
}

/// A compiled regular expression.
///
/// `Code` is immutable once compiled and may be shared between threads; each thread matching
/// with it needs its own [`MatchData`] and, if used, its own [`MatchContext`].
///
/// # Examples
///
/// ```rust
/// use nativeregex::{backend::default_backend, Code, CompileOptions, MatchData};
/// use widestring::u16str;
///
/// let backend = default_backend();
/// let code = Code::compile(
///     &backend,
///     u16str!(r"(\w+)@(\w+\.\w+)"),
///     CompileOptions::empty(),
///     None,
/// )?;
/// let mut match_data = MatchData::from_code(&code)?;
///
/// let subject = u16str!("user@example.com");
/// let caps = code
///     .captures(subject, 0, Default::default(), &mut match_data, None)?
///     .expect("matches");
/// assert_eq!(caps.get(2), Some(5..16));
/// # Ok::<(), nativeregex::Error>(())
/// ```
#[derive(Debug)]
pub struct Code {
    resource: NativeResource<CodeKind>,
    capture_count: u32,
}

impl Code {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the pattern holds an unpaired surrogate or `context`
    ///   belongs to another backend
    /// - [`Error::Released`] if `context` was disposed
    /// - [`Error::Compile`] if the engine rejects the pattern
    /// - [`Error::Allocation`] if the engine failed without a compile error
    pub fn compile(
        backend: &Arc<dyn Backend>,
        pattern: &U16Str,
        options: CompileOptions,
        context: Option<&CompileContext>,
    ) -> Result<Self> {
        let utf8 = String::from_utf16(pattern.as_slice())
            .map_err(|_| invalid_argument!("pattern contains an unpaired surrogate"))?;
        let ccontext = match context {
            Some(context) => {
                ensure_same_backend(backend, context.backend(), "compile context")?;
                context.handle()?
            }
            None => Handle::NULL,
        };

        let mut status = CompileStatus::default();
        let resource = NativeResource::create(backend, |b| {
            b.compile(utf8.as_bytes(), options.bits(), ccontext, &mut status)
        });

        match resource {
            Ok(resource) => Code::from_resource(resource),
            Err(Error::Allocation(_)) if status.code > 0 => {
                let message = error_message(backend, status.code)
                    .unwrap_or_else(|_| format!("compile error {}", status.code));
                Err(Error::Compile {
                    code: status.code,
                    offset: status.offset,
                    message,
                })
            }
            Err(error) => Err(error),
        }
    }

    pub(crate) fn from_resource(resource: NativeResource<CodeKind>) -> Result<Self> {
        let count = pattern_info(
            resource.backend().as_ref(),
            resource.handle()?,
            PatternInfo::CaptureCount,
        )?;
        let capture_count = u32::try_from(count)
            .map_err(|_| Error::Internal(format!("capture count {count} out of range")))?;
        Ok(Code {
            resource,
            capture_count,
        })
    }

    /// Number of capturing groups, not counting the overall match.
    pub fn capture_count(&self) -> u32 {
        self.capture_count
    }

    /// Number of named groups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Released`] after disposal or [`Error::Native`].
    pub fn name_count(&self) -> Result<u32> {
        self.info(PatternInfo::NameCount).map(|count| count as u32)
    }

    /// Approximate size of the compiled pattern in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Released`] after disposal or [`Error::Native`].
    pub fn size(&self) -> Result<usize> {
        self.info(PatternInfo::Size).map(|size| size as usize)
    }

    /// The compile options the pattern was built with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Released`] after disposal or [`Error::Native`].
    pub fn options(&self) -> Result<CompileOptions> {
        self.info(PatternInfo::ArgOptions)
            .map(|bits| CompileOptions::from_bits_retain(bits as u32))
    }

    /// The named groups, in the engine's order.
    ///
    /// # Errors
    ///
    /// - [`Error::Released`] after disposal
    /// - [`Error::Native`] if the engine fails
    /// - [`Error::Internal`] if the table is malformed
    pub fn name_table(&self) -> Result<Vec<NameEntry>> {
        let handle = self.handle()?;
        let count = self.info(PatternInfo::NameCount)? as usize;
        if count == 0 {
            return Ok(Vec::new());
        }
        let entry_size = self.info(PatternInfo::NameEntrySize)? as usize;
        if entry_size < 3 {
            return Err(Error::Internal(format!(
                "name table entry size {entry_size} is too small"
            )));
        }

        let expected = count * entry_size;
        let backend = self.backend();
        let raw = probe_bytes(expected, Growth::Reported, |buffer| {
            match backend.name_table(handle, buffer) {
                codes::ERROR_NOMEMORY => Probe::Insufficient {
                    required: Some(expected),
                },
                rc if rc < 0 => Probe::Failed(rc),
                rc => Probe::Complete(rc as usize),
            }
        })?;

        parse_name_table(&raw, entry_size)
    }

    /// Group number of the named group `name`, or `None` if there is no such group.
    ///
    /// # Errors
    ///
    /// See [`Code::name_table`].
    pub fn group_number(&self, name: &str) -> Result<Option<u32>> {
        Ok(self
            .name_table()?
            .into_iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.group))
    }

    /// JIT compiles the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Released`] after disposal or [`Error::Native`] if the engine refuses
    /// the options.
    pub fn jit_compile(&self, options: JitOptions) -> Result<()> {
        let handle = self.handle()?;
        check(self.backend().jit_compile(handle, options.bits())).map(drop)
    }

    /// Size of the JIT-compiled code, `0` if the pattern was not JIT compiled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Released`] after disposal or [`Error::Native`].
    pub fn jit_size(&self) -> Result<usize> {
        self.info(PatternInfo::JitSize).map(|size| size as usize)
    }

    /// Creates an independent native copy of the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Released`] after disposal or [`Error::Allocation`].
    pub fn try_clone(&self) -> Result<Self> {
        let handle = self.handle()?;
        let resource = NativeResource::create(self.backend(), |b| b.code_copy(handle))?;
        Ok(Code {
            resource,
            capture_count: self.capture_count,
        })
    }

    /// Matches `subject` starting at UTF-16 index `start_index`.
    ///
    /// Returns `None` if there is no match. The translated indices of the returned
    /// [`Captures`] refer to `subject`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a subject with unpaired surrogates, a start index past
    ///   the end or inside a surrogate pair, or resources from another backend
    /// - [`Error::Released`] if any resource involved was disposed
    /// - [`Error::Native`] for every engine failure except "no match"
    pub fn captures(
        &self,
        subject: &U16Str,
        start_index: usize,
        options: MatchOptions,
        match_data: &mut MatchData,
        context: Option<&MatchContext>,
    ) -> Result<Option<Captures>> {
        let subject = Subject::new(subject)?;
        let start = subject.byte_offset(start_index)?;
        self.execute(&subject, start, options, match_data, context)
    }

    /// Matches a prepared subject, see [`Code::captures`].
    ///
    /// # Errors
    ///
    /// See [`Code::captures`].
    pub fn captures_in(
        &self,
        subject: &Subject<'_>,
        start_index: usize,
        options: MatchOptions,
        match_data: &mut MatchData,
        context: Option<&MatchContext>,
    ) -> Result<Option<Captures>> {
        let start = subject.byte_offset(start_index)?;
        self.execute(subject, start, options, match_data, context)
    }

    /// UTF-16 range of the first match in `subject`.
    ///
    /// # Errors
    ///
    /// See [`Code::captures`].
    pub fn find(&self, subject: &U16Str) -> Result<Option<Range<usize>>> {
        let mut match_data = MatchData::from_code(self)?;
        let found = self.captures(subject, 0, MatchOptions::empty(), &mut match_data, None)?;
        Ok(found.and_then(|caps| caps.get(0)))
    }

    /// Returns `true` if `subject` contains a match.
    ///
    /// # Errors
    ///
    /// See [`Code::captures`].
    pub fn is_match(&self, subject: &U16Str) -> Result<bool> {
        self.find(subject).map(|found| found.is_some())
    }

    /// Iterates over successive non-overlapping matches in `subject`.
    ///
    /// After an empty match the next search starts one character later, so a surrogate pair is
    /// never split.
    ///
    /// # Errors
    ///
    /// Fails up front if the subject holds an unpaired surrogate or match data cannot be
    /// allocated. Errors during iteration are yielded once and end the iteration.
    pub fn find_all<'c, 's>(&'c self, subject: &'s U16Str) -> Result<Matches<'c, 's>> {
        Ok(Matches {
            code: self,
            subject: Subject::new(subject)?,
            match_data: MatchData::from_code(self)?,
            next: Some(0),
        })
    }

    /// Finds the first match in each of `subjects` in parallel.
    ///
    /// Each worker thread allocates its own match data.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; see [`Code::captures`].
    pub fn par_find(&self, subjects: &[&U16Str]) -> Result<Vec<Option<Range<usize>>>> {
        self.handle()?;
        subjects
            .par_iter()
            .map_init(
                || MatchData::from_code(self),
                |match_data, subject| -> Result<Option<Range<usize>>> {
                    let Ok(match_data) = match_data else {
                        return Err(Error::Allocation("match data"));
                    };
                    let found =
                        self.captures(subject, 0, MatchOptions::empty(), match_data, None)?;
                    Ok(found.and_then(|caps| caps.get(0)))
                },
            )
            .collect()
    }

    /// Replaces matches in `subject` with `replacement`, starting at UTF-16 index
    /// `start_index`.
    ///
    /// The output size is probed. The first attempt gets room for twice the subject plus one
    /// replacement; if that is too small the call is retried once with the size the engine
    /// reports. A retry runs the whole substitution again, so callouts installed on `context`
    /// fire again for every match.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for unpaired surrogates, a bad start index or resources
    ///   from another backend
    /// - [`Error::Released`] if any resource involved was disposed
    /// - [`Error::Native`] for engine failures, including malformed replacements
    /// - [`Error::Internal`] if the engine still reports a shortage after the retry
    pub fn substitute(
        &self,
        subject: &U16Str,
        start_index: usize,
        options: SubstituteOptions,
        replacement: &U16Str,
        match_data: Option<&mut MatchData>,
        context: Option<&MatchContext>,
    ) -> Result<Substitution> {
        let subject = Subject::new(subject)?;
        let replacement = String::from_utf16(replacement.as_slice())
            .map_err(|_| invalid_argument!("replacement contains an unpaired surrogate"))?;
        let start = subject.byte_offset(start_index)?;

        let code = self.handle()?;
        let md = match match_data {
            Some(match_data) => {
                ensure_same_backend(self.backend(), match_data.backend(), "match data")?;
                match_data.handle()?
            }
            None => Handle::NULL,
        };
        let mctx = self.context_handle(context)?;

        let flags = options.bits() | codes::SUBSTITUTE_OVERFLOW_LENGTH;
        let backend = self.backend();
        let mut replacements = 0usize;
        let initial = 2 * subject.as_bytes().len() + replacement.len() + 1;
        let output = probe_bytes(initial, Growth::Reported, |buffer| {
            let mut out_len = codes::UNSET_LENGTH;
            let rc = backend.substitute(
                code,
                subject.as_bytes(),
                start,
                flags,
                md,
                mctx,
                replacement.as_bytes(),
                buffer,
                &mut out_len,
            );
            match rc {
                codes::ERROR_NOMEMORY => Probe::Insufficient {
                    required: (out_len != codes::UNSET_LENGTH).then_some(out_len),
                },
                rc if rc < 0 => Probe::Failed(rc),
                rc => {
                    replacements = rc as usize;
                    Probe::Complete(out_len)
                }
            }
        })?;

        let text = String::from_utf8(output)
            .map_err(|_| Error::Internal("substitution result is not valid UTF-8".to_string()))?;
        Ok(Substitution {
            text: U16String::from_str(&text),
            replacements,
        })
    }

    /// The native handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Released`] after disposal.
    pub fn handle(&self) -> Result<Handle> {
        self.resource.handle()
    }

    /// The backend owning the pattern.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        self.resource.backend()
    }

    /// Releases the pattern now. Match data created from it stays usable.
    pub fn dispose(&self) {
        self.resource.dispose();
    }

    /// Returns `true` once released.
    pub fn is_released(&self) -> bool {
        self.resource.is_released()
    }

    fn info(&self, what: PatternInfo) -> Result<i64> {
        pattern_info(self.backend().as_ref(), self.handle()?, what)
    }

    fn context_handle(&self, context: Option<&MatchContext>) -> Result<Handle> {
        match context {
            Some(context) => {
                ensure_same_backend(self.backend(), context.backend(), "match context")?;
                context.handle()
            }
            None => Ok(Handle::NULL),
        }
    }

    fn execute(
        &self,
        subject: &Subject<'_>,
        start: usize,
        options: MatchOptions,
        match_data: &MatchData,
        context: Option<&MatchContext>,
    ) -> Result<Option<Captures>> {
        let code = self.handle()?;
        ensure_same_backend(self.backend(), match_data.backend(), "match data")?;
        let md = match_data.handle()?;
        let mctx = self.context_handle(context)?;

        let rc = self
            .backend()
            .execute(code, subject.as_bytes(), start, options.bits(), md, mctx);
        if rc == codes::ERROR_NOMATCH {
            return Ok(None);
        }
        check(rc)?;

        Captures::new(subject.as_u16(), match_data.ovector()?).map(Some)
    }
}

fn pattern_info(backend: &dyn Backend, handle: Handle, what: PatternInfo) -> Result<i64> {
    let value = backend.pattern_info(handle, what);
    if value < 0 {
        let code = i32::try_from(value).unwrap_or(codes::ERROR_INTERNAL);
        return Err(Error::Native(NativeError::new(code)));
    }
    Ok(value)
}

fn parse_name_table(raw: &[u8], entry_size: usize) -> Result<Vec<NameEntry>> {
    if raw.len() % entry_size != 0 {
        return Err(Error::Internal(format!(
            "name table of {} bytes is not a multiple of {entry_size}",
            raw.len()
        )));
    }

    raw.chunks_exact(entry_size)
        .map(|entry| {
            let group = u32::from(u16::from_be_bytes([entry[0], entry[1]]));
            let name = &entry[2..];
            let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
            let name = std::str::from_utf8(&name[..end])
                .map_err(|_| Error::Internal("group name is not valid UTF-8".to_string()))?;
            Ok(NameEntry {
                name: name.to_string(),
                group,
            })
        })
        .collect()
}

/// Iterator over successive matches, see [`Code::find_all`].
#[derive(Debug)]
pub struct Matches<'c, 's> {
    code: &'c Code,
    subject: Subject<'s>,
    match_data: MatchData,
    next: Option<usize>,
}

impl Iterator for Matches<'_, '_> {
    type Item = Result<Captures>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next.take()?;
        let caps = match self.code.execute(
            &self.subject,
            start,
            MatchOptions::empty(),
            &self.match_data,
            None,
        ) {
            Ok(Some(caps)) => caps,
            Ok(None) => return None,
            Err(error) => return Some(Err(error)),
        };

        let Some(span) = caps.byte_range(0) else {
            return Some(Err(Error::Internal(
                "match reported without an overall span".to_string(),
            )));
        };
        self.next = if span.is_empty() {
            step_past(self.subject.as_str(), span.end)
        } else {
            Some(span.end)
        };
        Some(Ok(caps))
    }
}

/// Where to resume after an empty match at byte `at`: one character further, or one byte when
/// `at` falls inside a character. `None` at the end of the subject.
fn step_past(text: &str, at: usize) -> Option<usize> {
    match text.get(at..) {
        Some(rest) => rest.chars().next().map(|c| at + c.len_utf8()),
        None => (at < text.len()).then_some(at + 1),
    }
}

#[cfg(test)]
mod tests {
    use widestring::u16str;

    use super::*;
    use crate::{
        test::{backend, CountingBackend},
        NativeErrorKind,
    };

    #[test]
    fn compile_errors_carry_offset_and_message() {
        let backend = backend();
        match Code::compile(&backend, u16str!("ab(c"), CompileOptions::empty(), None) {
            Err(Error::Compile {
                code,
                offset,
                message,
            }) => {
                assert_eq!(code, codes::COMPILE_UNCLOSED_GROUP);
                assert!(offset <= 4);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unpaired_surrogate_is_rejected_before_compiling() {
        let backend = backend();
        let pattern = U16String::from_vec(vec![0x61, 0xD800]);
        assert!(matches!(
            Code::compile(&backend, &pattern, CompileOptions::empty(), None),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn pattern_facts() {
        let backend = backend();
        let code = Code::compile(
            &backend,
            u16str!(r"(?<year>\d{4})-(?<month>\d{2})-(\d{2})"),
            CompileOptions::CASELESS,
            None,
        )
        .unwrap();
        assert_eq!(code.capture_count(), 3);
        assert_eq!(code.name_count().unwrap(), 2);
        assert!(code.options().unwrap().contains(CompileOptions::CASELESS));
        assert!(code.size().unwrap() > 0);

        let table = code.name_table().unwrap();
        assert_eq!(
            table,
            vec![
                NameEntry {
                    name: "month".to_string(),
                    group: 2
                },
                NameEntry {
                    name: "year".to_string(),
                    group: 1
                },
            ]
        );
        assert_eq!(code.group_number("year").unwrap(), Some(1));
        assert_eq!(code.group_number("day").unwrap(), None);
    }

    #[test]
    fn jit_size_follows_jit_compile() {
        let backend = backend();
        let code = Code::compile(&backend, u16str!("a+b"), CompileOptions::empty(), None).unwrap();
        assert_eq!(code.jit_size().unwrap(), 0);
        code.jit_compile(JitOptions::COMPLETE).unwrap();
        assert!(code.jit_size().unwrap() > 0);

        let copy = code.try_clone().unwrap();
        assert_eq!(copy.jit_size().unwrap(), 0);
        assert_ne!(copy.handle().unwrap(), code.handle().unwrap());

        match code.jit_compile(JitOptions::PARTIAL_SOFT) {
            Err(Error::Native(e)) => assert_eq!(e.kind(), NativeErrorKind::JitBadOption),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn start_index_is_translated() {
        let backend = backend();
        let code = Code::compile(&backend, u16str!("o"), CompileOptions::empty(), None).unwrap();
        let mut md = MatchData::from_code(&code).unwrap();
        let subject = u16str!("🌐o🌐o");

        let caps = code
            .captures(subject, 3, MatchOptions::empty(), &mut md, None)
            .unwrap()
            .unwrap();
        assert_eq!(caps.get(0), Some(5..6));
        assert_eq!(caps.byte_range(0), Some(9..10));

        assert!(matches!(
            code.captures(subject, 1, MatchOptions::empty(), &mut md, None),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            code.captures(subject, 7, MatchOptions::empty(), &mut md, None),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn find_all_steps_over_empty_matches() {
        let backend = backend();
        let code = Code::compile(&backend, u16str!("x*"), CompileOptions::empty(), None).unwrap();
        let spans: Vec<Range<usize>> = code
            .find_all(u16str!("a🌐x"))
            .unwrap()
            .map(|caps| caps.unwrap().get(0).unwrap())
            .collect();
        assert_eq!(spans, vec![0..0, 1..1, 3..4, 4..4]);

        let words = Code::compile(&backend, u16str!(r"\w+"), CompileOptions::UTF, None).unwrap();
        let count = words.find_all(u16str!("one two  three")).unwrap().count();
        assert_eq!(count, 3);
    }

    #[test]
    fn find_all_resumes_inside_a_character() {
        let backend = backend();
        let code = Code::compile(
            &backend,
            u16str!(r"(?-u:\xC3)?"),
            CompileOptions::empty(),
            None,
        )
        .unwrap();
        let bytes: Vec<Range<usize>> = code
            .find_all(u16str!("é"))
            .unwrap()
            .map(|caps| caps.unwrap().byte_range(0).unwrap())
            .collect();
        assert_eq!(bytes, vec![0..1, 1..1, 2..2]);

        assert_eq!(step_past("é", 1), Some(2));
        assert_eq!(step_past("é", 0), Some(2));
        assert_eq!(step_past("é", 2), None);
    }

    #[test]
    fn par_find_matches_sequential_results() {
        let backend = backend();
        let code = Code::compile(&backend, u16str!(r"\d+"), CompileOptions::empty(), None).unwrap();
        let subjects = [
            u16str!("abc 123"),
            u16str!("none"),
            u16str!("🌐 42"),
            u16str!("7"),
        ];
        let found = code.par_find(&subjects).unwrap();
        let expected: Vec<_> = subjects.iter().map(|s| code.find(s).unwrap()).collect();
        assert_eq!(found, expected);
        assert_eq!(found[2], Some(3..5));

        code.dispose();
        assert!(matches!(
            code.par_find(&subjects),
            Err(Error::Released("compiled pattern"))
        ));
    }

    #[test]
    fn substitute_translates_and_counts() {
        let backend = backend();
        let code = Code::compile(&backend, u16str!(r"(\w+)@(\w+)"), CompileOptions::UTF, None)
            .unwrap();
        let result = code
            .substitute(
                u16str!("mail é@x and a@b"),
                0,
                SubstituteOptions::GLOBAL,
                u16str!("$2 at $1"),
                None,
                None,
            )
            .unwrap();
        assert_eq!(result.text, U16String::from_str("mail x at é and b at a"));
        assert_eq!(result.replacements, 2);

        match code.substitute(
            u16str!("a@b"),
            0,
            SubstituteOptions::empty(),
            u16str!("${2"),
            None,
            None,
        ) {
            Err(Error::Native(e)) => assert_eq!(e.kind(), NativeErrorKind::RepMissingBrace),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn substitute_retries_exactly_once() {
        let counting = Arc::new(CountingBackend::new());
        let backend: Arc<dyn Backend> = counting.clone();
        let code = Code::compile(&backend, u16str!("o"), CompileOptions::empty(), None).unwrap();

        let grown = code
            .substitute(
                u16str!("foo"),
                0,
                SubstituteOptions::GLOBAL,
                u16str!("0000000000"),
                None,
                None,
            )
            .unwrap();
        assert_eq!(grown.text, U16String::from_str(&format!("f{}", "0".repeat(20))));
        assert_eq!(counting.calls("substitute"), 2);

        let fits = code
            .substitute(u16str!("foo"), 0, SubstituteOptions::GLOBAL, u16str!("00"), None, None)
            .unwrap();
        assert_eq!(fits.text, U16String::from_str("f0000"));
        assert_eq!(counting.calls("substitute"), 3);

        counting.understate_sizes(2);
        let short = code.substitute(
            u16str!("foo"),
            0,
            SubstituteOptions::GLOBAL,
            u16str!("0000000000"),
            None,
            None,
        );
        assert!(matches!(short, Err(Error::Internal(_))));
        assert_eq!(counting.calls("substitute"), 5);
    }

    #[test]
    fn name_table_parsing_rejects_garbage() {
        assert!(parse_name_table(&[0, 1, b'a'], 4).is_err());
        assert!(parse_name_table(&[0, 1, 0xff, 0], 4).is_err());
        let entries = parse_name_table(&[0, 3, b'i', b'd', 0, 0], 6).unwrap();
        assert_eq!(entries[0].group, 3);
        assert_eq!(entries[0].name, "id");
    }
}
