use std::sync::Arc;

use crate::{
    error::check,
    pattern::ensure_same_backend,
    resource::NativeResource,
    Backend, Code, Handle, Result,
};

/// Serializes compiled patterns into one blob.
///
/// The blob can only be loaded by the same engine version on a machine with the same pointer
/// width and byte order.
///
/// # Errors
///
/// - [`crate::Error::InvalidArgument`] if `codes` is empty or mixes backends
/// - [`crate::Error::Released`] if a pattern was disposed
/// - [`crate::Error::Native`] if the engine refuses
pub fn serialize(codes: &[&Code]) -> Result<Vec<u8>> {
    let Some(first) = codes.first() else {
        return Err(invalid_argument!("nothing to serialize"));
    };
    let backend = first.backend();

    let handles = codes
        .iter()
        .map(|code| {
            ensure_same_backend(backend, code.backend(), "compiled pattern")?;
            code.handle()
        })
        .collect::<Result<Vec<Handle>>>()?;

    let mut blob = Vec::new();
    check(backend.serialize_encode(&handles, &mut blob))?;
    Ok(blob)
}

/// Number of patterns stored in `blob`.
///
/// # Errors
///
/// Returns [`crate::Error::Native`] if the blob is corrupt or from an incompatible engine.
pub fn serialized_pattern_count(backend: &Arc<dyn Backend>, blob: &[u8]) -> Result<usize> {
    check(backend.serialize_number_of_codes(blob)).map(|count| count as usize)
}

/// Rebuilds the patterns stored in `blob`.
///
/// # Errors
///
/// Returns [`crate::Error::Native`] if the blob is corrupt or from an incompatible engine. No
/// native pattern is leaked on failure.
pub fn deserialize(backend: &Arc<dyn Backend>, blob: &[u8]) -> Result<Vec<Code>> {
    let count = serialized_pattern_count(backend, blob)?;
    if count == 0 {
        return Ok(Vec::new());
    }

    // A record is never shorter than one byte, so a larger count is corrupt.
    let mut handles = vec![Handle::NULL; count.min(blob.len())];
    let created = check(backend.serialize_decode(blob, &mut handles))? as usize;
    log::debug!("deserialized {created} of {count} patterns");

    let mut codes = Vec::with_capacity(created);
    let mut pending = handles.into_iter().take(created);
    while let Some(handle) = pending.next() {
        let code = NativeResource::create(backend, |_| handle).and_then(Code::from_resource);
        match code {
            Ok(code) => codes.push(code),
            Err(error) => {
                for handle in pending {
                    backend.code_free(handle);
                }
                return Err(error);
            }
        }
    }
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use widestring::u16str;

    use super::*;
    use crate::{test::backend, AutomataBackend, CompileOptions, Error, NativeErrorKind};

    #[test]
    fn serialize_requires_patterns_from_one_backend() {
        let backend = backend();
        let other: Arc<dyn Backend> = Arc::new(AutomataBackend::new());
        let a = Code::compile(&backend, u16str!("a"), CompileOptions::empty(), None).unwrap();
        let b = Code::compile(&other, u16str!("b"), CompileOptions::empty(), None).unwrap();

        assert!(matches!(serialize(&[]), Err(Error::InvalidArgument { .. })));
        assert!(matches!(
            serialize(&[&a, &b]),
            Err(Error::InvalidArgument { .. })
        ));

        let blob = serialize(&[&a]).unwrap();
        assert_eq!(serialized_pattern_count(&backend, &blob).unwrap(), 1);
    }

    #[test]
    fn corrupt_blobs_are_rejected() {
        let backend = backend();
        let code = Code::compile(&backend, u16str!("x+"), CompileOptions::empty(), None).unwrap();
        let mut blob = serialize(&[&code]).unwrap();

        match deserialize(&backend, &blob[..3]) {
            Err(Error::Native(e)) => assert_eq!(e.kind(), NativeErrorKind::BadMagic),
            other => panic!("unexpected {other:?}"),
        }

        blob[0] ^= 0xff;
        assert!(matches!(deserialize(&backend, &blob), Err(Error::Native(_))));
    }
}
