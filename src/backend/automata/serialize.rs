//! Binary format for persisting compiled patterns.
//!
//! Blobs store the pattern source and its compile settings rather than the compiled automata;
//! decoding recompiles. The header pins the engine version, pointer width and byte order, and all
//! integers after the header are native-endian, so a blob is only accepted by an identical build
//! on an identical architecture.
//!
//! ```text
//! magic            4 bytes   "NRXS"
//! format           u8
//! pointer width    u8        bytes
//! byte order       u8        1 = little, 2 = big
//! version length   u8
//! version          n bytes   engine version string
//! count            u32
//! per pattern:
//!   options            u32
//!   max pattern length u64
//!   parens nest limit  u32
//!   newline            u32
//!   source length      u32
//!   source             n bytes
//! ```

use super::compile::{CompileSettings, CompiledPattern};
use crate::backend::codes;

const MAGIC: &[u8; 4] = b"NRXS";
const FORMAT: u8 = 1;

#[cfg(target_endian = "little")]
const BYTE_ORDER: u8 = 1;
#[cfg(target_endian = "big")]
const BYTE_ORDER: u8 = 2;

/// One decoded pattern record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Record {
    pub options: u32,
    pub settings: CompileSettings,
    pub source: Vec<u8>,
}

/// Appends the blob for `patterns` to `out`.
pub(super) fn encode(
    version: &str,
    patterns: &[&CompiledPattern],
    out: &mut Vec<u8>,
) -> Result<(), i32> {
    let version = version.as_bytes();
    let version_len = u8::try_from(version.len()).map_err(|_| codes::ERROR_INTERNAL)?;
    let count = u32::try_from(patterns.len()).map_err(|_| codes::ERROR_BADDATA)?;

    out.extend_from_slice(MAGIC);
    out.push(FORMAT);
    out.push(std::mem::size_of::<usize>() as u8);
    out.push(BYTE_ORDER);
    out.push(version_len);
    out.extend_from_slice(version);
    out.extend_from_slice(&count.to_ne_bytes());

    for pattern in patterns {
        let source_len = u32::try_from(pattern.source.len()).map_err(|_| codes::ERROR_BADDATA)?;
        out.extend_from_slice(&pattern.options.to_ne_bytes());
        out.extend_from_slice(&(pattern.settings.max_pattern_length as u64).to_ne_bytes());
        out.extend_from_slice(&pattern.settings.parens_nest_limit.to_ne_bytes());
        out.extend_from_slice(&pattern.settings.newline.to_ne_bytes());
        out.extend_from_slice(&source_len.to_ne_bytes());
        out.extend_from_slice(&pattern.source);
    }
    Ok(())
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], i32> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(codes::ERROR_BADSERIALIZEDDATA)?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, i32> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, i32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(u32::from_ne_bytes(raw))
    }

    fn u64(&mut self) -> Result<u64, i32> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(u64::from_ne_bytes(raw))
    }
}

/// Validates the header and returns the pattern count plus a reader positioned at the records.
fn header<'a>(version: &str, blob: &'a [u8]) -> Result<(u32, Reader<'a>), i32> {
    let mut reader = Reader { data: blob, pos: 0 };

    if reader.take(4).map_err(|_| codes::ERROR_BADMAGIC)? != MAGIC {
        return Err(codes::ERROR_BADMAGIC);
    }
    let format = reader.u8()?;
    let width = reader.u8()?;
    let order = reader.u8()?;
    let version_len = reader.u8()? as usize;
    let stored_version = reader.take(version_len)?;

    if format != FORMAT
        || width as usize != std::mem::size_of::<usize>()
        || order != BYTE_ORDER
        || stored_version != version.as_bytes()
    {
        return Err(codes::ERROR_BADMODE);
    }

    let count = reader.u32()?;
    Ok((count, reader))
}

/// Number of patterns stored in `blob`.
pub(super) fn count(version: &str, blob: &[u8]) -> Result<u32, i32> {
    header(version, blob).map(|(count, _)| count)
}

/// Decodes up to `limit` records from `blob`.
pub(super) fn decode(version: &str, blob: &[u8], limit: usize) -> Result<Vec<Record>, i32> {
    let (count, mut reader) = header(version, blob)?;
    let wanted = (count as usize).min(limit);
    let mut records = Vec::with_capacity(wanted);

    for _ in 0..wanted {
        let options = reader.u32()?;
        let max_pattern_length =
            usize::try_from(reader.u64()?).map_err(|_| codes::ERROR_BADSERIALIZEDDATA)?;
        let parens_nest_limit = reader.u32()?;
        let newline = reader.u32()?;
        let source_len = reader.u32()? as usize;
        let source = reader.take(source_len)?.to_vec();

        records.push(Record {
            options,
            settings: CompileSettings {
                max_pattern_length,
                parens_nest_limit,
                newline,
            },
            source,
        });
    }
    Ok(records)
}
