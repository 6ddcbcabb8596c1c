//! Flat binary layout for a [`VectorIndex`].
//!
//! ```text
//! magic  "CVIX"           4 bytes
//! version u32 LE          4 bytes
//! dimension u64 LE        8 bytes
//! vector_count u64 LE     8 bytes
//! values f32 LE           vector_count * dimension * 4 bytes, row-major
//! crc32 u32 LE            over every preceding byte
//! ```

use std::io::{self, ErrorKind, Read, Write};

use crate::VectorIndex;

use super::PersistenceError;

pub(super) const INDEX_MAGIC: [u8; 4] = *b"CVIX";
pub(super) const INDEX_VERSION: u32 = 1;
pub(super) const HEADER_LEN: usize = 24;

const F32_LEN: usize = std::mem::size_of::<f32>();
const BLOCK_VALUES: usize = 16 * 1024;

#[derive(Debug)]
pub(super) struct DecodedIndex {
    pub(super) dimension: usize,
    pub(super) values: Vec<f32>,
}

pub(super) fn encode_index<W: Write>(
    writer: W,
    index: &VectorIndex,
) -> Result<(), PersistenceError> {
    let mut writer = ChecksumWriter::new(writer);

    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(&INDEX_MAGIC);
    header[4..8].copy_from_slice(&INDEX_VERSION.to_le_bytes());
    header[8..16].copy_from_slice(&(index.dimension() as u64).to_le_bytes());
    header[16..24].copy_from_slice(&(index.len() as u64).to_le_bytes());
    writer.write_all(&header)?;

    let mut block = Vec::with_capacity(BLOCK_VALUES * F32_LEN);
    for values in index.as_flat().chunks(BLOCK_VALUES) {
        block.clear();
        for value in values {
            block.extend_from_slice(&value.to_le_bytes());
        }
        writer.write_all(&block)?;
    }

    let (mut inner, checksum) = writer.finish();
    inner.write_all(&checksum.to_le_bytes())?;
    inner.flush()?;
    Ok(())
}

/// Shape recorded in an index file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    pub dimension: usize,
    pub vectors: usize,
}

/// Reads and validates the fixed-size header without touching vector data.
pub(super) fn decode_header<R: Read>(mut reader: R) -> Result<IndexHeader, PersistenceError> {
    let mut header = [0u8; HEADER_LEN];
    read_exact_or_truncated(&mut reader, &mut header, "header")?;
    if header[0..4] != INDEX_MAGIC {
        return Err(PersistenceError::InvalidData(
            "index file has an unknown magic".to_string(),
        ));
    }

    let version = u32::from_le_bytes(le_array(&header[4..8]));
    if version != INDEX_VERSION {
        return Err(PersistenceError::InvalidData(format!(
            "unsupported index version {version}"
        )));
    }

    let dimension = header_usize(&header[8..16], "dimension")?;
    let vectors = header_usize(&header[16..24], "vector count")?;
    if dimension == 0 {
        return Err(PersistenceError::InvalidData(
            "index dimension must be > 0".to_string(),
        ));
    }
    Ok(IndexHeader { dimension, vectors })
}

pub(super) fn decode_index<R: Read>(reader: R) -> Result<DecodedIndex, PersistenceError> {
    let mut reader = ChecksumReader::new(reader);

    let IndexHeader { dimension, vectors } = decode_header(&mut reader)?;
    let total_values = vectors
        .checked_mul(dimension)
        .filter(|total| total.checked_mul(F32_LEN).is_some())
        .ok_or_else(|| {
            PersistenceError::InvalidData(format!(
                "index header overflows: {vectors} vectors of dimension {dimension}"
            ))
        })?;

    // Grow with the data actually read so a forged header cannot force a
    // huge allocation up front.
    let mut values = Vec::with_capacity(total_values.min(BLOCK_VALUES));
    let mut block = vec![0u8; BLOCK_VALUES * F32_LEN];
    let mut remaining = total_values;
    while remaining > 0 {
        let take = remaining.min(BLOCK_VALUES);
        let bytes = &mut block[..take * F32_LEN];
        read_exact_or_truncated(&mut reader, bytes, "vector data")?;
        values.extend(
            bytes
                .chunks_exact(F32_LEN)
                .map(|raw| f32::from_le_bytes(le_array(raw))),
        );
        remaining -= take;
    }

    let (mut inner, actual) = reader.finish();
    let mut stored = [0u8; 4];
    read_exact_or_truncated(&mut inner, &mut stored, "checksum")?;
    let expected = u32::from_le_bytes(stored);
    if expected != actual {
        return Err(PersistenceError::ChecksumMismatch { expected, actual });
    }

    let mut trailing = [0u8; 1];
    if inner.read(&mut trailing)? != 0 {
        return Err(PersistenceError::InvalidData(
            "index file has trailing bytes".to_string(),
        ));
    }

    Ok(DecodedIndex { dimension, values })
}

fn header_usize(raw: &[u8], field: &str) -> Result<usize, PersistenceError> {
    let value = u64::from_le_bytes(le_array(raw));
    usize::try_from(value).map_err(|_| {
        PersistenceError::InvalidData(format!("index {field} {value} does not fit in memory"))
    })
}

fn le_array<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(raw);
    out
}

fn read_exact_or_truncated<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    section: &str,
) -> Result<(), PersistenceError> {
    reader.read_exact(buf).map_err(|error| {
        if error.kind() == ErrorKind::UnexpectedEof {
            PersistenceError::InvalidData(format!("index file truncated in {section}"))
        } else {
            PersistenceError::Io(error)
        }
    })
}

struct ChecksumWriter<W> {
    inner: W,
    hasher: crc32fast::Hasher,
}

impl<W: Write> ChecksumWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: crc32fast::Hasher::new(),
        }
    }

    fn finish(self) -> (W, u32) {
        (self.inner, self.hasher.finalize())
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct ChecksumReader<R> {
    inner: R,
    hasher: crc32fast::Hasher,
}

impl<R: Read> ChecksumReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: crc32fast::Hasher::new(),
        }
    }

    fn finish(self) -> (R, u32) {
        (self.inner, self.hasher.finalize())
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.hasher.update(&buf[..read]);
        Ok(read)
    }
}
