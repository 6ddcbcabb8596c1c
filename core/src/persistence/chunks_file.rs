use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::PersistenceError;

pub(super) const CHUNKS_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct ChunksDocumentRef<'a> {
    version: u32,
    chunks: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ChunksDocument {
    version: u32,
    chunks: Vec<String>,
}

pub(super) fn encode_chunks<W: Write>(
    mut writer: W,
    chunks: &[String],
) -> Result<(), PersistenceError> {
    let document = ChunksDocumentRef {
        version: CHUNKS_VERSION,
        chunks,
    };
    serde_json::to_writer(&mut writer, &document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub(super) fn decode_chunks<R: Read>(reader: R) -> Result<Vec<String>, PersistenceError> {
    let document: ChunksDocument = serde_json::from_reader(reader)?;
    if document.version != CHUNKS_VERSION {
        return Err(PersistenceError::InvalidData(format!(
            "unsupported chunks version {}",
            document.version
        )));
    }
    Ok(document.chunks)
}
