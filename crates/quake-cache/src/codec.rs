//! Result set serialization for cache payloads
//!
//! Layout: 4-byte magic `QRS2`, little-endian `u64` row count, SHA-256 of the
//! row count and stream, then an Arrow IPC stream (schema message followed by
//! every batch in order). The digest is checked before the stream is handed
//! to the IPC reader, which does not tolerate arbitrary bytes. The row count
//! catches streams that were cut off on a message boundary.

use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use quake_core::{QuakeError, Result, ResultSet};
use sha2::{Digest, Sha256};
use std::io::Cursor;

/// Magic and format version of the payload header
pub const PAYLOAD_MAGIC: &[u8; 4] = b"QRS2";

const COUNT_LEN: usize = 8;
const DIGEST_LEN: usize = 32;
const HEADER_LEN: usize = PAYLOAD_MAGIC.len() + COUNT_LEN + DIGEST_LEN;

fn digest(count: &[u8], stream: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(count);
    hasher.update(stream);
    hasher.finalize().into()
}

/// Encode a result set into a cache payload
pub fn encode(result: &ResultSet) -> Result<Vec<u8>> {
    let mut stream = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut stream, result.schema())?;
        for batch in result.batches() {
            writer.write(batch)?;
        }
        writer.finish()?;
    }

    let count = (result.num_rows() as u64).to_le_bytes();

    let mut buffer = Vec::with_capacity(HEADER_LEN + stream.len());
    buffer.extend_from_slice(PAYLOAD_MAGIC);
    buffer.extend_from_slice(&count);
    buffer.extend_from_slice(&digest(&count, &stream));
    buffer.extend_from_slice(&stream);

    Ok(buffer)
}

/// Decode a cache payload back into a result set
pub fn decode(bytes: &[u8]) -> Result<ResultSet> {
    if bytes.len() < HEADER_LEN {
        return Err(QuakeError::CorruptPayload(format!(
            "payload of {} bytes is shorter than its header",
            bytes.len()
        )));
    }

    let (magic, rest) = bytes.split_at(PAYLOAD_MAGIC.len());
    if magic != PAYLOAD_MAGIC {
        return Err(QuakeError::CorruptPayload(format!(
            "unexpected payload header {:?}, expected {:?}",
            String::from_utf8_lossy(magic),
            String::from_utf8_lossy(PAYLOAD_MAGIC)
        )));
    }

    let (count, rest) = rest.split_at(COUNT_LEN);
    let (expected_digest, stream) = rest.split_at(DIGEST_LEN);
    if digest(count, stream).as_slice() != expected_digest {
        return Err(QuakeError::CorruptPayload(
            "payload digest does not match its contents".to_string(),
        ));
    }

    let mut count_bytes = [0u8; COUNT_LEN];
    count_bytes.copy_from_slice(count);
    let expected_rows = u64::from_le_bytes(count_bytes) as usize;

    let reader = StreamReader::try_new(Cursor::new(stream), None)
        .map_err(|e| QuakeError::CorruptPayload(e.to_string()))?;
    let schema = reader.schema();

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| QuakeError::CorruptPayload(e.to_string()))?;

    let result = ResultSet::try_new(schema, batches)
        .map_err(|e| QuakeError::CorruptPayload(e.to_string()))?;

    if result.num_rows() != expected_rows {
        return Err(QuakeError::CorruptPayload(format!(
            "payload declares {} rows but holds {}",
            expected_rows,
            result.num_rows()
        )));
    }

    Ok(result)
}
