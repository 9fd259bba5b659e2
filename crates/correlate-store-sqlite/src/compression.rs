// crates/correlate-store-sqlite/src/compression.rs
// ============================================================================
// Module: Correlate Blob Compression
// Description: Gzip compression for oversized match payload blobs.
// Purpose: Keep `feather_records` rows small on disk without changing
//          their logical content (spec.md §4.7, §6.3, §8 Scenario F).
// Dependencies: flate2
// ============================================================================

//! ## Overview
//! Large `feather_records` serializations (> 1 MiB) are gzip-compressed
//! before being written; the `compressed` column flags this so reads can
//! decompress transparently (spec.md §4.7). The teacher never compresses
//! blobs, so this module is adopted from `flate2` usage across the wider
//! example pool (see DESIGN.md).

use std::io::Read;
use std::io::Write;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::errors::StoreError;

/// Payloads at or above this size are gzip-compressed before storage
/// (spec.md §4.7: "Large `feather_records` serializations (> 1 MiB)").
pub const COMPRESSION_THRESHOLD_BYTES: usize = 1024 * 1024;

/// Compresses `bytes` with gzip at the default compression level.
///
/// # Errors
///
/// Returns [`StoreError::Compression`] if the gzip writer fails.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Decompresses a gzip payload previously produced by [`compress`].
///
/// # Errors
///
/// Returns [`StoreError::Compression`] if the gzip reader fails.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Encodes `bytes` for storage, compressing it if it exceeds
/// [`COMPRESSION_THRESHOLD_BYTES`]. Returns the stored bytes and whether
/// compression was applied.
///
/// # Errors
///
/// Returns [`StoreError::Compression`] if gzip compression fails.
pub fn encode_for_storage(bytes: Vec<u8>) -> Result<(Vec<u8>, bool), StoreError> {
    if bytes.len() >= COMPRESSION_THRESHOLD_BYTES {
        Ok((compress(&bytes)?, true))
    } else {
        Ok((bytes, false))
    }
}

/// Decodes bytes read back from storage, decompressing first if
/// `compressed` is set.
///
/// # Errors
///
/// Returns [`StoreError::Compression`] if gzip decompression fails.
pub fn decode_from_storage(bytes: Vec<u8>, compressed: bool) -> Result<Vec<u8>, StoreError> {
    if compressed { decompress(&bytes) } else { Ok(bytes) }
}

#[cfg(test)]
mod tests {
    use super::COMPRESSION_THRESHOLD_BYTES;
    use super::decode_from_storage;
    use super::encode_for_storage;

    #[test]
    fn small_payload_is_not_compressed() {
        let payload = b"small".to_vec();
        let (stored, compressed) = encode_for_storage(payload.clone()).expect("encode");
        assert!(!compressed);
        assert_eq!(stored, payload);
    }

    #[test]
    fn large_payload_round_trips_through_gzip() {
        let payload = vec![b'x'; COMPRESSION_THRESHOLD_BYTES + 1];
        let (stored, compressed) = encode_for_storage(payload.clone()).expect("encode");
        assert!(compressed);
        assert!(stored.len() < payload.len());
        let restored = decode_from_storage(stored, compressed).expect("decode");
        assert_eq!(restored, payload);
    }
}
