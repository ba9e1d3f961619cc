//! Payload codec: gzip, then base64 so the result is a plain string.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{HasteError, Result};

/// Compresses and encodes raw document bytes for storage.
pub fn encode_payload(data: &[u8]) -> Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(STANDARD.encode(encoder.finish()?))
}

/// Reverses [`encode_payload`].
pub fn decode_payload(encoded: &str) -> Result<Vec<u8>> {
    let zipped = STANDARD
        .decode(encoded)
        .map_err(|e| HasteError::Internal(format!("stored payload is not base64: {}", e)))?;
    let mut decoder = GzDecoder::new(zipped.as_slice());
    let mut data = Vec::new();
    decoder
        .read_to_end(&mut data)
        .map_err(|e| HasteError::Internal(format!("stored payload is not gzip: {}", e)))?;
    Ok(data)
}
