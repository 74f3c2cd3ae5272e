//! Byte ↔ text codec for persisted forms (standard base64, padded)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode(s: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| CryptoError::CannotDeserialize(format!("base64 decode: {e}")))
}
