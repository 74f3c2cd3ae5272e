//! Subject key material: symmetric keys and fresh details per scheme

use rand::RngCore;
use zeroize::Zeroize;

use crate::details::{CryptographicDetails, AES_256_GCM, XCHACHA20_POLY1305};
use crate::error::{CryptoError, CryptoResult};
use crate::KEY_SIZE;

/// A per-subject 256-bit symmetric key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Copy a key out of a parameter value, checking its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidDetails(format!(
                "key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit key.
pub fn generate_key() -> SymmetricKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    let key = SymmetricKey::from_bytes(bytes);
    bytes.zeroize();
    key
}

/// Generate fresh details for one of the built-in schemes.
///
/// Used when a subject's personal data is first encrypted and on rotation.
pub fn generate_details(scheme: &str) -> CryptoResult<CryptographicDetails> {
    match scheme {
        AES_256_GCM => Ok(CryptographicDetails::aes256gcm(generate_key())),
        XCHACHA20_POLY1305 => Ok(CryptographicDetails::xchacha20poly1305(generate_key())),
        other => Err(CryptoError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let k1 = generate_key();
        let k2 = generate_key();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_from_slice_wrong_length() {
        let err = SymmetricKey::from_slice(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidDetails(_)));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([0xABu8; KEY_SIZE]);
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("171"));
    }

    #[test]
    fn test_generate_details_for_builtin_schemes() {
        let aes = generate_details(AES_256_GCM).unwrap();
        assert_eq!(aes.scheme(), AES_256_GCM);
        assert_eq!(aes.parameter("key").unwrap().len(), KEY_SIZE);

        let xchacha = generate_details(XCHACHA20_POLY1305).unwrap();
        assert_eq!(xchacha.scheme(), XCHACHA20_POLY1305);
    }

    #[test]
    fn test_generate_details_unknown_scheme() {
        let err = generate_details("rot13").unwrap_err();
        assert_eq!(err, CryptoError::UnsupportedScheme("rot13".into()));
    }
}
