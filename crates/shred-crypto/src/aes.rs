//! AES-256-GCM scheme (`aes256gcm`)
//!
//! Sealed format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! AAD = scheme id ("aes256gcm")
//! ```
//!
//! A fresh nonce is drawn for every seal. Details written by older writers may
//! also carry a `nonce` parameter; it is ignored, since a nonce fixed per
//! subject would repeat across every field sealed under the same key.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::cipher::Cipher;
use crate::details::{CryptographicDetails, AES_256_GCM, KEY_PARAMETER};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::SymmetricKey;
use crate::TAG_SIZE;

/// Size of an AES-GCM nonce (96-bit)
pub const AES_GCM_NONCE_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256GcmCipher;

impl Aes256GcmCipher {
    fn cipher(details: &CryptographicDetails) -> CryptoResult<Aes256Gcm> {
        let key = SymmetricKey::from_slice(details.parameter(KEY_PARAMETER)?)?;
        Ok(Aes256Gcm::new(key.as_bytes().into()))
    }
}

impl Cipher for Aes256GcmCipher {
    fn scheme(&self) -> &str {
        AES_256_GCM
    }

    fn required_parameters(&self) -> &[&str] {
        &[KEY_PARAMETER]
    }

    fn seal(&self, plaintext: &[u8], details: &CryptographicDetails) -> CryptoResult<Vec<u8>> {
        let cipher = Self::cipher(details)?;

        let mut nonce_bytes = [0u8; AES_GCM_NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: AES_256_GCM.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::EncryptionFailed("aes256gcm seal failed".into()))?;

        let mut result = Vec::with_capacity(AES_GCM_NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn open(&self, sealed: &[u8], details: &CryptographicDetails) -> CryptoResult<Vec<u8>> {
        let cipher = Self::cipher(details)?;

        if sealed.len() < AES_GCM_NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::DecryptionFailed);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(AES_GCM_NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: AES_256_GCM.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key;

    fn details() -> CryptographicDetails {
        CryptographicDetails::aes256gcm(generate_key())
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let details = details();
        let sealed = Aes256GcmCipher.seal(b"alice@example.com", &details).unwrap();
        let opened = Aes256GcmCipher.open(&sealed, &details).unwrap();

        assert_eq!(opened, b"alice@example.com");
    }

    #[test]
    fn test_sealed_size() {
        let sealed = Aes256GcmCipher.seal(&[0u8; 100], &details()).unwrap();

        // nonce (12) + plaintext (100) + tag (16) = 128
        assert_eq!(sealed.len(), AES_GCM_NONCE_SIZE + 100 + TAG_SIZE);
    }

    #[test]
    fn test_nonce_is_fresh_per_seal() {
        let details = details();
        let a = Aes256GcmCipher.seal(b"same", &details).unwrap();
        let b = Aes256GcmCipher.seal(b"same", &details).unwrap();

        assert_ne!(a, b, "two seals of the same plaintext must differ");
    }

    #[test]
    fn test_open_wrong_key() {
        let sealed = Aes256GcmCipher.seal(b"secret", &details()).unwrap();
        let err = Aes256GcmCipher.open(&sealed, &details()).unwrap_err();

        assert_eq!(err, CryptoError::DecryptionFailed);
    }

    #[test]
    fn test_open_tampered() {
        let details = details();
        let mut sealed = Aes256GcmCipher.seal(b"secret", &details).unwrap();
        sealed[AES_GCM_NONCE_SIZE + 1] ^= 0xFF;

        let err = Aes256GcmCipher.open(&sealed, &details).unwrap_err();
        assert_eq!(err, CryptoError::DecryptionFailed);
    }

    #[test]
    fn test_open_truncated() {
        let err = Aes256GcmCipher.open(&[0u8; 10], &details()).unwrap_err();
        assert_eq!(err, CryptoError::DecryptionFailed);
    }

    #[test]
    fn test_stored_nonce_parameter_is_tolerated() {
        let details = CryptographicDetails::new(
            AES_256_GCM,
            vec![("key", vec![3u8; 32]), ("nonce", vec![4u8; 12])],
        )
        .unwrap();

        let sealed = Aes256GcmCipher.seal(b"legacy", &details).unwrap();
        assert_eq!(Aes256GcmCipher.open(&sealed, &details).unwrap(), b"legacy");
    }

    #[test]
    fn test_short_key_is_invalid_details() {
        let details = CryptographicDetails::new(AES_256_GCM, vec![("key", vec![3u8; 16])]).unwrap();
        let err = Aes256GcmCipher.seal(b"x", &details).unwrap_err();

        assert!(matches!(err, CryptoError::InvalidDetails(_)));
    }
}
