//! XChaCha20-Poly1305 scheme (`xchacha20poly1305`)
//!
//! Sealed format (binary):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! AAD = scheme id ("xchacha20poly1305")
//! ```

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use crate::cipher::Cipher;
use crate::details::{CryptographicDetails, KEY_PARAMETER, XCHACHA20_POLY1305};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::SymmetricKey;
use crate::TAG_SIZE;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const XCHACHA_NONCE_SIZE: usize = 24;

#[derive(Debug, Clone, Copy, Default)]
pub struct XChaCha20Poly1305Cipher;

impl XChaCha20Poly1305Cipher {
    fn cipher(details: &CryptographicDetails) -> CryptoResult<XChaCha20Poly1305> {
        let key = SymmetricKey::from_slice(details.parameter(KEY_PARAMETER)?)?;
        Ok(XChaCha20Poly1305::new(key.as_bytes().into()))
    }
}

impl Cipher for XChaCha20Poly1305Cipher {
    fn scheme(&self) -> &str {
        XCHACHA20_POLY1305
    }

    fn required_parameters(&self) -> &[&str] {
        &[KEY_PARAMETER]
    }

    fn seal(&self, plaintext: &[u8], details: &CryptographicDetails) -> CryptoResult<Vec<u8>> {
        let cipher = Self::cipher(details)?;

        let mut nonce_bytes = [0u8; XCHACHA_NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: XCHACHA20_POLY1305.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::EncryptionFailed("xchacha20poly1305 seal failed".into()))?;

        let mut result = Vec::with_capacity(XCHACHA_NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn open(&self, sealed: &[u8], details: &CryptographicDetails) -> CryptoResult<Vec<u8>> {
        let cipher = Self::cipher(details)?;

        if sealed.len() < XCHACHA_NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::DecryptionFailed);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(XCHACHA_NONCE_SIZE);
        let nonce = XNonce::from_slice(nonce_bytes);

        cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: XCHACHA20_POLY1305.as_bytes(),
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
        CryptographicDetails::xchacha20poly1305(generate_key())
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let details = details();
        let sealed = XChaCha20Poly1305Cipher.seal(b"+44 20 7946 0958", &details).unwrap();
        let opened = XChaCha20Poly1305Cipher.open(&sealed, &details).unwrap();

        assert_eq!(opened, b"+44 20 7946 0958");
    }

    #[test]
    fn test_seal_open_empty() {
        let details = details();
        let sealed = XChaCha20Poly1305Cipher.seal(b"", &details).unwrap();

        assert_eq!(sealed.len(), XCHACHA_NONCE_SIZE + TAG_SIZE);
        assert_eq!(XChaCha20Poly1305Cipher.open(&sealed, &details).unwrap(), b"");
    }

    #[test]
    fn test_open_wrong_key() {
        let sealed = XChaCha20Poly1305Cipher.seal(b"secret", &details()).unwrap();
        let err = XChaCha20Poly1305Cipher.open(&sealed, &details()).unwrap_err();

        assert_eq!(err, CryptoError::DecryptionFailed);
    }

    #[test]
    fn test_open_aes_ciphertext_fails() {
        // Same key bytes under the other scheme: AAD and nonce layout differ.
        let key = generate_key();
        let aes = CryptographicDetails::aes256gcm(key.clone());
        let xchacha = CryptographicDetails::xchacha20poly1305(key);

        let sealed = crate::aes::Aes256GcmCipher.seal(b"secret", &aes).unwrap();
        let err = XChaCha20Poly1305Cipher.open(&sealed, &xchacha).unwrap_err();

        assert_eq!(err, CryptoError::DecryptionFailed);
    }

    #[test]
    fn test_missing_key_parameter() {
        let details = CryptographicDetails::new(
            XCHACHA20_POLY1305,
            vec![("salt", vec![0u8; 16])],
        )
        .unwrap();
        let err = XChaCha20Poly1305Cipher.seal(b"x", &details).unwrap_err();

        assert_eq!(err, CryptoError::MissingParameter("key".into()));
    }
}
