//! Personal data encryptor
//!
//! Stateless: every call takes the subject's details as an argument and
//! returns a fresh value. Details are borrowed for the duration of the call
//! and never retained, so one encryptor can be shared across threads.

use crate::cipher::{Cipher, CipherRegistry};
use crate::details::CryptographicDetails;
use crate::error::{CryptoError, CryptoResult};
use crate::personal_data::EncryptedPersonalData;

#[derive(Debug, Clone)]
pub struct PersonalDataEncryptor {
    registry: CipherRegistry,
}

impl PersonalDataEncryptor {
    pub fn new(registry: CipherRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CipherRegistry {
        &self.registry
    }

    /// Encrypt `plaintext` under the subject's details.
    ///
    /// Fails with `UnsupportedScheme` if no cipher serves `details.scheme()`
    /// and with `MissingParameter` if the details lack a required parameter.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        details: &CryptographicDetails,
    ) -> CryptoResult<EncryptedPersonalData> {
        let cipher = self.cipher_for(details)?;
        let sealed = cipher.seal(plaintext, details)?;
        tracing::trace!(scheme = details.scheme(), "sealed personal data");
        Ok(EncryptedPersonalData::from_raw(sealed))
    }

    /// Decrypt data previously produced by [`encrypt`](Self::encrypt).
    ///
    /// `DecryptionFailed` means the details are not the generation that sealed
    /// the data, or the bytes were corrupted; after crypto-shredding it is the
    /// permanent outcome for that subject's data.
    pub fn decrypt(
        &self,
        data: &EncryptedPersonalData,
        details: &CryptographicDetails,
    ) -> CryptoResult<Vec<u8>> {
        let cipher = self.cipher_for(details)?;
        cipher.open(data.as_bytes(), details).inspect_err(|e| {
            if *e == CryptoError::DecryptionFailed {
                tracing::debug!(scheme = details.scheme(), "personal data could not be opened");
            }
        })
    }

    fn cipher_for(&self, details: &CryptographicDetails) -> CryptoResult<&dyn Cipher> {
        let cipher = self.registry.lookup(details.scheme())?;
        for name in cipher.required_parameters() {
            details.parameter(name)?;
        }
        Ok(cipher)
    }
}

impl Default for PersonalDataEncryptor {
    fn default() -> Self {
        Self::new(CipherRegistry::with_defaults())
    }
}
