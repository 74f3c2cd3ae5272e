//! Key rotation: mint a new generation, then reseal fields under it
//!
//! Rotation flow:
//!   1. `rotate` swaps in a fresh record for the subject (default scheme)
//!      and hands back the previous record
//!   2. The caller walks the fields it still holds and passes each one to
//!      `reseal` together with the previous record
//!   3. The caller drops the previous record once every field is resealed
//!
//! Fields that are never resealed stay bound to the previous generation and
//! become unreadable when the previous record is dropped. Events themselves
//! are never rewritten here; where resealed fields are stored is up to the
//! caller.

use shred_core::{KeyGeneration, SubjectId};
use shred_crypto::generate_details;

use crate::error::{KeyStoreError, KeyStoreResult};
use crate::record::KeyRecord;
use crate::vault::{PersonalDataVault, SealedField};

/// Outcome of a key rotation.
#[derive(Debug)]
pub struct RotationResult {
    /// The record that was current before rotation; needed to reseal
    pub previous: KeyRecord,
    /// Generation now current for the subject
    pub current: KeyGeneration,
}

impl PersonalDataVault {
    /// Replace the subject's key material with a new generation.
    ///
    /// `NotFound` if the subject has no key material; a forgotten subject
    /// cannot be rotated back into existence.
    pub fn rotate(&self, subject: &SubjectId) -> KeyStoreResult<RotationResult> {
        let next = KeyRecord::new(generate_details(self.default_scheme())?);
        let current = next.generation;
        let previous = self.repository().replace(subject, next)?;

        tracing::info!(
            subject = %subject,
            from = %previous.generation,
            to = %current,
            "rotated key material"
        );
        Ok(RotationResult { previous, current })
    }

    /// Reseal a field sealed under `previous` with the subject's current key.
    ///
    /// A field already under the current generation is returned unchanged.
    pub fn reseal(
        &self,
        subject: &SubjectId,
        previous: &KeyRecord,
        field: &SealedField,
    ) -> KeyStoreResult<SealedField> {
        let current = self.repository().find(subject)?;
        if field.key_generation == current.generation {
            return Ok(field.clone());
        }
        if field.key_generation != previous.generation {
            return Err(KeyStoreError::StaleGeneration {
                current: previous.generation,
                found: field.key_generation,
            });
        }

        let plaintext =
            zeroize::Zeroizing::new(self.encryptor().decrypt(&field.data, &previous.details)?);
        let data = self.encryptor().encrypt(&plaintext, &current.details)?;
        tracing::trace!(subject = %subject, generation = %current.generation, "resealed field");

        Ok(SealedField {
            key_generation: current.generation,
            data,
        })
    }
}
