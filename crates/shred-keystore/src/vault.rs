//! Personal data vault: repository + encryptor
//!
//! Write path: `seal` looks up (or provisions) the subject's key record and
//! encrypts the field under it. Read/replay path: `open` decrypts with the
//! same record. Erasure: `forget` destroys the record, after which every
//! field sealed for that subject is permanently unreadable.
//!
//! Each sealed field carries the key generation that produced it, so a
//! rotated key is reported as `StaleGeneration` rather than as a generic
//! decryption failure.

use serde::{Deserialize, Serialize};
use shred_core::{KeyGeneration, ShredConfig, SubjectId};
use shred_crypto::{generate_details, EncryptedPersonalData, PersonalDataEncryptor};
use std::sync::Arc;

use crate::backend::KeyStoreBackend;
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::record::KeyRecord;
use crate::repository::KeyRepository;

/// Seal attempts before giving up on a subject whose key keeps changing
const SEAL_ATTEMPTS: usize = 3;

/// A personal-data field as stored in an event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedField {
    /// Generation of the subject's key material that sealed `data`
    pub key_generation: KeyGeneration,
    /// Ciphertext (base64 in serialized form)
    pub data: EncryptedPersonalData,
}

pub struct PersonalDataVault {
    repository: Arc<dyn KeyRepository>,
    encryptor: PersonalDataEncryptor,
    default_scheme: String,
}

impl PersonalDataVault {
    /// Build a vault that provisions new subjects with `default_scheme`.
    pub fn new(
        repository: Arc<dyn KeyRepository>,
        encryptor: PersonalDataEncryptor,
        default_scheme: impl Into<String>,
    ) -> KeyStoreResult<Self> {
        let default_scheme = default_scheme.into();
        // Fails early for a scheme we cannot generate keys for.
        generate_details(&default_scheme)?;
        encryptor.registry().lookup(&default_scheme)?;

        Ok(Self {
            repository,
            encryptor,
            default_scheme,
        })
    }

    /// Open the configured key store with the built-in ciphers.
    pub fn from_config(config: &ShredConfig) -> KeyStoreResult<Self> {
        config
            .validate()
            .map_err(|e| KeyStoreError::Config(e.to_string()))?;
        let backend = KeyStoreBackend::open(&config.keystore)?;
        Self::new(
            Arc::new(backend),
            PersonalDataEncryptor::default(),
            config.crypto.default_scheme.clone(),
        )
    }

    pub fn repository(&self) -> &Arc<dyn KeyRepository> {
        &self.repository
    }

    pub fn encryptor(&self) -> &PersonalDataEncryptor {
        &self.encryptor
    }

    pub fn default_scheme(&self) -> &str {
        &self.default_scheme
    }

    /// Encrypt a field for `subject`, provisioning key material on first use.
    ///
    /// The returned field is bound to the generation that was current after
    /// encryption finished. If a rotation replaced the record mid-seal, the
    /// field is sealed again under the new one; `StaleGeneration` if that
    /// keeps happening.
    pub fn seal(&self, subject: &SubjectId, plaintext: &[u8]) -> KeyStoreResult<SealedField> {
        let mut provision = || -> KeyStoreResult<KeyRecord> {
            let record = KeyRecord::new(generate_details(&self.default_scheme)?);
            tracing::debug!(
                subject = %subject,
                scheme = %self.default_scheme,
                generation = %record.generation,
                "provisioned key material"
            );
            Ok(record)
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let record = self.repository.find_or_create(subject, &mut provision)?;
            let data = self.encryptor.encrypt(plaintext, &record.details)?;

            match self.generation(subject)? {
                Some(current) if current == record.generation => {
                    return Ok(SealedField {
                        key_generation: record.generation,
                        data,
                    });
                }
                Some(current) if attempt >= SEAL_ATTEMPTS => {
                    return Err(KeyStoreError::StaleGeneration {
                        current,
                        found: record.generation,
                    });
                }
                None if attempt >= SEAL_ATTEMPTS => {
                    return Err(KeyStoreError::NotFound(subject.clone()));
                }
                _ => {
                    tracing::debug!(attempt, "key material changed during seal, retrying");
                }
            }
        }
    }

    /// Decrypt a field previously sealed for `subject`.
    ///
    /// `NotFound` once the subject has been forgotten.
    pub fn open(&self, subject: &SubjectId, field: &SealedField) -> KeyStoreResult<Vec<u8>> {
        let record = self.repository.find(subject)?;
        if record.generation != field.key_generation {
            return Err(KeyStoreError::StaleGeneration {
                current: record.generation,
                found: field.key_generation,
            });
        }
        Ok(self.encryptor.decrypt(&field.data, &record.details)?)
    }

    /// Crypto-shred `subject`. Idempotent, so erasure requests can be retried.
    ///
    /// Returns whether key material existed.
    pub fn forget(&self, subject: &SubjectId) -> KeyStoreResult<bool> {
        let destroyed = self.repository.destroy(subject)?;
        // Erased subjects must not be identifiable from logs.
        tracing::info!(destroyed, "subject key material destroyed");
        Ok(destroyed)
    }

    /// Current key generation for `subject`, if any.
    pub fn generation(&self, subject: &SubjectId) -> KeyStoreResult<Option<KeyGeneration>> {
        match self.repository.find(subject) {
            Ok(record) => Ok(Some(record.generation)),
            Err(KeyStoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for PersonalDataVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalDataVault")
            .field("subjects", &self.repository.len())
            .field("encryptor", &self.encryptor)
            .field("default_scheme", &self.default_scheme)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryKeyRepository;
    use shred_crypto::{CipherRegistry, CryptoError, AES_256_GCM, XCHACHA20_POLY1305};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Rotates the subject right after each lookup, as a concurrent
    /// `rotate` landing mid-seal would, for the first `rotations` lookups.
    struct RotatingRepository {
        inner: InMemoryKeyRepository,
        rotations: AtomicUsize,
    }

    impl RotatingRepository {
        fn new(rotations: usize) -> Self {
            Self {
                inner: InMemoryKeyRepository::new(),
                rotations: AtomicUsize::new(rotations),
            }
        }
    }

    impl KeyRepository for RotatingRepository {
        fn find(&self, subject: &SubjectId) -> KeyStoreResult<KeyRecord> {
            self.inner.find(subject)
        }

        fn save(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<()> {
            self.inner.save(subject, record)
        }

        fn destroy(&self, subject: &SubjectId) -> KeyStoreResult<bool> {
            self.inner.destroy(subject)
        }

        fn find_or_create(
            &self,
            subject: &SubjectId,
            create: &mut dyn FnMut() -> KeyStoreResult<KeyRecord>,
        ) -> KeyStoreResult<KeyRecord> {
            let record = self.inner.find_or_create(subject, create)?;
            let remaining = self.rotations.load(Ordering::SeqCst);
            if remaining > 0 {
                self.rotations.store(remaining - 1, Ordering::SeqCst);
                let next = KeyRecord::new(generate_details(AES_256_GCM)?);
                self.inner.replace(subject, next)?;
            }
            Ok(record)
        }

        fn replace(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<KeyRecord> {
            self.inner.replace(subject, record)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    fn rotating_vault(rotations: usize) -> PersonalDataVault {
        PersonalDataVault::new(
            Arc::new(RotatingRepository::new(rotations)),
            PersonalDataEncryptor::default(),
            AES_256_GCM,
        )
        .unwrap()
    }

    fn vault() -> PersonalDataVault {
        PersonalDataVault::new(
            Arc::new(InMemoryKeyRepository::new()),
            PersonalDataEncryptor::default(),
            AES_256_GCM,
        )
        .unwrap()
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let vault = vault();
        let alice = SubjectId::new("alice");

        let field = vault.seal(&alice, b"alice@example.com").unwrap();
        assert_eq!(vault.open(&alice, &field).unwrap(), b"alice@example.com");
    }

    #[test]
    fn test_seal_provisions_once_per_subject() {
        let vault = vault();
        let alice = SubjectId::new("alice");

        let email = vault.seal(&alice, b"alice@example.com").unwrap();
        let phone = vault.seal(&alice, b"+1 555 0100").unwrap();

        assert_eq!(email.key_generation, phone.key_generation);
        assert_eq!(vault.repository().len(), 1);
    }

    #[test]
    fn test_subjects_are_isolated() {
        let vault = vault();
        let alice = SubjectId::new("alice");
        let bob = SubjectId::new("bob");

        let field = vault.seal(&alice, b"alice's data").unwrap();
        vault.seal(&bob, b"bob's data").unwrap();

        // Bob's record has a different generation, so the mismatch is caught
        // before any decryption is attempted.
        assert!(matches!(
            vault.open(&bob, &field),
            Err(KeyStoreError::StaleGeneration { .. })
        ));
    }

    #[test]
    fn test_forget_makes_field_unreadable() {
        let vault = vault();
        let alice = SubjectId::new("alice");
        let field = vault.seal(&alice, b"alice@example.com").unwrap();

        assert!(vault.forget(&alice).unwrap());
        assert!(matches!(
            vault.open(&alice, &field),
            Err(KeyStoreError::NotFound(_))
        ));
        assert_eq!(vault.generation(&alice).unwrap(), None);
    }

    #[test]
    fn test_forget_is_idempotent() {
        let vault = vault();
        let alice = SubjectId::new("alice");
        vault.seal(&alice, b"x").unwrap();

        assert!(vault.forget(&alice).unwrap());
        assert!(!vault.forget(&alice).unwrap());
        assert!(!vault.forget(&"never-seen".into()).unwrap());
    }

    #[test]
    fn test_corrupted_field_is_decryption_failure() {
        let vault = vault();
        let alice = SubjectId::new("alice");
        let mut field = vault.seal(&alice, b"alice@example.com").unwrap();

        let mut raw = field.data.to_raw();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        field.data = EncryptedPersonalData::from_raw(raw);

        assert!(matches!(
            vault.open(&alice, &field),
            Err(KeyStoreError::Crypto(CryptoError::DecryptionFailed))
        ));
    }

    #[test]
    fn test_unknown_default_scheme_rejected() {
        let result = PersonalDataVault::new(
            Arc::new(InMemoryKeyRepository::new()),
            PersonalDataEncryptor::default(),
            "rot13",
        );
        assert!(matches!(
            result,
            Err(KeyStoreError::Crypto(CryptoError::UnsupportedScheme(_)))
        ));
    }

    #[test]
    fn test_default_scheme_must_be_registered() {
        let result = PersonalDataVault::new(
            Arc::new(InMemoryKeyRepository::new()),
            PersonalDataEncryptor::new(CipherRegistry::new()),
            XCHACHA20_POLY1305,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config() {
        let config = ShredConfig::from_toml(
            r#"
[crypto]
default_scheme = "xchacha20poly1305"
"#,
        )
        .unwrap();
        let vault = PersonalDataVault::from_config(&config).unwrap();
        let alice = SubjectId::new("alice");

        vault.seal(&alice, b"x").unwrap();
        let record = vault.repository().find(&alice).unwrap();
        assert_eq!(record.details.scheme(), XCHACHA20_POLY1305);
    }

    #[test]
    fn test_sealed_field_json() {
        let vault = vault();
        let field = vault.seal(&"alice".into(), b"alice@example.com").unwrap();

        let json = serde_json::to_value(&field).unwrap();
        assert!(json["data"].is_string());
        assert_eq!(json["key_generation"], field.key_generation.to_string());

        let back: SealedField = serde_json::from_value(json).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn test_seal_during_rotation_binds_current_generation() {
        let vault = rotating_vault(1);
        let alice = SubjectId::new("alice");

        let field = vault.seal(&alice, b"alice@example.com").unwrap();

        assert_eq!(
            vault.generation(&alice).unwrap(),
            Some(field.key_generation)
        );
        assert_eq!(vault.open(&alice, &field).unwrap(), b"alice@example.com");
    }

    #[test]
    fn test_seal_gives_up_when_key_keeps_changing() {
        let vault = rotating_vault(usize::MAX);
        let alice = SubjectId::new("alice");

        assert!(matches!(
            vault.seal(&alice, b"alice@example.com"),
            Err(KeyStoreError::StaleGeneration { .. })
        ));
    }

    #[test]
    fn test_forget_log_omits_subject() {
        use std::io::Write;
        use std::sync::Mutex;
        use tracing_subscriber::fmt::MakeWriter;

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl<'a> MakeWriter<'a> for Captured {
            type Writer = Captured;

            fn make_writer(&'a self) -> Self::Writer {
                self.clone()
            }
        }

        let vault = vault();
        let subject = SubjectId::new("subject-7f3a9c");
        vault.seal(&subject, b"x").unwrap();

        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            assert!(vault.forget(&subject).unwrap());
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("subject key material destroyed"));
        assert!(!output.contains("subject-7f3a9c"));
    }
}
