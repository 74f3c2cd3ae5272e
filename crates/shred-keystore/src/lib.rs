//! shred-keystore: per-subject key repository and crypto-shredding vault
//!
//! The repository maps each data subject to exactly one live `KeyRecord`.
//! `PersonalDataVault` ties a repository to a `PersonalDataEncryptor`:
//!
//! - `seal` provisions key material on first use and encrypts a field
//! - `open` decrypts a field with the subject's current record
//! - `forget` destroys the record (the erasure itself)
//! - `rotate` / `reseal` move a subject to a new key generation
//!
//! Backends:
//! - `InMemoryKeyRepository`: process-local, for tests and ephemeral use
//! - `JsonFileKeyRepository`: single JSON file, atomically rewritten

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;
pub mod record;
pub mod repository;
pub mod rotate;
pub mod vault;

pub use backend::KeyStoreBackend;
pub use error::{KeyStoreError, KeyStoreResult};
pub use file::JsonFileKeyRepository;
pub use memory::InMemoryKeyRepository;
pub use record::KeyRecord;
pub use repository::KeyRepository;
pub use rotate::RotationResult;
pub use vault::{PersonalDataVault, SealedField};
