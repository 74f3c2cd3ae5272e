use shred_core::{KeyGeneration, SubjectId};
use shred_crypto::CryptoError;
use thiserror::Error;

pub type KeyStoreResult<T> = Result<T, KeyStoreError>;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// No key material: never provisioned, or already crypto-shredded.
    #[error("no key material for subject {0}")]
    NotFound(SubjectId),

    /// The field was sealed under a generation that is no longer current.
    #[error("field sealed under key generation {found}, current generation is {current}")]
    StaleGeneration {
        current: KeyGeneration,
        found: KeyGeneration,
    },

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("key store storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("config error: {0}")]
    Config(String),
}
