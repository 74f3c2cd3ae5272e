use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from the personal-data encryption layer.
///
/// No variant ever carries plaintext or key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The details lack a parameter the scheme needs. Not retryable.
    #[error("cryptographic details do not contain parameter '{0}'")]
    MissingParameter(String),

    /// The persisted form of the details is malformed.
    #[error("cannot deserialize cryptographic details: {0}")]
    CannotDeserialize(String),

    /// No cipher is registered for the scheme.
    #[error("unsupported encryption scheme: {0}")]
    UnsupportedScheme(String),

    /// Authenticated decryption rejected the ciphertext/key pair.
    #[error("decryption failed: wrong key generation, corrupted or tampered data")]
    DecryptionFailed,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Details that can never be valid (empty scheme, reserved name, bad key length).
    #[error("invalid cryptographic details: {0}")]
    InvalidDetails(String),
}
