//! shred-crypto: crypto-shredding primitives for event-sourced personal data
//!
//! Every data subject gets their own key material (`CryptographicDetails`).
//! Personal data fields are sealed under it before they enter an immutable
//! event, and the event stores only the opaque `EncryptedPersonalData`.
//! Erasing a subject means destroying their details: the events stay intact
//! for replay and audit, but the sealed fields can never be opened again.
//!
//! ```text
//! CryptographicDetails { encryption: "aes256gcm", key }   (one per subject)
//!   │
//!   ▼
//! PersonalDataEncryptor ── CipherRegistry ── scheme id → Cipher
//!   │                                          ├── aes256gcm
//!   ▼                                          └── xchacha20poly1305
//! EncryptedPersonalData (opaque bytes, stored verbatim in the event)
//! ```
//!
//! Schemes are identified by the string tag stored with the key material, so
//! several schemes and scheme versions can coexist across subjects without a
//! global migration.

pub mod aes;
pub mod cipher;
pub mod codec;
pub mod details;
pub mod encryptor;
pub mod error;
pub mod keys;
pub mod personal_data;
pub mod xchacha;

pub use aes::Aes256GcmCipher;
pub use cipher::{Cipher, CipherRegistry};
pub use details::{
    CryptographicDetails, AES_256_GCM, KEY_PARAMETER, SCHEME_FIELD, XCHACHA20_POLY1305,
};
pub use encryptor::PersonalDataEncryptor;
pub use error::{CryptoError, CryptoResult};
pub use keys::{generate_details, generate_key, SymmetricKey};
pub use personal_data::EncryptedPersonalData;
pub use xchacha::XChaCha20Poly1305Cipher;

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AEAD authentication tag (GCM and Poly1305)
pub const TAG_SIZE: usize = 16;
