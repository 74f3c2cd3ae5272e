//! Pluggable cipher contract and the scheme → cipher registry

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::aes::Aes256GcmCipher;
use crate::details::CryptographicDetails;
use crate::error::{CryptoError, CryptoResult};
use crate::xchacha::XChaCha20Poly1305Cipher;

/// An authenticated cipher for one scheme identifier.
///
/// Implementations read their inputs from the details via
/// [`CryptographicDetails::parameter`] and must fail `open` with
/// [`CryptoError::DecryptionFailed`] on any integrity failure.
pub trait Cipher: Send + Sync {
    /// Scheme identifier this cipher serves (the `encryption` field).
    fn scheme(&self) -> &str;

    /// Parameter names the details must carry.
    fn required_parameters(&self) -> &[&str];

    fn seal(&self, plaintext: &[u8], details: &CryptographicDetails) -> CryptoResult<Vec<u8>>;

    fn open(&self, ciphertext: &[u8], details: &CryptographicDetails) -> CryptoResult<Vec<u8>>;
}

/// Maps scheme identifiers to cipher implementations.
#[derive(Clone, Default)]
pub struct CipherRegistry {
    ciphers: BTreeMap<String, Arc<dyn Cipher>>,
}

impl CipherRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in scheme.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Aes256GcmCipher);
        registry.register(XChaCha20Poly1305Cipher);
        registry
    }

    /// Register a cipher, replacing any previous one for the same scheme.
    pub fn register(&mut self, cipher: impl Cipher + 'static) {
        self.ciphers
            .insert(cipher.scheme().to_string(), Arc::new(cipher));
    }

    pub fn lookup(&self, scheme: &str) -> CryptoResult<&dyn Cipher> {
        self.ciphers
            .get(scheme)
            .map(|cipher| cipher.as_ref())
            .ok_or_else(|| CryptoError::UnsupportedScheme(scheme.to_string()))
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.ciphers.contains_key(scheme)
    }

    /// Registered scheme ids, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        self.ciphers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for CipherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}
