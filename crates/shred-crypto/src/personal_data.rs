//! Encrypted personal data
//!
//! An opaque ciphertext blob. Only the cipher that produced it can interpret
//! the bytes; everything else stores and returns them verbatim. The blob
//! outlives its key: once the subject's details are destroyed the bytes stay
//! in the event history but can no longer be opened.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec;
use crate::error::CryptoResult;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncryptedPersonalData {
    data: Vec<u8>,
}

impl EncryptedPersonalData {
    /// Wrap ciphertext bytes without interpreting them.
    pub fn from_raw(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn to_raw(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Persisted form: the raw bytes themselves.
    pub fn serialize(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn deserialize(data: impl Into<Vec<u8>>) -> Self {
        Self::from_raw(data)
    }

    /// Text form for envelopes that only carry strings.
    pub fn to_base64(&self) -> String {
        codec::encode(&self.data)
    }

    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        codec::decode(s).map(Self::from_raw)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for EncryptedPersonalData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptedPersonalData({} bytes)", self.data.len())
    }
}

/// Serde form is base64 text, so the blob can sit inside JSON event payloads.
impl Serialize for EncryptedPersonalData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for EncryptedPersonalData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(D::Error::custom)
    }
}
