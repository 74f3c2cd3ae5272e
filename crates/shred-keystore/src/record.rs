//! Stored key material for one subject

use serde::{Deserialize, Serialize};
use shred_core::KeyGeneration;
use shred_crypto::CryptographicDetails;
use std::time::{SystemTime, UNIX_EPOCH};

/// One generation of a subject's key material.
///
/// Persisted as JSON; `details` uses its flat `encryption` + base64 map form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub generation: KeyGeneration,
    /// Unix timestamp (seconds) the generation was minted
    pub created_at: u64,
    pub details: CryptographicDetails,
}

impl KeyRecord {
    /// Wrap details in a freshly minted generation.
    pub fn new(details: CryptographicDetails) -> Self {
        Self {
            generation: KeyGeneration::new(),
            created_at: now_epoch(),
            details,
        }
    }
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
