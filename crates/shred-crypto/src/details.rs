//! Per-subject cryptographic details
//!
//! `CryptographicDetails` holds everything needed to encrypt and decrypt the
//! personal data of one data subject: the scheme identifier and the named
//! parameters that scheme reads (for the built-in schemes, a single `key`).
//!
//! Persisted form is a flat string map:
//! ```text
//! { "encryption": "<scheme id>", "<param>": "<base64 value>", ... }
//! ```
//! `encryption` is reserved, so no parameter may use that name.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use zeroize::Zeroizing;

use crate::codec;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::SymmetricKey;

/// Reserved key holding the scheme identifier in the serialized map
pub const SCHEME_FIELD: &str = "encryption";

/// AES-256-GCM, random 96-bit nonce per seal
pub const AES_256_GCM: &str = "aes256gcm";

/// XChaCha20-Poly1305, random 192-bit nonce per seal
pub const XCHACHA20_POLY1305: &str = "xchacha20poly1305";

/// Parameter name of the symmetric key used by the built-in schemes
pub const KEY_PARAMETER: &str = "key";

/// A raw parameter value, zeroized on drop
pub type ParameterValue = Zeroizing<Vec<u8>>;

/// Cryptographic details for a single data subject.
///
/// The typed variants carry exactly what their scheme needs, so a value built
/// through [`CryptographicDetails::aes256gcm`] can never hit
/// `MissingParameter`. `Generic` keeps any other shape verbatim: schemes this
/// build does not know, or extra parameters written by older writers.
#[derive(Clone, PartialEq, Eq)]
pub enum CryptographicDetails {
    Aes256Gcm { key: SymmetricKey },
    XChaCha20Poly1305 { key: SymmetricKey },
    Generic(GenericDetails),
}

/// Scheme id plus an untyped parameter bag.
#[derive(Clone, PartialEq, Eq)]
pub struct GenericDetails {
    scheme: String,
    parameters: BTreeMap<String, ParameterValue>,
}

impl CryptographicDetails {
    /// Build details from a scheme id and named raw parameters.
    ///
    /// Parameter completeness is not checked here; a missing parameter only
    /// surfaces when a cipher asks for it. When the parameters are exactly
    /// what a built-in scheme needs, the typed variant is returned.
    pub fn new<S, I, K, V>(scheme: S, parameters: I) -> CryptoResult<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let scheme = scheme.into();
        if scheme.is_empty() {
            return Err(CryptoError::InvalidDetails(
                "encryption scheme must not be empty".into(),
            ));
        }

        let mut map: BTreeMap<String, ParameterValue> = BTreeMap::new();
        for (name, value) in parameters {
            let name = name.into();
            if name == SCHEME_FIELD {
                return Err(CryptoError::InvalidDetails(format!(
                    "parameter name '{SCHEME_FIELD}' is reserved"
                )));
            }
            map.insert(name, Zeroizing::new(value.into()));
        }

        if let Some(typed) = lift(&scheme, &map) {
            return Ok(typed);
        }

        Ok(Self::Generic(GenericDetails {
            scheme,
            parameters: map,
        }))
    }

    pub fn aes256gcm(key: SymmetricKey) -> Self {
        Self::Aes256Gcm { key }
    }

    pub fn xchacha20poly1305(key: SymmetricKey) -> Self {
        Self::XChaCha20Poly1305 { key }
    }

    /// The encryption scheme these details were created for.
    pub fn scheme(&self) -> &str {
        match self {
            Self::Aes256Gcm { .. } => AES_256_GCM,
            Self::XChaCha20Poly1305 { .. } => XCHACHA20_POLY1305,
            Self::Generic(generic) => &generic.scheme,
        }
    }

    /// Look up a named parameter.
    pub fn parameter(&self, name: &str) -> CryptoResult<&[u8]> {
        match self {
            Self::Aes256Gcm { key } | Self::XChaCha20Poly1305 { key } if name == KEY_PARAMETER => {
                Ok(key.as_bytes().as_slice())
            }
            Self::Generic(generic) => generic
                .parameters
                .get(name)
                .map(|value| value.as_slice())
                .ok_or_else(|| CryptoError::MissingParameter(name.to_string())),
            _ => Err(CryptoError::MissingParameter(name.to_string())),
        }
    }

    /// Names of all parameters present, in sorted order.
    pub fn parameter_names(&self) -> Vec<&str> {
        match self {
            Self::Aes256Gcm { .. } | Self::XChaCha20Poly1305 { .. } => vec![KEY_PARAMETER],
            Self::Generic(generic) => generic.parameters.keys().map(String::as_str).collect(),
        }
    }

    /// Flat, text-only persisted form.
    pub fn serialize(&self) -> BTreeMap<String, String> {
        let mut out: BTreeMap<String, String> = self
            .parameter_names()
            .into_iter()
            .filter_map(|name| {
                self.parameter(name)
                    .ok()
                    .map(|value| (name.to_string(), codec::encode(value)))
            })
            .collect();
        out.insert(SCHEME_FIELD.to_string(), self.scheme().to_string());
        out
    }

    /// Rebuild details from their persisted form.
    pub fn deserialize<I, K, V>(data: I) -> CryptoResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut scheme = None;
        let mut parameters = Vec::new();
        for (name, value) in data {
            let (name, value) = (name.as_ref(), value.as_ref());
            if name == SCHEME_FIELD {
                scheme = Some(value.to_string());
            } else {
                let decoded = codec::decode(value).map_err(|_| {
                    CryptoError::CannotDeserialize(format!(
                        "parameter '{name}' is not valid base64"
                    ))
                })?;
                parameters.push((name.to_string(), decoded));
            }
        }

        let scheme = scheme.ok_or_else(|| {
            CryptoError::CannotDeserialize(
                "encryption type could not be identified from serialized form".into(),
            )
        })?;

        Self::new(scheme, parameters).map_err(|e| CryptoError::CannotDeserialize(e.to_string()))
    }
}

fn lift(scheme: &str, parameters: &BTreeMap<String, ParameterValue>) -> Option<CryptographicDetails> {
    if parameters.len() != 1 {
        return None;
    }
    let key = SymmetricKey::from_slice(parameters.get(KEY_PARAMETER)?).ok()?;
    match scheme {
        AES_256_GCM => Some(CryptographicDetails::Aes256Gcm { key }),
        XCHACHA20_POLY1305 => Some(CryptographicDetails::XChaCha20Poly1305 { key }),
        _ => None,
    }
}

impl std::fmt::Debug for CryptographicDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptographicDetails")
            .field("scheme", &self.scheme())
            .field("parameters", &self.parameter_names())
            .finish_non_exhaustive()
    }
}

impl Serialize for CryptographicDetails {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flat = CryptographicDetails::serialize(self);
        let mut map = serializer.serialize_map(Some(flat.len()))?;
        for (name, value) in &flat {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CryptographicDetails {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flat = BTreeMap::<String, String>::deserialize(deserializer)?;
        CryptographicDetails::deserialize(&flat).map_err(D::Error::custom)
    }
}
