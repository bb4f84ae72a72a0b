//! Delegate identity keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length in hex characters of a compressed secp256k1 public key.
pub const PUBLIC_KEY_HEX_LEN: usize = 66;

/// Errors raised while parsing a delegate public key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The input is not the length of a compressed key.
    #[error("public key must be {PUBLIC_KEY_HEX_LEN} hex characters, got {0}")]
    InvalidLength(usize),
    /// The input contains a character outside `[0-9a-fA-F]`.
    #[error("public key contains non-hex characters")]
    InvalidEncoding,
}

/// A compressed public key in normalized lowercase hex.
///
/// Delegates are identified by this form everywhere: in the active schedule,
/// in block summaries and in serialized round reports. Construction validates
/// length and encoding, so a held `PublicKey` is always well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(String);

impl PublicKey {
    /// Parses a hex-encoded compressed public key, normalizing to lowercase.
    pub fn new(hex: impl Into<String>) -> Result<Self, KeyError> {
        let raw = hex.into();
        if raw.len() != PUBLIC_KEY_HEX_LEN {
            return Err(KeyError::InvalidLength(raw.len()));
        }
        if !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(KeyError::InvalidEncoding);
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// The normalized hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}
