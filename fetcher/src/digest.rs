//! SHA-256 integrity checks for repository payloads.
//!
//! The repository metadata declares a digest for the compressed manifest and
//! another for its decompressed ("open") form. [`Sha256Digest`] validates
//! those declared values at parse time and [`verify_digest`] compares freshly
//! computed digests against them.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Errors arising from malformed digest strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The value is not a 64-character lowercase hex string.
    #[error("invalid SHA-256 digest \"{value}\": {reason}")]
    Invalid {
        /// The rejected digest string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },
}

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use limefetch::digest::Sha256Digest;
///
/// let hex = "a".repeat(64);
/// let digest = Sha256Digest::try_from(hex.as_str()).expect("valid digest");
/// assert_eq!(digest.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Compute the digest of `data`.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Return true when the SHA-256 digest of `data` equals `expected_hex`.
///
/// The comparison is an exact string match against the lowercase hex
/// encoding of the computed digest.
///
/// # Examples
///
/// ```
/// use limefetch::digest::verify_digest;
///
/// assert!(verify_digest(
///     b"passing checksum test value",
///     "a4fe0d179401df2c292d6a013f9d30521f486185923981e5accaaa20e4a44b7e",
/// ));
/// ```
#[must_use]
pub fn verify_digest(data: &[u8], expected_hex: &str) -> bool {
    Sha256Digest::of(data).as_str() == expected_hex
}

fn validate_sha256(value: &str) -> Result<(), DigestError> {
    let invalid = |reason: String| DigestError::Invalid {
        value: value.to_owned(),
        reason,
    };
    if value.len() != DIGEST_HEX_LEN {
        return Err(invalid(format!(
            "expected {DIGEST_HEX_LEN} hex characters, got {}",
            value.len()
        )));
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(invalid(format!("non-hex character '{bad}'")));
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("digest must be lowercase".to_owned()));
    }
    Ok(())
}
