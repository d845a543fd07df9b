//! Publisher trust: key fingerprints, the local trust store, and detached
//! signature verification.
//!
//! The metadata fetcher depends only on the [`KeyringSource`] and
//! [`TrustStore`] traits. The OpenPGP implementation lives in [`openpgp`].

pub mod openpgp;

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use self::openpgp::{PgpKeyring, PgpTrustStore};

/// A fixed-width identifier naming a public-key entity.
///
/// Two keys are the same principal iff their fingerprints are bit-identical.
/// Fingerprints display as upper-case hex, matching `gpg --fingerprint`
/// output without spacing.
///
/// # Examples
///
/// ```
/// use limefetch::trust::Fingerprint;
///
/// let fingerprint = Fingerprint::new(vec![0xde, 0xad, 0xbe, 0xef]);
/// assert_eq!(fingerprint.to_string(), "DEADBEEF");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    /// Wrap raw fingerprint bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Return the raw fingerprint bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02X}"))
    }
}

/// Errors raised by trust store backends.
#[derive(Debug, Error)]
pub enum TrustError {
    /// The keyring file is absent or could not be parsed.
    #[error("keyring {} could not be read: {reason}", path.display())]
    KeyringUnreadable {
        /// Path of the keyring file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A public key could not be parsed.
    #[error("invalid public key: {reason}")]
    InvalidKey {
        /// Description of the parse failure.
        reason: String,
    },

    /// The detached signature could not be parsed.
    #[error("invalid detached signature: {reason}")]
    InvalidSignature {
        /// Description of the parse failure.
        reason: String,
    },

    /// No key in the trust store validates the signature.
    #[error("no key in the trust store ({keys} entities) validates the signature")]
    NoValidSigner {
        /// Number of entities that were tried.
        keys: usize,
    },
}

/// A read-only set of trusted public keys.
#[cfg_attr(test, mockall::automock)]
pub trait TrustStore {
    /// Return true when an entity with this primary-key fingerprint is
    /// present.
    fn contains_fingerprint(&self, fingerprint: &Fingerprint) -> bool;

    /// Verify a detached `signature` over `data` against every entity in the
    /// store, returning the fingerprint of the first entity that validates.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::InvalidSignature`] when the signature cannot be
    /// parsed and [`TrustError::NoValidSigner`] when no entity validates it.
    fn verify_detached(&self, data: &[u8], signature: &[u8]) -> Result<Fingerprint, TrustError>;
}

/// Source of publisher keys and of the local trust store.
#[cfg_attr(test, mockall::automock)]
pub trait KeyringSource {
    /// Parse an armored public key and return its fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::InvalidKey`] when the key cannot be parsed.
    fn read_public_key(&self, armored: &[u8]) -> Result<Fingerprint, TrustError>;

    /// Load the local trust store.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::KeyringUnreadable`] when the keyring is missing
    /// or malformed.
    fn load_trust_store(&self) -> Result<Box<dyn TrustStore>, TrustError>;
}
