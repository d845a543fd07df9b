//! OpenPGP-backed trust store using the `pgp` crate.
//!
//! The trust store is the user's binary GnuPG public keyring (conventionally
//! `~/.gnupg/pubring.gpg`). It is read once per verification and never
//! written.

use pgp::types::KeyTrait;
use pgp::{Deserializable, SignedPublicKey, StandaloneSignature};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use super::{Fingerprint, KeyringSource, TrustError, TrustStore};

/// Leading bytes of an ASCII-armored OpenPGP block.
const ARMOR_PREFIX: &[u8] = b"-----BEGIN PGP";

/// Keyring source reading the trust store from a keyring file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgpKeyring {
    path: PathBuf,
}

impl PgpKeyring {
    /// Create a source for the keyring at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the keyring path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyringSource for PgpKeyring {
    fn read_public_key(&self, armored: &[u8]) -> Result<Fingerprint, TrustError> {
        let (key, _headers) = SignedPublicKey::from_armor_single(Cursor::new(armored))
            .map_err(|e| TrustError::InvalidKey {
                reason: e.to_string(),
            })?;
        Ok(Fingerprint::new(key.fingerprint()))
    }

    fn load_trust_store(&self) -> Result<Box<dyn TrustStore>, TrustError> {
        Ok(Box::new(PgpTrustStore::load(&self.path)?))
    }
}

/// The set of public-key entities parsed from a keyring.
#[derive(Debug, Clone)]
pub struct PgpTrustStore {
    keys: Vec<SignedPublicKey>,
}

impl PgpTrustStore {
    /// Load every entity from the binary keyring at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::KeyringUnreadable`] when the file is missing or
    /// unreadable, or when none of its entities can be parsed. Individual
    /// unparseable entities are skipped with a warning.
    pub fn load(path: &Path) -> Result<Self, TrustError> {
        let unreadable = |reason: String| TrustError::KeyringUnreadable {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
        let store = Self::from_reader(BufReader::new(file)).map_err(unreadable)?;
        log::debug!(
            "loaded {} entities from keyring {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Build a store from already-parsed keys.
    #[must_use]
    pub fn from_keys(keys: Vec<SignedPublicKey>) -> Self {
        Self { keys }
    }

    /// Return the number of entities in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Return true when the store holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn from_reader(reader: impl Read) -> Result<Self, String> {
        Self::from_entities(SignedPublicKey::from_bytes_many(reader))
    }

    /// Keep every entity that parsed, skipping the rest.
    ///
    /// A keyring where nothing parsed but something failed is an error.
    fn from_entities<E: std::fmt::Display>(
        entities: impl IntoIterator<Item = Result<SignedPublicKey, E>>,
    ) -> Result<Self, String> {
        let mut keys = Vec::new();
        let mut last_failure = None;
        for entity in entities {
            match entity {
                Ok(key) => keys.push(key),
                Err(e) => {
                    log::warn!("skipping unusable keyring entity: {e}");
                    last_failure = Some(e.to_string());
                }
            }
        }
        match last_failure {
            Some(reason) if keys.is_empty() => Err(format!("no usable entities: {reason}")),
            _ => Ok(Self { keys }),
        }
    }

    /// Return the primary-key fingerprint of the first entity whose primary
    /// key or any subkey validates `signature` over `data`.
    fn find_signer(&self, signature: &StandaloneSignature, data: &[u8]) -> Option<Fingerprint> {
        self.keys.iter().find_map(|entity| {
            let primary_valid = signature.verify(entity, data).is_ok();
            let subkey_valid = || {
                entity
                    .public_subkeys
                    .iter()
                    .any(|subkey| signature.verify(subkey, data).is_ok())
            };
            (primary_valid || subkey_valid()).then(|| Fingerprint::new(entity.fingerprint()))
        })
    }
}

impl TrustStore for PgpTrustStore {
    fn contains_fingerprint(&self, fingerprint: &Fingerprint) -> bool {
        self.keys
            .iter()
            .any(|entity| entity.fingerprint().as_slice() == fingerprint.as_bytes())
    }

    fn verify_detached(&self, data: &[u8], signature: &[u8]) -> Result<Fingerprint, TrustError> {
        let signature = parse_signature(signature)?;
        self.find_signer(&signature, data)
            .ok_or_else(|| TrustError::NoValidSigner {
                keys: self.keys.len(),
            })
    }
}

/// Parse a detached signature in binary or ASCII-armored form.
fn parse_signature(bytes: &[u8]) -> Result<StandaloneSignature, TrustError> {
    let parsed = if bytes.starts_with(ARMOR_PREFIX) {
        StandaloneSignature::from_armor_single(Cursor::new(bytes)).map(|(signature, _)| signature)
    } else {
        StandaloneSignature::from_bytes(Cursor::new(bytes))
    };
    parsed.map_err(|e| TrustError::InvalidSignature {
        reason: e.to_string(),
    })
}
