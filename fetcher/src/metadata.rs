//! Repository metadata retrieval and authentication.
//!
//! The metadata document (`repodata/repomd.xml`) names the module manifest
//! and declares its digests. When verification is enabled the raw document
//! is only parsed after the publisher key has been found in the local
//! keyring and a trusted key has validated the detached signature.

use serde::Deserialize;

use crate::config::RepositoryConfig;
use crate::digest::Sha256Digest;
use crate::error::{RepositoryError, Result};
use crate::manifest::Location;
use crate::transport::Transport;
use crate::trust::{KeyringSource, TrustError};

/// Descriptor type of the module manifest within the metadata.
pub const PRIMARY_DATA_TYPE: &str = "primary";

/// The manifest descriptor embedded in repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestDescriptor {
    /// Declared descriptor type, normally `primary`.
    #[serde(rename = "@type", default)]
    pub kind: String,
    /// Digest of the compressed manifest.
    pub checksum: Sha256Digest,
    /// Digest of the decompressed manifest.
    pub open_checksum: Sha256Digest,
    /// Location of the compressed manifest, relative to the base URL.
    pub location: Location,
    /// Publication timestamp as declared.
    #[serde(default)]
    pub timestamp: String,
    /// Declared compressed size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Declared decompressed size in bytes.
    #[serde(default)]
    pub open_size: u64,
}

/// Parsed repository metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMetadata {
    /// Repository revision identifier.
    pub revision: String,
    /// Descriptor of the module manifest.
    pub manifest: ManifestDescriptor,
}

#[derive(Deserialize)]
struct RepoMetadataDocument {
    #[serde(default)]
    revision: String,
    #[serde(rename = "data", default)]
    data: Vec<ManifestDescriptor>,
}

/// Parse a repository metadata document.
///
/// When several `data` blocks are present the `primary` one is selected,
/// falling back to the first.
///
/// # Errors
///
/// Returns [`RepositoryError::MetadataParse`] if the document is not valid
/// UTF-8 XML, a declared digest is malformed, or no descriptor is present.
pub fn parse_repo_metadata(bytes: &[u8]) -> Result<RepoMetadata> {
    let parse_error = |reason: String| RepositoryError::MetadataParse { reason };
    let text = std::str::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;
    let document: RepoMetadataDocument =
        quick_xml::de::from_str(text).map_err(|e| parse_error(e.to_string()))?;

    let revision = document.revision;
    let mut descriptors = document.data;
    let index = descriptors
        .iter()
        .position(|data| data.kind == PRIMARY_DATA_TYPE)
        .unwrap_or(0);
    if index >= descriptors.len() {
        return Err(parse_error("no manifest descriptor".to_owned()));
    }
    let manifest = descriptors.swap_remove(index);
    Ok(RepoMetadata { revision, manifest })
}

/// Retrieves repository metadata, enforcing the publisher trust chain.
pub struct MetadataFetcher<'a> {
    config: &'a RepositoryConfig,
    transport: &'a dyn Transport,
    keyring: &'a dyn KeyringSource,
}

impl<'a> MetadataFetcher<'a> {
    /// Create a fetcher over the given collaborators.
    #[must_use]
    pub fn new(
        config: &'a RepositoryConfig,
        transport: &'a dyn Transport,
        keyring: &'a dyn KeyringSource,
    ) -> Self {
        Self {
            config,
            transport,
            keyring,
        }
    }

    /// Fetch, authenticate, and parse the repository metadata.
    ///
    /// With verification disabled no key or signature is fetched. Otherwise
    /// the publisher key must be present in the local keyring and some
    /// trusted entity must validate the detached signature over the raw
    /// metadata bytes.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the chain: `Network`, `InvalidSigningKey`,
    /// `KeyringLoad`, `KeyNotTrusted`, `SignatureVerification`, or
    /// `MetadataParse`.
    pub fn fetch(&self) -> Result<RepoMetadata> {
        let url = self.config.metadata_url();
        log::debug!("fetching repo metadata: {url}");
        let raw = self.transport.fetch(&url)?;

        if self.config.verify_signatures() {
            self.authenticate(&raw)?;
        } else {
            log::warn!("signature verification disabled; repository metadata is not authenticated");
        }

        let metadata = parse_repo_metadata(&raw)?;
        log::debug!(
            "repository revision {} declares manifest {}",
            metadata.revision,
            metadata.manifest.location.href
        );
        Ok(metadata)
    }

    fn authenticate(&self, raw: &[u8]) -> Result<()> {
        let key_url = self.config.signing_key_url();
        log::debug!("fetching repo signing key: {key_url}");
        let armored = self.transport.fetch(&key_url)?;
        let fingerprint = self
            .keyring
            .read_public_key(&armored)
            .map_err(|e| match e {
                TrustError::InvalidKey { reason } => RepositoryError::InvalidSigningKey {
                    url: key_url.clone(),
                    reason,
                },
                other => other.into(),
            })?;

        let store = self.keyring.load_trust_store()?;
        if !store.contains_fingerprint(&fingerprint) {
            return Err(RepositoryError::KeyNotTrusted {
                fingerprint,
                keyring: self.config.keyring().to_path_buf(),
            });
        }
        log::debug!("found key with fingerprint {fingerprint} in keyring");

        let signature_url = self.config.metadata_signature_url();
        log::debug!("fetching repo metadata signature: {signature_url}");
        let signature = self.transport.fetch(&signature_url)?;

        // Any trusted entity may sign, not only the fetched publisher key.
        let signer = store.verify_detached(raw, &signature)?;
        if signer == fingerprint {
            log::debug!("repository metadata signed by {signer}");
        } else {
            log::warn!(
                "repository metadata signed by trusted key {signer}, not by publisher key {fingerprint}"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
