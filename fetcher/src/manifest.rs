//! Module manifest decoding.
//!
//! The manifest is a gzip-compressed XML document listing every module in
//! the repository. [`ManifestDecoder`] fetches it, checks the digest of the
//! compressed bytes, decompresses, checks the digest of the decompressed
//! bytes, and only then hands the document to [`parse_manifest`].

use flate2::read::GzDecoder;
use serde::Deserialize;
use std::io::Read;

use crate::config::RepositoryConfig;
use crate::digest::{Sha256Digest, verify_digest};
use crate::error::{DigestForm, RepositoryError, Result};
use crate::metadata::ManifestDescriptor;
use crate::transport::Transport;

/// A repository-relative reference carried in an `href` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Location {
    /// Path relative to the repository base URL.
    #[serde(rename = "@href", default)]
    pub href: String,
}

impl Location {
    /// Create a location for `href`.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// A kernel module record from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Module {
    /// Module type tag, e.g. `lime`.
    #[serde(rename = "@type", default)]
    pub kind: String,
    /// File name; also the default local file name.
    pub name: String,
    /// Target architecture.
    #[serde(default)]
    pub arch: String,
    /// Declared SHA-256 of the module artifact.
    #[serde(default)]
    pub checksum: String,
    /// Kernel version the module was built for.
    pub version: String,
    /// Identity of the packager.
    #[serde(default)]
    pub packager: String,
    /// Location of the module artifact.
    pub location: Location,
    /// Location of the artifact's detached signature.
    #[serde(default)]
    pub signature: Location,
    /// Platform tag, e.g. `linux`.
    #[serde(default)]
    pub platform: String,
}

/// An ordered sequence of modules in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(rename = "module", default)]
    modules: Vec<Module>,
}

impl Manifest {
    /// Create a manifest from modules in the given order.
    #[must_use]
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    /// The modules in manifest order.
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Consume the manifest, returning its modules.
    #[must_use]
    pub fn into_modules(self) -> Vec<Module> {
        self.modules
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Return true when the manifest lists no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Parse decompressed manifest bytes into a [`Manifest`].
///
/// A well-formed document without `module` elements yields an empty
/// manifest; malformed markup is an error.
///
/// # Errors
///
/// Returns [`RepositoryError::ManifestParse`] when the bytes are not valid
/// UTF-8 XML or a module lacks a required field.
///
/// # Examples
///
/// ```
/// use limefetch::manifest::parse_manifest;
///
/// let xml = br#"<modules>
///   <module type="lime">
///     <name>lime-4.2.0-17-generic.ko</name>
///     <version>4.2.0-17-generic</version>
///     <location href="modules/lime-4.2.0-17-generic.ko"/>
///   </module>
/// </modules>"#;
/// let manifest = parse_manifest(xml).expect("valid manifest");
/// assert_eq!(manifest.modules()[0].version, "4.2.0-17-generic");
/// ```
pub fn parse_manifest(bytes: &[u8]) -> Result<Manifest> {
    let parse_error = |reason: String| RepositoryError::ManifestParse { reason };
    let text = std::str::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;
    quick_xml::de::from_str(text).map_err(|e| parse_error(e.to_string()))
}

/// Decompress a single-member gzip stream.
///
/// # Errors
///
/// Returns [`RepositoryError::Decompression`] for corrupt or truncated input.
pub fn gunzip(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut data = Vec::new();
    decoder
        .read_to_end(&mut data)
        .map_err(|e| RepositoryError::Decompression {
            reason: e.to_string(),
        })?;
    Ok(data)
}

/// Fetches and integrity-checks the manifest named by repository metadata.
pub struct ManifestDecoder<'a> {
    config: &'a RepositoryConfig,
    transport: &'a dyn Transport,
}

impl<'a> ManifestDecoder<'a> {
    /// Create a decoder over the given collaborators.
    #[must_use]
    pub fn new(config: &'a RepositoryConfig, transport: &'a dyn Transport) -> Self {
        Self { config, transport }
    }

    /// Fetch, verify, decompress, verify again, and parse the manifest.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the fetch fails, `ChecksumMismatch` if either
    /// digest differs from its declared value, `Decompression` for a corrupt
    /// stream, and `ManifestParse` for malformed markup.
    pub fn decode(&self, descriptor: &ManifestDescriptor) -> Result<Manifest> {
        let url = self.config.resolve(&descriptor.location.href);
        log::debug!("fetching module manifest: {url}");
        let compressed = self.transport.fetch(&url)?;
        ensure_digest(&compressed, &descriptor.checksum, DigestForm::Compressed)?;
        if descriptor.size != 0 && descriptor.size != compressed.len() as u64 {
            log::debug!(
                "manifest declares {} compressed bytes, received {}",
                descriptor.size,
                compressed.len()
            );
        }

        let data = gunzip(&compressed)?;
        ensure_digest(&data, &descriptor.open_checksum, DigestForm::Decompressed)?;

        let manifest = parse_manifest(&data)?;
        log::debug!("manifest lists {} modules", manifest.len());
        Ok(manifest)
    }
}

fn ensure_digest(data: &[u8], expected: &Sha256Digest, form: DigestForm) -> Result<()> {
    if verify_digest(data, expected.as_str()) {
        log::trace!("{form} manifest digest {expected} verified");
        return Ok(());
    }
    Err(RepositoryError::ChecksumMismatch {
        form,
        expected: expected.to_string(),
        actual: Sha256Digest::of(data).to_string(),
    })
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
