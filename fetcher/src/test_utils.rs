//! Shared test utilities for the limefetch crate.
//!
//! Builds self-consistent repositories in memory (manifest, compressed
//! manifest, metadata with matching digests, and a signature) and serves
//! them through [`StubTransport`]. [`StubKeyring`] stands in for the OpenPGP
//! trust store with a signature scheme that binds to the signed bytes.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use crate::digest::Sha256Digest;
use crate::transport::{FetchError, Transport};
use crate::trust::{Fingerprint, KeyringSource, TrustError, TrustStore};

/// Base URL every fixture repository is served from.
pub const TEST_BASE_URL: &str = "http://repo.test/";

/// Armored publisher key served at `REPO_SIGNING_KEY.asc`.
pub const PUBLISHER_KEY: &[u8] = b"-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nstub publisher key\n-----END PGP PUBLIC KEY BLOCK-----\n";

/// Location of the compressed manifest within fixture repositories.
pub const MANIFEST_HREF: &str = "repodata/primary.xml.gz";

/// Fingerprint [`StubKeyring`] reports for [`PUBLISHER_KEY`].
#[must_use]
pub fn publisher_fingerprint() -> Fingerprint {
    Fingerprint::new([0x4c; 20])
}

/// Fingerprint of a trusted key that is not the publisher's.
#[must_use]
pub fn other_fingerprint() -> Fingerprint {
    Fingerprint::new([0x7e; 20])
}

/// Gzip-compress `data`.
///
/// # Errors
///
/// Returns an error if the encoder fails.
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256Digest::of(data).to_string()
}

/// The signature [`StubKeyring`] accepts for `data`.
#[must_use]
pub fn stub_signature(data: &[u8]) -> Vec<u8> {
    format!("stub-signature:{}", sha256_hex(data)).into_bytes()
}

/// Manifest XML for one module per entry in `versions`.
#[must_use]
pub fn manifest_xml(versions: &[&str]) -> String {
    let modules: String = versions
        .iter()
        .map(|version| {
            let name = format!("lime-{version}.ko");
            format!(
                concat!(
                    "  <module type=\"lime\">\n",
                    "    <name>{name}</name>\n",
                    "    <arch>x86_64</arch>\n",
                    "    <checksum>{checksum}</checksum>\n",
                    "    <version>{version}</version>\n",
                    "    <packager>lime-compiler</packager>\n",
                    "    <location href=\"modules/{name}\"/>\n",
                    "    <signature href=\"modules/{name}.sig\"/>\n",
                    "    <platform>linux</platform>\n",
                    "  </module>\n"
                ),
                name = name,
                checksum = sha256_hex(name.as_bytes()),
                version = version,
            )
        })
        .collect();
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<modules>\n{modules}</modules>\n")
}

/// Repository metadata declaring a manifest with the given digests.
#[must_use]
pub fn repomd_xml(checksum: &str, open_checksum: &str, size: usize, open_size: usize) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<repomd>\n",
            "  <revision>1487818901</revision>\n",
            "  <data type=\"primary\">\n",
            "    <checksum>{checksum}</checksum>\n",
            "    <open_checksum>{open_checksum}</open_checksum>\n",
            "    <location href=\"{href}\"/>\n",
            "    <timestamp>1487818901</timestamp>\n",
            "    <size>{size}</size>\n",
            "    <open_size>{open_size}</open_size>\n",
            "  </data>\n",
            "</repomd>\n"
        ),
        checksum = checksum,
        open_checksum = open_checksum,
        href = MANIFEST_HREF,
        size = size,
        open_size = open_size,
    )
}

/// The resources of a self-consistent repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRepository {
    /// Decompressed manifest bytes.
    pub manifest: Vec<u8>,
    /// Compressed manifest bytes.
    pub compressed_manifest: Vec<u8>,
    /// Repository metadata declaring the manifest's digests.
    pub metadata: Vec<u8>,
    /// Detached signature over `metadata`.
    pub signature: Vec<u8>,
}

impl FixtureRepository {
    /// Build a repository listing one module per version.
    ///
    /// # Errors
    ///
    /// Returns an error if compressing the manifest fails.
    pub fn with_versions(versions: &[&str]) -> std::io::Result<Self> {
        let manifest = manifest_xml(versions).into_bytes();
        let compressed_manifest = gzip(&manifest)?;
        let metadata = repomd_xml(
            &sha256_hex(&compressed_manifest),
            &sha256_hex(&manifest),
            compressed_manifest.len(),
            manifest.len(),
        )
        .into_bytes();
        let signature = stub_signature(&metadata);
        Ok(Self {
            manifest,
            compressed_manifest,
            metadata,
            signature,
        })
    }

    /// Serve every resource, the publisher key, and each module artifact.
    #[must_use]
    pub fn serve(&self, versions: &[&str]) -> StubTransport {
        let transport = StubTransport::new();
        transport.insert("repodata/repomd.xml", self.metadata.clone());
        transport.insert("repodata/repomd.xml.sig", self.signature.clone());
        transport.insert("REPO_SIGNING_KEY.asc", PUBLISHER_KEY.to_vec());
        transport.insert(MANIFEST_HREF, self.compressed_manifest.clone());
        for version in versions {
            transport.insert(
                &format!("modules/lime-{version}.ko"),
                format!("module for {version}").into_bytes(),
            );
        }
        transport
    }
}

#[derive(Debug, Default)]
struct StubState {
    resources: HashMap<String, Vec<u8>>,
    requests: Vec<String>,
}

/// In-memory transport serving resources under [`TEST_BASE_URL`].
///
/// Clones share state, so a test can keep a handle after moving a clone
/// into a repository client and inspect the requests made.
#[derive(Debug, Clone, Default)]
pub struct StubTransport {
    state: Rc<RefCell<StubState>>,
}

impl StubTransport {
    /// Create a transport serving nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `path` relative to [`TEST_BASE_URL`], replacing any
    /// existing resource.
    pub fn insert(&self, path: &str, body: Vec<u8>) {
        self.state
            .borrow_mut()
            .resources
            .insert(format!("{TEST_BASE_URL}{path}"), body);
    }

    /// Stop serving the resource at `path`.
    pub fn remove(&self, path: &str) {
        self.state
            .borrow_mut()
            .resources
            .remove(&format!("{TEST_BASE_URL}{path}"));
    }

    /// Every URL requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.borrow().requests.clone()
    }

    /// Return true when any request was made for `path`.
    #[must_use]
    pub fn requested(&self, path: &str) -> bool {
        let url = format!("{TEST_BASE_URL}{path}");
        self.state.borrow().requests.iter().any(|r| *r == url)
    }

    fn lookup(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(url.to_owned());
        state
            .resources
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                url: url.to_owned(),
            })
    }
}

impl Transport for StubTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.lookup(url)
    }

    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let body = self.lookup(url)?;
        std::fs::write(dest, body).map_err(|source| FetchError::Write {
            path: dest.to_path_buf(),
            source,
        })
    }
}

/// Keyring source whose trust store holds a fixed set of fingerprints.
///
/// [`PUBLISHER_KEY`] parses to [`publisher_fingerprint`]; any other key is
/// invalid. A signature validates when it equals [`stub_signature`] of the
/// data and at least one key is trusted.
#[derive(Debug, Clone, Default)]
pub struct StubKeyring {
    trusted: Vec<Fingerprint>,
    unreadable: bool,
}

impl StubKeyring {
    /// A keyring trusting the publisher.
    #[must_use]
    pub fn trusting_publisher() -> Self {
        Self::trusting(vec![publisher_fingerprint()])
    }

    /// A keyring trusting exactly `fingerprints`.
    #[must_use]
    pub fn trusting(fingerprints: Vec<Fingerprint>) -> Self {
        Self {
            trusted: fingerprints,
            unreadable: false,
        }
    }

    /// A keyring whose file cannot be read.
    #[must_use]
    pub fn unreadable() -> Self {
        Self {
            trusted: Vec::new(),
            unreadable: true,
        }
    }
}

impl KeyringSource for StubKeyring {
    fn read_public_key(&self, armored: &[u8]) -> Result<Fingerprint, TrustError> {
        if armored == PUBLISHER_KEY {
            Ok(publisher_fingerprint())
        } else {
            Err(TrustError::InvalidKey {
                reason: "unrecognised key block".to_owned(),
            })
        }
    }

    fn load_trust_store(&self) -> Result<Box<dyn TrustStore>, TrustError> {
        if self.unreadable {
            return Err(TrustError::KeyringUnreadable {
                path: "/home/analyst/.gnupg/pubring.gpg".into(),
                reason: "No such file or directory".to_owned(),
            });
        }
        Ok(Box::new(StubTrustStore {
            trusted: self.trusted.clone(),
        }))
    }
}

struct StubTrustStore {
    trusted: Vec<Fingerprint>,
}

impl TrustStore for StubTrustStore {
    fn contains_fingerprint(&self, fingerprint: &Fingerprint) -> bool {
        self.trusted.contains(fingerprint)
    }

    fn verify_detached(&self, data: &[u8], signature: &[u8]) -> Result<Fingerprint, TrustError> {
        if signature != stub_signature(data).as_slice() {
            return Err(TrustError::NoValidSigner {
                keys: self.trusted.len(),
            });
        }
        self.trusted
            .first()
            .cloned()
            .ok_or(TrustError::NoValidSigner { keys: 0 })
    }
}
