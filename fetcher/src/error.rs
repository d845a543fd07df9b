//! Error types for repository operations.
//!
//! Every stage of the trust pipeline is fail-fast: the first error aborts the
//! operation and is returned to the caller with enough context (URL, digest,
//! fingerprint, path) to diagnose without re-running verbosely.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::FetchError;
use crate::trust::{Fingerprint, TrustError};

/// Which form of the manifest a digest was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestForm {
    /// The gzip-compressed transport form.
    Compressed,
    /// The decompressed ("open") form.
    Decompressed,
}

impl fmt::Display for DigestForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compressed => write!(f, "compressed"),
            Self::Decompressed => write!(f, "decompressed"),
        }
    }
}

/// Errors that can occur while listing, finding, or fetching modules.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A fetch failed: DNS, connection, timeout, or non-success status.
    #[error("network error fetching {url}: {reason}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// The local keyring is missing or unreadable.
    #[error("error loading user keyring {}: {reason}", path.display())]
    KeyringLoad {
        /// Path of the keyring file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The publisher's signing key could not be parsed.
    #[error("error reading repository signing key from {url}: {reason}")]
    InvalidSigningKey {
        /// URL the key was fetched from.
        url: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// The publisher's key is not present in the local keyring.
    #[error(
        "repository signing key {fingerprint} is not in keyring {}; export it there with `gpg --export {fingerprint} > {}` or pass --keyring",
        keyring.display(),
        keyring.display()
    )]
    KeyNotTrusted {
        /// Fingerprint of the fetched publisher key.
        fingerprint: Fingerprint,
        /// Path of the keyring that was searched.
        keyring: PathBuf,
    },

    /// No trusted key validates the metadata's detached signature.
    #[error("repository metadata signature verification failed: {reason}")]
    SignatureVerification {
        /// Description of the failure.
        reason: String,
    },

    /// A manifest digest did not match its declared value.
    #[error("manifest {form} checksum mismatch: expected {expected}, found {actual}")]
    ChecksumMismatch {
        /// Which manifest form was hashed.
        form: DigestForm,
        /// The digest declared by the repository metadata.
        expected: String,
        /// The digest computed from the fetched bytes.
        actual: String,
    },

    /// The compressed manifest is not a valid gzip stream.
    #[error("manifest decompression failed: {reason}")]
    Decompression {
        /// Description of the failure.
        reason: String,
    },

    /// The repository metadata document is malformed.
    #[error("invalid repository metadata: {reason}")]
    MetadataParse {
        /// Description of the parse error.
        reason: String,
    },

    /// The module manifest document is malformed.
    #[error("invalid module manifest: {reason}")]
    ManifestParse {
        /// Description of the parse error.
        reason: String,
    },

    /// The version query could not be compiled into a pattern.
    #[error("invalid version query \"{query}\": {reason}")]
    InvalidQuery {
        /// The rejected query.
        query: String,
        /// Description of the failure.
        reason: String,
    },

    /// No module version matches the query.
    #[error("module version {query} not found")]
    NotFound {
        /// The query that matched nothing.
        query: String,
    },

    /// More than one module matches a query that must select exactly one.
    #[error("multiple matches ({count}) for: {query}")]
    AmbiguousMatch {
        /// The ambiguous query.
        query: String,
        /// Number of matching modules.
        count: usize,
    },

    /// Writing a downloaded module failed.
    #[error("download to {} failed: {reason}", path.display())]
    Download {
        /// Local destination path.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Configuration could not be assembled.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing command output failed.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<FetchError> for RepositoryError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Http { url, reason } => Self::Network { url, reason },
            FetchError::NotFound { url } => Self::Network {
                url,
                reason: "not found (HTTP 404)".to_owned(),
            },
            FetchError::Write { path, source } => Self::Download {
                path,
                reason: source.to_string(),
            },
        }
    }
}

impl From<TrustError> for RepositoryError {
    fn from(err: TrustError) -> Self {
        match err {
            TrustError::KeyringUnreadable { path, reason } => Self::KeyringLoad { path, reason },
            TrustError::InvalidKey { reason } => Self::InvalidSigningKey {
                url: String::new(),
                reason,
            },
            other @ (TrustError::InvalidSignature { .. } | TrustError::NoValidSigner { .. }) => {
                Self::SignatureVerification {
                    reason: other.to_string(),
                }
            }
        }
    }
}

/// Result type alias using [`RepositoryError`].
pub type Result<T> = std::result::Result<T, RepositoryError>;
