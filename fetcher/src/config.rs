//! Repository configuration and its layered resolution.
//!
//! [`RepositoryConfig`] is the immutable configuration consumed by the
//! repository client. It is assembled from built-in defaults, an optional
//! `config.toml`, and command-line overrides, in increasing precedence.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::dirs::{BaseDirs, default_keyring_path};

/// Default LiME module repository.
pub const DEFAULT_BASE_URL: &str = "https://threatresponse-lime-modules.s3.amazonaws.com/";

/// Fixed relative locations of the repository's signed metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryLayout {
    /// Directory holding the metadata file and its signature.
    pub metadata_dir: &'static str,
    /// Repository metadata file name.
    pub metadata_file: &'static str,
    /// Detached signature of the metadata file.
    pub metadata_signature_file: &'static str,
    /// Publisher's armored signing key, relative to the base URL.
    pub signing_key_file: &'static str,
}

impl RepositoryLayout {
    /// The yum-style layout used by LiME module repositories.
    pub const DEFAULT: Self = Self {
        metadata_dir: "repodata/",
        metadata_file: "repomd.xml",
        metadata_signature_file: "repomd.xml.sig",
        signing_key_file: "REPO_SIGNING_KEY.asc",
    };
}

impl Default for RepositoryLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Immutable configuration for one repository client.
///
/// # Examples
///
/// ```
/// use limefetch::config::RepositoryConfig;
///
/// let config = RepositoryConfig::new("/home/analyst/.gnupg/pubring.gpg")
///     .with_base_url("https://mirror.example.test/lime");
/// assert_eq!(
///     config.metadata_url(),
///     "https://mirror.example.test/lime/repodata/repomd.xml"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    base_url: String,
    verify_signatures: bool,
    keyring: PathBuf,
    download_dir: Option<PathBuf>,
    layout: RepositoryLayout,
}

impl RepositoryConfig {
    /// Create a verifying configuration for the default repository using the
    /// keyring at `keyring`.
    #[must_use]
    pub fn new(keyring: impl Into<PathBuf>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            verify_signatures: true,
            keyring: keyring.into(),
            download_dir: None,
            layout: RepositoryLayout::DEFAULT,
        }
    }

    /// Replace the base URL, appending a trailing `/` when missing.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalise_base_url(base_url);
        self
    }

    /// Enable or disable metadata signature verification.
    #[must_use]
    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_signatures = enabled;
        self
    }

    /// Write downloaded modules into `dir` instead of the working directory.
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// The repository base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the metadata trust chain is enforced.
    #[must_use]
    pub fn verify_signatures(&self) -> bool {
        self.verify_signatures
    }

    /// Path of the local OpenPGP keyring.
    #[must_use]
    pub fn keyring(&self) -> &Path {
        &self.keyring
    }

    /// Directory for downloaded modules; `None` means the working directory.
    #[must_use]
    pub fn download_dir(&self) -> Option<&Path> {
        self.download_dir.as_deref()
    }

    /// The fixed relative layout of the repository metadata.
    #[must_use]
    pub fn layout(&self) -> &RepositoryLayout {
        &self.layout
    }

    /// URL of the repository metadata file.
    #[must_use]
    pub fn metadata_url(&self) -> String {
        format!(
            "{}{}{}",
            self.base_url, self.layout.metadata_dir, self.layout.metadata_file
        )
    }

    /// URL of the detached metadata signature.
    #[must_use]
    pub fn metadata_signature_url(&self) -> String {
        format!(
            "{}{}{}",
            self.base_url, self.layout.metadata_dir, self.layout.metadata_signature_file
        )
    }

    /// URL of the publisher's armored signing key.
    #[must_use]
    pub fn signing_key_url(&self) -> String {
        format!("{}{}", self.base_url, self.layout.signing_key_file)
    }

    /// Resolve a repository-relative `href` against the base URL.
    #[must_use]
    pub fn resolve(&self, href: &str) -> String {
        format!("{}{href}", self.base_url)
    }
}

/// Append a trailing `/` to `url` when it is missing.
///
/// # Examples
///
/// ```
/// use limefetch::config::normalise_base_url;
///
/// assert_eq!(normalise_base_url("https://example.test"), "https://example.test/");
/// assert_eq!(normalise_base_url("https://example.test/"), "https://example.test/");
/// ```
#[must_use]
pub fn normalise_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_owned()
    } else {
        format!("{url}/")
    }
}

/// Errors arising while assembling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read configuration file {}", path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid configuration file {}: {reason}", path.display())]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// Verification is enabled but no keyring location could be determined.
    #[error("could not determine the keyring location; pass --keyring or set `keyring` in config.toml")]
    KeyringPathUnknown,
}

/// Settings read from `config.toml`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Repository base URL override.
    pub repository_url: Option<String>,
    /// Whether metadata signatures are verified; defaults to true.
    pub verify_signatures: Option<bool>,
    /// Keyring path override.
    pub keyring: Option<PathBuf>,
}

impl FileConfig {
    /// Load the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load the configuration file at `path`, or defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::trace!("no configuration file at {}", path.display());
            Ok(Self::default())
        }
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Values supplied on the command line; these take precedence over the file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigOverrides {
    /// Repository base URL.
    pub repository_url: Option<String>,
    /// Disable metadata signature verification.
    pub no_verify: bool,
    /// Keyring path.
    pub keyring: Option<PathBuf>,
    /// Directory for downloaded modules.
    pub download_dir: Option<PathBuf>,
}

/// Combine defaults, the file configuration, and command-line overrides.
///
/// # Errors
///
/// Returns [`ConfigError::KeyringPathUnknown`] when verification is enabled
/// and neither an explicit keyring nor a home directory is available.
pub fn resolve_config(
    file: &FileConfig,
    overrides: &ConfigOverrides,
    dirs: &dyn BaseDirs,
) -> Result<RepositoryConfig, ConfigError> {
    let verify = !overrides.no_verify && file.verify_signatures.unwrap_or(true);
    let keyring = overrides
        .keyring
        .clone()
        .or_else(|| file.keyring.clone())
        .or_else(|| default_keyring_path(dirs));
    let keyring = match keyring {
        Some(path) => path,
        None if verify => return Err(ConfigError::KeyringPathUnknown),
        None => PathBuf::new(),
    };

    let base_url = overrides
        .repository_url
        .as_deref()
        .or_else(|| file.repository_url.as_deref())
        .unwrap_or(DEFAULT_BASE_URL);

    let mut config = RepositoryConfig::new(keyring)
        .with_base_url(base_url)
        .with_verification(verify);
    if let Some(dir) = &overrides.download_dir {
        config = config.with_download_dir(dir);
    }
    log::debug!(
        "repository {} (signature verification {})",
        config.base_url(),
        if verify { "enabled" } else { "disabled" }
    );
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
