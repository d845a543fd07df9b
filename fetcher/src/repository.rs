//! Repository client orchestrating the trust pipeline.
//!
//! Every operation runs the full chain from scratch: fetch metadata,
//! authenticate it (unless verification is disabled), fetch and verify the
//! manifest, then answer the query. Nothing is cached between calls.

use std::path::PathBuf;

use crate::config::RepositoryConfig;
use crate::download::Downloader;
use crate::error::{RepositoryError, Result};
use crate::manifest::{Manifest, ManifestDecoder, Module};
use crate::metadata::MetadataFetcher;
use crate::resolver::resolve;
use crate::transport::{HttpTransport, Transport};
use crate::trust::{KeyringSource, PgpKeyring};

/// Client for one LiME module repository.
pub struct Repository {
    config: RepositoryConfig,
    transport: Box<dyn Transport>,
    keyring: Box<dyn KeyringSource>,
}

impl Repository {
    /// Create a client using HTTP and the configured OpenPGP keyring.
    #[must_use]
    pub fn new(config: RepositoryConfig) -> Self {
        let keyring = PgpKeyring::new(config.keyring());
        Self::with_collaborators(config, Box::new(HttpTransport::new()), Box::new(keyring))
    }

    /// Create a client with injected collaborators.
    ///
    /// Tests use this to substitute the network and the trust store.
    #[must_use]
    pub fn with_collaborators(
        config: RepositoryConfig,
        transport: Box<dyn Transport>,
        keyring: Box<dyn KeyringSource>,
    ) -> Self {
        Self {
            config,
            transport,
            keyring,
        }
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Return the verified manifest listing every module.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the metadata or manifest pipeline.
    pub fn list(&self) -> Result<Manifest> {
        let metadata =
            MetadataFetcher::new(&self.config, self.transport.as_ref(), self.keyring.as_ref())
                .fetch()?;
        ManifestDecoder::new(&self.config, self.transport.as_ref()).decode(&metadata.manifest)
    }

    /// Return every module whose version matches `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when nothing matches, or the
    /// first failure of the metadata or manifest pipeline.
    pub fn find(&self, query: &str) -> Result<Vec<Module>> {
        let manifest = self.list()?;
        resolve(&manifest, query)
    }

    /// Download the single module matching `query` and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] or
    /// [`RepositoryError::AmbiguousMatch`] unless exactly one module
    /// matches; nothing is downloaded in either case.
    pub fn get(&self, query: &str) -> Result<PathBuf> {
        let mut matches = self.find(query)?;
        let module = match matches.len() {
            1 => matches.swap_remove(0),
            count => {
                return Err(RepositoryError::AmbiguousMatch {
                    query: query.to_owned(),
                    count,
                });
            }
        };
        log::info!("fetching module {} ({})", module.name, module.version);
        Downloader::new(&self.config, self.transport.as_ref()).download(&module)
    }
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
