//! Module artifact download.
//!
//! Streams a module's bytes to `<dir>/<module name>`, overwriting any file
//! already there. The artifact's declared checksum is not compared against
//! the downloaded bytes, and a transfer that fails part-way leaves the
//! partial file in place.

use std::path::{Component, Path, PathBuf};

use crate::config::RepositoryConfig;
use crate::error::{RepositoryError, Result};
use crate::manifest::Module;
use crate::transport::Transport;

/// Writes module artifacts to local storage.
pub struct Downloader<'a> {
    config: &'a RepositoryConfig,
    transport: &'a dyn Transport,
}

impl<'a> Downloader<'a> {
    /// Create a downloader over the given collaborators.
    #[must_use]
    pub fn new(config: &'a RepositoryConfig, transport: &'a dyn Transport) -> Self {
        Self { config, transport }
    }

    /// Download `module` and return the local path it was written to.
    ///
    /// The path is the module name, joined onto the configured download
    /// directory when one is set.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Download`] if the module name is not a
    /// plain file name or the file cannot be written, and
    /// [`RepositoryError::Network`] if the transfer fails.
    pub fn download(&self, module: &Module) -> Result<PathBuf> {
        let dest = self.destination(module)?;
        let url = self.config.resolve(&module.location.href);
        log::debug!("downloading module from: {url}");
        self.transport.fetch_to_file(&url, &dest)?;
        log::trace!(
            "module {} declares checksum {}; downloaded bytes are not verified",
            module.name,
            module.checksum
        );
        Ok(dest)
    }

    fn destination(&self, module: &Module) -> Result<PathBuf> {
        let name = Path::new(&module.name);
        let mut components = name.components();
        let is_plain_file_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !is_plain_file_name {
            return Err(RepositoryError::Download {
                path: name.to_path_buf(),
                reason: "module name is not a plain file name".to_owned(),
            });
        }
        Ok(self
            .config
            .download_dir()
            .map_or_else(|| name.to_path_buf(), |dir| dir.join(name)))
    }
}
