//! Platform directory resolution.
//!
//! Wraps `directories-next` behind a trait so keyring and configuration
//! lookups can be redirected in tests.

use std::path::PathBuf;

/// Application name used for the configuration directory.
const APPLICATION: &str = "limefetch";

/// Base directories consulted when resolving default paths.
pub trait BaseDirs {
    /// The current user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// The limefetch configuration directory.
    fn config_dir(&self) -> Option<PathBuf>;
}

/// Directories reported by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }

    fn config_dir(&self) -> Option<PathBuf> {
        directories_next::ProjectDirs::from("", "", APPLICATION)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }
}

/// Return the conventional GnuPG public keyring path under the home
/// directory, `<home>/.gnupg/pubring.gpg`.
#[must_use]
pub fn default_keyring_path(dirs: &dyn BaseDirs) -> Option<PathBuf> {
    dirs.home_dir()
        .map(|home| home.join(".gnupg").join("pubring.gpg"))
}

/// Return the default configuration file path, `<config dir>/config.toml`.
#[must_use]
pub fn default_config_path(dirs: &dyn BaseDirs) -> Option<PathBuf> {
    dirs.config_dir().map(|dir| dir.join("config.toml"))
}
