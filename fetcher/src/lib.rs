//! limefetch library.
//!
//! This crate retrieves LiME kernel modules from a yum-style module
//! repository. Repository metadata is authenticated against the user's
//! OpenPGP keyring before it is trusted, and the module manifest is checked
//! against the digests the authenticated metadata declares. It is used by the
//! `limefetch` CLI binary and can be embedded directly.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Repository configuration and layered resolution
//! - [`digest`] - SHA-256 digest newtype and verification
//! - [`dirs`] - Platform directory resolution for keyring and config paths
//! - [`download`] - Module artifact download
//! - [`error`] - Error types for repository operations
//! - [`manifest`] - Module manifest decoding
//! - [`metadata`] - Repository metadata retrieval and authentication
//! - [`output`] - Table and JSON formatting for module listings
//! - [`repository`] - Repository client orchestrating the trust pipeline
//! - [`resolver`] - Version query matching
//! - [`transport`] - HTTP transport abstraction
//! - [`trust`] - Publisher fingerprints and the OpenPGP trust store

pub mod cli;
pub mod config;
pub mod digest;
pub mod dirs;
pub mod download;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod output;
pub mod repository;
pub mod resolver;
pub mod transport;
pub mod trust;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
