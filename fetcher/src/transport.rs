//! HTTP transport for repository retrieval.
//!
//! Provides a trait-based abstraction over the blocking HTTP client so the
//! trust pipeline can be exercised without network access. A single
//! [`HttpTransport`] owns one `ureq` agent and is shared by every stage of a
//! repository operation.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overall timeout applied to each request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for fetching repository resources by absolute URL.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Fetch the body at `url` into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-success status.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Stream the body at `url` into the file at `dest`, truncating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Errors arising from transport operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered 404 for the resource.
    #[error("resource not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// Writing the response body to disk failed.
    #[error("could not write {}: {source}", path.display())]
    Write {
        /// The destination file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Blocking HTTP transport backed by `ureq`.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Build a transport whose requests time out after [`REQUEST_TIMEOUT`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Build a transport with a custom overall request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        log::trace!("{url} answered {}", response.status());
        response
            .into_body()
            .read_to_vec()
            .map_err(|e| FetchError::Http {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }

    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        log::trace!("{url} answered {}", response.status());
        let write_error = |source: std::io::Error| FetchError::Write {
            path: dest.to_path_buf(),
            source,
        };
        let mut file = File::create(dest).map_err(write_error)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file).map_err(write_error)?;
        Ok(())
    }
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
