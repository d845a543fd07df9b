//! Version query resolution.
//!
//! Queries are matched against each module's version with shell-style
//! globbing where only `*` and `?` are special. Every other character,
//! including `[` and `]`, matches itself.

use glob::{MatchOptions, Pattern};

use crate::error::{RepositoryError, Result};
use crate::manifest::{Manifest, Module};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled version query.
///
/// # Examples
///
/// ```
/// use limefetch::resolver::VersionQuery;
///
/// let query = VersionQuery::new("4.4.10*amzn1.x86_64").expect("valid query");
/// assert!(query.matches("4.4.10-22.54.amzn1.x86_64"));
/// assert!(!query.matches("4.4.11-22.54.amzn1.x86_64"));
/// ```
#[derive(Debug, Clone)]
pub struct VersionQuery {
    raw: String,
    pattern: Pattern,
}

impl VersionQuery {
    /// Compile `query` into a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidQuery`] if the pattern cannot be
    /// compiled.
    pub fn new(query: &str) -> Result<Self> {
        let pattern =
            Pattern::new(&to_glob_pattern(query)).map_err(|e| RepositoryError::InvalidQuery {
                query: query.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            raw: query.to_owned(),
            pattern,
        })
    }

    /// The query as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Return true when `version` matches the query.
    #[must_use]
    pub fn matches(&self, version: &str) -> bool {
        self.pattern.matches_with(version, MATCH_OPTIONS)
    }
}

/// Translate a `*`/`?` query into `glob` syntax.
///
/// Other pattern metacharacters are escaped and runs of `*` are collapsed,
/// since `glob` reserves `**` for recursive directory matching.
fn to_glob_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len());
    let mut previous_star = false;
    for c in query.chars() {
        match c {
            '*' if previous_star => {}
            '*' | '?' => pattern.push(c),
            other => pattern.push_str(&Pattern::escape(other.encode_utf8(&mut [0; 4]))),
        }
        previous_star = c == '*';
    }
    pattern
}

/// Return every module whose version matches `query`, in manifest order.
///
/// # Errors
///
/// Returns [`RepositoryError::NotFound`] when nothing matches, or
/// [`RepositoryError::InvalidQuery`] when the query cannot be compiled.
pub fn resolve(manifest: &Manifest, query: &str) -> Result<Vec<Module>> {
    let compiled = VersionQuery::new(query)?;
    let matches: Vec<Module> = manifest
        .modules()
        .iter()
        .filter(|module| compiled.matches(&module.version))
        .cloned()
        .collect();
    log::debug!("{} of {} modules match {query}", matches.len(), manifest.len());

    if matches.is_empty() {
        return Err(RepositoryError::NotFound {
            query: query.to_owned(),
        });
    }
    Ok(matches)
}
