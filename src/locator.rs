//! Repository locator
//!
//! Turns a GitHub URL into an owner/name pair.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Hosts accepted as GitHub.
const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    /// Parse a GitHub repository URL.
    ///
    /// The last two non-empty path segments become owner and name, and a
    /// trailing `.git` is stripped from the name.
    ///
    /// # Example
    /// ```
    /// use speedclone::RepositoryRef;
    ///
    /// let repo = RepositoryRef::parse("https://github.com/rust-lang/rust.git").unwrap();
    /// assert_eq!(repo.owner, "rust-lang");
    /// assert_eq!(repo.name, "rust");
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidUrl {
            url: input.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(input.trim()).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(url.scheme(), "https" | "http") {
            return Err(invalid("only GitHub HTTPS URLs are supported"));
        }

        let host = url
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| invalid("URL has no host"))?;
        if !GITHUB_HOSTS.contains(&host.as_str()) {
            return Err(invalid("only GitHub HTTPS URLs are supported"));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let [.., owner, name] = segments.as_slice() else {
            return Err(invalid("expected a path of the form /<owner>/<repo>"));
        };

        let name = name.strip_suffix(".git").unwrap_or(name);
        validate_segment(owner).map_err(|r| invalid(&format!("owner {r}")))?;
        validate_segment(name).map_err(|r| invalid(&format!("repository name {r}")))?;

        Ok(Self {
            owner: (*owner).to_string(),
            name: name.to_string(),
        })
    }
}

/// Reject segments that could act as path components on disk or in URLs.
fn validate_segment(segment: &str) -> std::result::Result<(), &'static str> {
    if segment.is_empty() {
        return Err("is empty");
    }
    if segment == "." || segment == ".." {
        return Err("is a relative path component");
    }
    if segment.contains(['/', '\\']) {
        return Err("contains a path separator");
    }
    Ok(())
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
