//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while bootstrapping a snapshot clone.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not resolve a commit for {repo}\n  api: {api}\n  html: {html}")]
    RefResolutionFailed {
        repo: String,
        api: String,
        html: String,
    },

    #[error("invalid branch name '{0}'")]
    InvalidBranch(String),

    #[error("snapshot download failed: {details}")]
    SnapshotUnavailable { details: String },

    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    #[error("refusing unsafe archive entry '{path}': {reason}")]
    UnsafeEntry { path: String, reason: String },

    #[error("destination already exists and is not empty: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by a [`crate::http::Transport`].
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("rate limited by {url} (HTTP {status}); set GITHUB_TOKEN to raise the limit")]
    RateLimited { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("reading response from {url} failed: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("empty response from {url}")]
    EmptyBody { url: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl HttpError {
    /// Build the error for a non-success status, singling out rate limiting.
    pub fn from_status(url: &str, status: u16) -> Self {
        match status {
            403 | 429 => HttpError::RateLimited {
                url: url.to_string(),
                status,
            },
            _ => HttpError::Status {
                url: url.to_string(),
                status,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_statuses_are_singled_out() {
        assert!(matches!(
            HttpError::from_status("u", 403),
            HttpError::RateLimited { status: 403, .. }
        ));
        assert!(matches!(
            HttpError::from_status("u", 429),
            HttpError::RateLimited { status: 429, .. }
        ));
        assert!(matches!(
            HttpError::from_status("u", 404),
            HttpError::Status { status: 404, .. }
        ));
    }

    #[test]
    fn test_rate_limit_message_mentions_token() {
        let msg = HttpError::from_status("https://api.github.com/repos/a/b", 403).to_string();
        assert!(msg.contains("GITHUB_TOKEN"));
    }
}
