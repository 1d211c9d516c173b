//! Reference resolution
//!
//! Decides which branch and commit to download. The REST API is tried first;
//! if it fails for any reason the website is scraped for each candidate
//! branch. Scraping is fragile and only ever a fallback.

pub mod api;
pub mod html;

pub use api::resolve_via_api;
pub use html::HtmlScraper;

use crate::core::config::Config;
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::locator::RepositoryRef;
use std::fmt;

/// Where a commit id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSource {
    Api,
    ScrapedHtml,
}

impl fmt::Display for RefSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefSource::Api => f.write_str("api"),
            RefSource::ScrapedHtml => f.write_str("scraped html"),
        }
    }
}

/// The branch and commit a run will fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub branch: String,
    /// Lowercase hex; 40 characters from the API, 7 to 40 when scraped.
    pub commit_id: String,
    pub source: RefSource,
}

/// Finds a commit id for the first candidate branch that has one.
pub trait CommitScraper {
    /// Returns `(branch, commit_id)`, or one line per failed candidate.
    fn scrape(
        &self,
        repo: &RepositoryRef,
        candidates: &[String],
    ) -> std::result::Result<(String, String), String>;
}

/// Check `name` against the parts of git's ref-name rules that matter here:
/// it must stay a relative path under `refs/heads` and a single URL path.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('/')
        || name.ends_with('/')
        || name.ends_with(".lock")
        || name.contains("..")
        || name.contains("//")
        || name.split('/').any(|part| part.starts_with('.'))
        || name
            .chars()
            .any(|c| c.is_control() || c.is_whitespace() || "\\~^:?*[".contains(c));
    if invalid {
        return Err(Error::InvalidBranch(name.to_string()));
    }
    Ok(())
}

/// Branches tried by the HTML fallback: the hint, then `main`, then `master`.
pub fn candidate_branches(hint: Option<&str>) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    for branch in hint.into_iter().chain(["main", "master"]) {
        if !branch.is_empty() && !candidates.iter().any(|c| c == branch) {
            candidates.push(branch.to_string());
        }
    }
    candidates
}

/// Resolve the branch and commit to fetch for `repo`.
pub fn resolve(
    transport: &dyn Transport,
    config: &Config,
    repo: &RepositoryRef,
    hint: Option<&str>,
    scraper: &dyn CommitScraper,
) -> Result<ResolvedRef> {
    let api_err = match resolve_via_api(transport, config, repo, hint) {
        Ok(resolved) => return Ok(resolved),
        Err(e) => e,
    };
    tracing::debug!(error = %api_err, "API resolution failed, trying HTML pages");

    let candidates = candidate_branches(hint);
    match scraper.scrape(repo, &candidates) {
        Ok((branch, commit_id)) => Ok(ResolvedRef {
            branch,
            commit_id,
            source: RefSource::ScrapedHtml,
        }),
        Err(html) => Err(Error::RefResolutionFailed {
            repo: repo.to_string(),
            api: api_err.to_string(),
            html,
        }),
    }
}
