//! End-to-end bootstrap: locate, resolve, acquire, write the skeleton.

use crate::acquire::{AcquisitionReport, AcquisitionTier, acquire_snapshot};
use crate::core::config::Config;
use crate::core::output;
use crate::destination::prepare_destination;
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::locator::RepositoryRef;
use crate::resolve::{CommitScraper, HtmlScraper, RefSource, ResolvedRef, resolve, validate_branch_name};
use crate::skeleton::GitSkeleton;
use std::path::Path;
use std::time::{Duration, Instant};

/// What the caller asked for.
#[derive(Debug, Clone)]
pub struct BootstrapRequest<'a> {
    pub url: &'a str,
    pub dest: &'a Path,
    pub branch: Option<&'a str>,
    pub force: bool,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct BootstrapSummary {
    pub repo: RepositoryRef,
    pub resolved: ResolvedRef,
    pub acquisition: AcquisitionReport,
    pub elapsed: Duration,
}

impl BootstrapSummary {
    pub fn winner(&self) -> Option<AcquisitionTier> {
        self.acquisition.winner()
    }

    /// Entries skipped with a recorded notice.
    pub fn signalled_skips(&self) -> usize {
        self.acquisition.extraction.notices.len()
    }
}

/// Run the whole pipeline with the production HTML scraper.
pub fn bootstrap(
    transport: &dyn Transport,
    config: &Config,
    request: &BootstrapRequest<'_>,
) -> Result<BootstrapSummary> {
    let scraper = HtmlScraper::new(transport, config);
    bootstrap_with(transport, config, request, &scraper)
}

/// Run the whole pipeline with a caller-supplied scraper.
pub fn bootstrap_with(
    transport: &dyn Transport,
    config: &Config,
    request: &BootstrapRequest<'_>,
    scraper: &dyn CommitScraper,
) -> Result<BootstrapSummary> {
    let repo = RepositoryRef::parse(request.url)?;
    if let Some(branch) = request.branch {
        validate_branch_name(branch)?;
    }
    prepare_destination(request.dest, request.force)?;

    output::action(&format!("Resolving {repo}"));
    let resolved = resolve(transport, config, &repo, request.branch, scraper)?;
    validate_branch_name(&resolved.branch)?;
    if resolved.commit_id.is_empty() {
        return Err(Error::RefResolutionFailed {
            repo: repo.to_string(),
            api: "empty commit id".to_string(),
            html: String::new(),
        });
    }
    if resolved.source == RefSource::ScrapedHtml {
        output::warning("API lookup failed; commit was scraped from the website");
    }
    output::detail(&format!(
        "branch: {}, commit: {} ({})",
        resolved.branch,
        output::short_commit(&resolved.commit_id),
        resolved.source
    ));

    output::action("Downloading snapshot");
    let started = Instant::now();
    let acquisition = acquire_snapshot(transport, config, &repo, &resolved, request.dest)?;
    let elapsed = started.elapsed();

    GitSkeleton::new(&resolved.branch, &resolved.commit_id, request.url).write(request.dest)?;

    Ok(BootstrapSummary {
        repo,
        resolved,
        acquisition,
        elapsed,
    })
}
