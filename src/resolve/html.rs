//! Commit scraping from the repository's web pages.
//!
//! Used only when the API is unreachable or rate limited. The patterns target
//! the markup GitHub serves today and will need updating when it changes.

use super::CommitScraper;
use crate::core::config::Config;
use crate::http::{Request, Transport, fetch_text};
use crate::locator::RepositoryRef;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static COMMIT_TEASE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r#"data-test-selector="commit-tease-sha".*?>([0-9a-f]{7,40})<"#)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("invalid regex")
});

/// Scrapes commit-history and tree pages through a [`Transport`].
pub struct HtmlScraper<'a> {
    transport: &'a dyn Transport,
    web_base: &'a str,
}

impl<'a> HtmlScraper<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a Config) -> Self {
        Self {
            transport,
            web_base: &config.web_base,
        }
    }

    fn page(&self, repo: &RepositoryRef, kind: &str, branch: &str) -> Result<String, String> {
        let url = format!(
            "{}/{}/{}/{}/{}",
            self.web_base, repo.owner, repo.name, kind, branch
        );
        fetch_text(self.transport, &Request::new(&url)).map_err(|e| e.to_string())
    }

    /// Try the commits page, then the tree page, for one branch.
    fn scrape_branch(
        &self,
        repo: &RepositoryRef,
        commit_link: &Regex,
        branch: &str,
    ) -> Result<String, String> {
        let commits = self
            .page(repo, "commits", branch)
            .and_then(|html| first_capture(commit_link, &html).ok_or_else(|| "no commit link".to_string()));
        let commits_err = match commits {
            Ok(id) => return Ok(id),
            Err(e) => e,
        };

        self.page(repo, "tree", branch)
            .and_then(|html| {
                first_capture(&COMMIT_TEASE, &html).ok_or_else(|| "no commit marker".to_string())
            })
            .map_err(|tree_err| format!("commits page: {commits_err}; tree page: {tree_err}"))
    }
}

impl CommitScraper for HtmlScraper<'_> {
    fn scrape(
        &self,
        repo: &RepositoryRef,
        candidates: &[String],
    ) -> Result<(String, String), String> {
        let commit_link = commit_link_pattern(repo).map_err(|e| e.to_string())?;

        let mut failures = Vec::new();
        for branch in candidates {
            match self.scrape_branch(repo, &commit_link, branch) {
                Ok(id) => {
                    tracing::debug!(%branch, %id, "resolved from HTML");
                    return Ok((branch.clone(), id));
                }
                Err(reason) => failures.push(format!("{branch}: {reason}")),
            }
        }
        Err(failures.join("\n        "))
    }
}

/// Commit links scoped to exactly this owner/repository.
fn commit_link_pattern(repo: &RepositoryRef) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(
        r#"href="/{}/{}/commit/([0-9a-f]{{40}})""#,
        regex::escape(&repo.owner),
        regex::escape(&repo.name)
    ))
    .case_insensitive(true)
    .build()
}

fn first_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}
