//! Snapshot acquisition cascade
//!
//! Six fixed tiers are tried in order until one downloads and extracts
//! cleanly. Streaming tar is cheapest, so it goes first; zip is the last
//! resort because it must be buffered whole. Each tier is tried once and
//! every outcome is kept for the final report.

use crate::core::config::Config;
use crate::core::output;
use crate::core::progress::{ProgressGuard, create_byte_spinner, create_spinner};
use crate::destination::clear_directory;
use crate::error::{Error, Result};
use crate::extract::{ExtractReport, extract_tar_gz_buffered, extract_tar_gz_stream, extract_zip};
use crate::http::{Request, Transport, fetch_bytes};
use crate::locator::RepositoryRef;
use crate::resolve::ResolvedRef;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Entries are extracted while the body is still arriving.
    Streamed,
    /// The whole body is downloaded before extraction starts.
    Buffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    CommitId,
    BranchName,
}

/// One combination of format, transfer mode and addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionTier {
    pub format: ArchiveFormat,
    pub mode: TransferMode,
    pub address: Address,
}

impl AcquisitionTier {
    const fn new(format: ArchiveFormat, mode: TransferMode, address: Address) -> Self {
        Self {
            format,
            mode,
            address,
        }
    }

    /// Archive URL for this tier.
    pub fn url(&self, archive_base: &str, repo: &RepositoryRef, resolved: &ResolvedRef) -> String {
        let kind = match self.format {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        };
        let reference = match self.address {
            Address::CommitId => &resolved.commit_id,
            Address::BranchName => &resolved.branch,
        };
        format!(
            "{}/{}/{}/{}/{}",
            archive_base, repo.owner, repo.name, kind, reference
        )
    }
}

impl fmt::Display for AcquisitionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = match self.format {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        };
        let mode = match self.mode {
            TransferMode::Streamed => "(stream)",
            TransferMode::Buffered => "",
        };
        let address = match self.address {
            Address::CommitId => "sha",
            Address::BranchName => "branch",
        };
        write!(f, "{format}{mode}@{address}")
    }
}

/// The tiers, in the order they are attempted.
pub const TIERS: [AcquisitionTier; 6] = {
    use Address::*;
    use ArchiveFormat::*;
    use TransferMode::*;
    [
        AcquisitionTier::new(TarGz, Streamed, CommitId),
        AcquisitionTier::new(TarGz, Streamed, BranchName),
        AcquisitionTier::new(TarGz, Buffered, CommitId),
        AcquisitionTier::new(TarGz, Buffered, BranchName),
        AcquisitionTier::new(Zip, Buffered, CommitId),
        AcquisitionTier::new(Zip, Buffered, BranchName),
    ]
};

/// Result of one attempted tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionOutcome {
    pub tier: AcquisitionTier,
    pub success: bool,
    pub detail: String,
}

/// Every attempt of a successful cascade, plus the winning extraction.
#[derive(Debug, Clone)]
pub struct AcquisitionReport {
    pub attempts: Vec<AcquisitionOutcome>,
    pub extraction: ExtractReport,
}

impl AcquisitionReport {
    /// The tier that succeeded.
    pub fn winner(&self) -> Option<AcquisitionTier> {
        self.attempts.iter().find(|a| a.success).map(|a| a.tier)
    }
}

/// Try `tiers` in order with `attempt`, stopping at the first success.
///
/// Fails with [`Error::SnapshotUnavailable`] listing every tier's failure
/// when none succeeds.
pub fn run_cascade<F>(tiers: &[AcquisitionTier], mut attempt: F) -> Result<AcquisitionReport>
where
    F: FnMut(&AcquisitionTier) -> Result<ExtractReport>,
{
    let mut attempts = Vec::with_capacity(tiers.len());

    for tier in tiers {
        tracing::debug!(%tier, "attempting tier");
        match attempt(tier) {
            Ok(extraction) => {
                attempts.push(AcquisitionOutcome {
                    tier: *tier,
                    success: true,
                    detail: format!("{} files", extraction.files),
                });
                return Ok(AcquisitionReport {
                    attempts,
                    extraction,
                });
            }
            Err(e) => {
                tracing::debug!(%tier, error = %e, "tier failed");
                attempts.push(AcquisitionOutcome {
                    tier: *tier,
                    success: false,
                    detail: e.to_string(),
                });
            }
        }
    }

    let details = attempts
        .iter()
        .map(|a| format!("{}: {}", a.tier, a.detail))
        .collect::<Vec<_>>()
        .join("; ");
    Err(Error::SnapshotUnavailable { details })
}

/// Download and extract a snapshot of `resolved` into `dest`.
///
/// `dest` must be an empty directory; anything else is refused with
/// [`Error::DestinationExists`] before a request is made. It is emptied
/// after every failed tier so the next one starts clean.
pub fn acquire_snapshot(
    transport: &dyn Transport,
    config: &Config,
    repo: &RepositoryRef,
    resolved: &ResolvedRef,
    dest: &Path,
) -> Result<AcquisitionReport> {
    if !dest.is_dir() || std::fs::read_dir(dest)?.next().is_some() {
        return Err(Error::DestinationExists(dest.to_path_buf()));
    }

    let mut position = 0;
    run_cascade(&TIERS, |tier| {
        position += 1;
        output::attempt(position, TIERS.len(), &tier.to_string());

        let url = tier.url(&config.archive_base, repo, resolved);
        let result = attempt_tier(transport, config, tier, &url, dest);
        if let Err(e) = &result {
            output::detail(&e.to_string());
            if let Err(clear_err) = clear_directory(dest) {
                tracing::warn!(error = %clear_err, "could not clear destination after failed tier");
            }
        }
        result
    })
}

fn attempt_tier(
    transport: &dyn Transport,
    config: &Config,
    tier: &AcquisitionTier,
    url: &str,
    dest: &Path,
) -> Result<ExtractReport> {
    let request = Request::new(url);

    // Zip needs random access, so only tar.gz can actually stream.
    if tier.format == ArchiveFormat::TarGz && tier.mode == TransferMode::Streamed {
        let body = transport.get(&request)?;
        let progress = ProgressGuard::new(create_byte_spinner("Downloading", config.show_progress));
        return extract_tar_gz_stream(progress.bar().wrap_read(body), dest, &config.policy);
    }

    let data = {
        let _progress = ProgressGuard::new(create_spinner("Downloading", config.show_progress));
        fetch_bytes(transport, &request)?
    };
    match tier.format {
        ArchiveFormat::TarGz => extract_tar_gz_buffered(&data, dest, &config.policy),
        ArchiveFormat::Zip => extract_zip(Cursor::new(data), dest, &config.policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryRef {
        RepositoryRef {
            owner: "acme".to_string(),
            name: "widget".to_string(),
        }
    }

    fn resolved() -> ResolvedRef {
        ResolvedRef {
            branch: "main".to_string(),
            commit_id: "abc1234".to_string(),
            source: crate::resolve::RefSource::ScrapedHtml,
        }
    }

    #[test]
    fn test_tier_labels_in_order() {
        let labels: Vec<String> = TIERS.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec![
                "tar.gz(stream)@sha",
                "tar.gz(stream)@branch",
                "tar.gz@sha",
                "tar.gz@branch",
                "zip@sha",
                "zip@branch",
            ]
        );
    }

    #[test]
    fn test_tier_urls() {
        let base = "https://codeload.github.com";
        assert_eq!(
            TIERS[0].url(base, &repo(), &resolved()),
            "https://codeload.github.com/acme/widget/tar.gz/abc1234"
        );
        assert_eq!(
            TIERS[5].url(base, &repo(), &resolved()),
            "https://codeload.github.com/acme/widget/zip/main"
        );
    }

    #[test]
    fn test_cascade_stops_at_first_success() {
        for k in 1..=TIERS.len() {
            let mut calls = Vec::new();
            let report = run_cascade(&TIERS, |tier| {
                calls.push(*tier);
                if calls.len() < k {
                    Err(Error::MalformedArchive("broken".to_string()))
                } else {
                    Ok(ExtractReport::default())
                }
            })
            .unwrap();

            assert_eq!(calls, TIERS[..k].to_vec());
            assert_eq!(report.attempts.len(), k);
            assert!(report.attempts[..k - 1].iter().all(|a| !a.success));
            assert_eq!(report.winner(), Some(TIERS[k - 1]));
        }
    }

    #[test]
    fn test_exhausted_cascade_lists_every_tier() {
        let err = run_cascade(&TIERS, |_| Err(Error::MalformedArchive("nope".to_string())))
            .unwrap_err();
        let Error::SnapshotUnavailable { details } = err else {
            panic!("expected SnapshotUnavailable");
        };
        assert_eq!(details.matches("nope").count(), 6);
        assert!(details.starts_with("tar.gz(stream)@sha: "));
        assert!(details.contains("; zip@branch: "));
    }
}
