//! speedclone CLI - snapshot-bootstrap a GitHub repository
//!
//! Usage:
//!   speedclone <URL> <TARGET>             Bootstrap into TARGET
//!   speedclone --force <URL> <TARGET>     Clear TARGET first
//!
//! Exit codes: 0 success, 1 destination exists, 2 usage error, 3 failure.

use anyhow::{Context, Result};
use clap::Parser;
use speedclone::bootstrap::{BootstrapRequest, BootstrapSummary, bootstrap};
use speedclone::{Config, Error, ExtractPolicy, UreqTransport, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const EXIT_DESTINATION_EXISTS: u8 = 1;
const EXIT_FAILURE: u8 = 3;

#[derive(Parser)]
#[command(name = "speedclone")]
#[command(about = "Bootstrap a GitHub repository from a snapshot archive instead of a full clone")]
#[command(version)]
struct Cli {
    /// GitHub repository URL (https://github.com/<owner>/<repo>)
    url: String,

    /// Directory to populate
    target: PathBuf,

    /// Clear TARGET if it already exists and is not empty
    #[arg(long)]
    force: bool,

    /// Branch to fetch instead of the default branch
    #[arg(short, long)]
    branch: Option<String>,

    /// Fail a download tier on any escaping or link entry instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Hide download spinners
    #[arg(long)]
    no_progress: bool,

    /// Network read timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// GitHub token for API requests (overrides GITHUB_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            output::error(&format!("{err:#}"));
            match err.downcast_ref::<Error>() {
                Some(Error::DestinationExists(_)) => ExitCode::from(EXIT_DESTINATION_EXISTS),
                _ => ExitCode::from(EXIT_FAILURE),
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    // RUST_LOG wins when set; -v only raises the fallback.
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn run(cli: &Cli) -> Result<BootstrapSummary> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if cli.token.is_some() {
        config = config.with_token(cli.token.clone());
    }
    if let Some(secs) = cli.timeout {
        config = config.with_read_timeout_secs(secs);
    }
    if cli.strict {
        config.policy = ExtractPolicy::strict();
    }
    if cli.no_progress {
        config.show_progress = false;
    }

    let transport = UreqTransport::new(&config);
    let request = BootstrapRequest {
        url: &cli.url,
        dest: &cli.target,
        branch: cli.branch.as_deref(),
        force: cli.force,
    };

    let summary = bootstrap(&transport, &config, &request)?;
    Ok(summary)
}

fn print_summary(summary: &BootstrapSummary) {
    let winner = summary
        .winner()
        .map(|tier| tier.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    output::success(&format!(
        "Bootstrapped {} ({} @ {})",
        summary.repo,
        summary.resolved.branch,
        output::short_commit(&summary.resolved.commit_id)
    ));
    output::info(&format!("commit source: {}", summary.resolved.source));
    output::detail(&format!(
        "snapshot: {} in {:.1}s ({} files)",
        winner,
        summary.elapsed.as_secs_f64(),
        summary.acquisition.extraction.files
    ));

    let skipped = summary.signalled_skips();
    if skipped > 0 {
        output::warning(&format!(
            "{skipped} unsafe archive entries were skipped"
        ));
    }
}
