//! Snapshot bootstrapper for large GitHub repositories
//!
//! Instead of negotiating a clone, speedclone downloads one archive of the
//! repository's current head and presents it to git as a partial clone.
//!
//! # Pipeline
//!
//! 1. [`RepositoryRef::parse`] turns the URL into owner/name.
//! 2. [`resolve::resolve`] finds the branch and commit: REST API first, then
//!    the website's commit and tree pages.
//! 3. [`acquire::acquire_snapshot`] tries six archive tiers in order
//!    (streamed tar.gz, buffered tar.gz, buffered zip; each by commit then by
//!    branch) until one extracts cleanly.
//! 4. [`GitSkeleton::write`] adds a `.git` directory declaring `origin` as a
//!    promisor remote.
//!
//! [`bootstrap::bootstrap`] runs all of it.
//!
//! # Extraction safety
//!
//! Entries that would land outside the destination and link entries are
//! never written. Whether they are skipped quietly, skipped with a notice or
//! fail the tier is chosen with [`ExtractPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use speedclone::bootstrap::{BootstrapRequest, bootstrap};
//! use speedclone::{Config, UreqTransport};
//! use std::path::Path;
//!
//! let config = Config::load()?;
//! let transport = UreqTransport::new(&config);
//! let summary = bootstrap(
//!     &transport,
//!     &config,
//!     &BootstrapRequest {
//!         url: "https://github.com/acme/widget",
//!         dest: Path::new("widget"),
//!         branch: None,
//!         force: false,
//!     },
//! )?;
//! println!("{} files", summary.acquisition.extraction.files);
//! # Ok::<(), speedclone::Error>(())
//! ```

pub mod acquire;
pub mod bootstrap;
pub mod core;
pub mod destination;
pub mod error;
pub mod extract;
pub mod http;
pub mod locator;
pub mod resolve;
pub mod skeleton;

pub use self::core::config::Config;
pub use self::core::output;
pub use error::{Error, HttpError, Result};
pub use extract::{EntryPolicy, ExtractPolicy, ExtractReport, Notice, NoticeKind};
pub use http::{Transport, UreqTransport};
pub use locator::RepositoryRef;
pub use resolve::{RefSource, ResolvedRef};
pub use skeleton::GitSkeleton;
