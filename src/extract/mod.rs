//! Archive extraction
//!
//! Unpacks one host-generated snapshot archive into a destination root. Both
//! formats share the same contract:
//!
//! - the archive's common top-level directory (the prefix) is stripped
//! - an entry whose normalized output path is not strictly inside the root is
//!   never written
//! - symbolic and hard links are never materialized
//! - regular files get their archive mode restored (`mode & 0o777`) where the
//!   platform allows it
//!
//! What happens to an entry that is refused is decided by [`ExtractPolicy`].

pub mod tarball;
pub mod zipball;

pub use tarball::{extract_tar_gz_buffered, extract_tar_gz_stream};
pub use zipball::extract_zip;

use crate::error::{Error, Result};
use std::fmt;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// How a refused or degraded entry is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPolicy {
    /// Fail the extraction with [`Error::UnsafeEntry`].
    Enforce,
    /// Skip the entry and record nothing.
    SkipSilently,
    /// Skip the entry, record a [`Notice`] and log a warning.
    SkipWithSignal,
}

/// Caller-selected handling for each class of problem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractPolicy {
    /// Entries escaping the root, or lying outside the archive prefix.
    pub traversal: EntryPolicy,
    /// Symbolic links, hard links and special files.
    pub links: EntryPolicy,
    /// Failure to restore a regular file's mode.
    pub permissions: EntryPolicy,
}

impl Default for ExtractPolicy {
    fn default() -> Self {
        Self {
            traversal: EntryPolicy::SkipWithSignal,
            links: EntryPolicy::SkipWithSignal,
            permissions: EntryPolicy::SkipSilently,
        }
    }
}

impl ExtractPolicy {
    /// Refuse the whole archive on any escaping or link entry.
    pub fn strict() -> Self {
        Self {
            traversal: EntryPolicy::Enforce,
            links: EntryPolicy::Enforce,
            permissions: EntryPolicy::SkipSilently,
        }
    }

    /// Skip everything quietly.
    pub fn permissive() -> Self {
        Self {
            traversal: EntryPolicy::SkipSilently,
            links: EntryPolicy::SkipSilently,
            permissions: EntryPolicy::SkipSilently,
        }
    }
}

/// Why an entry produced a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    PathEscape,
    Link,
    OutsidePrefix,
    UnsupportedEntry,
    PermissionsNotRestored,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoticeKind::PathEscape => "path escapes the destination",
            NoticeKind::Link => "link entries are never extracted",
            NoticeKind::OutsidePrefix => "entry is outside the archive's top-level directory",
            NoticeKind::UnsupportedEntry => "unsupported entry type",
            NoticeKind::PermissionsNotRestored => "permissions not restored",
        };
        f.write_str(text)
    }
}

/// A non-fatal event recorded under [`EntryPolicy::SkipWithSignal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Entry name as it appears in the archive.
    pub path: String,
    pub kind: NoticeKind,
}

/// Summary of one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Prefix that was stripped, with trailing `/`; empty for flat zips.
    pub prefix: String,
    pub files: usize,
    pub directories: usize,
    pub notices: Vec<Notice>,
}

/// Lexically normalize a path (no filesystem access).
pub(crate) fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut has_root = false;

    for c in path.components() {
        match c {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !has_root {
                    // Preserve leading ".." for relative paths.
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

/// Set file permissions (Unix only).
#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(()) // No POSIX mode bits to restore
}

/// Writes entries into a destination root, enforcing containment and policy.
pub(crate) struct Extraction<'a> {
    root: PathBuf,
    policy: &'a ExtractPolicy,
    report: ExtractReport,
}

impl<'a> Extraction<'a> {
    /// Create (if needed) and canonicalize the destination root.
    pub(crate) fn begin(dest: &Path, policy: &'a ExtractPolicy) -> Result<Self> {
        std::fs::create_dir_all(dest)?;
        let root = dest.canonicalize()?;
        Ok(Self {
            root,
            policy,
            report: ExtractReport::default(),
        })
    }

    pub(crate) fn set_prefix(&mut self, prefix: &str) {
        self.report.prefix = prefix.to_string();
    }

    pub(crate) fn policy(&self) -> &ExtractPolicy {
        self.policy
    }

    /// Apply `policy` to an entry that will not be written.
    pub(crate) fn refuse(&mut self, name: &str, kind: NoticeKind, policy: EntryPolicy) -> Result<()> {
        match policy {
            EntryPolicy::Enforce => Err(Error::UnsafeEntry {
                path: name.to_string(),
                reason: kind.to_string(),
            }),
            EntryPolicy::SkipSilently => {
                tracing::debug!(entry = name, %kind, "skipped archive entry");
                Ok(())
            }
            EntryPolicy::SkipWithSignal => {
                tracing::warn!(entry = name, %kind, "skipped archive entry");
                self.report.notices.push(Notice {
                    path: name.to_string(),
                    kind,
                });
                Ok(())
            }
        }
    }

    /// Map an archive entry name to its output path.
    ///
    /// Returns `Ok(None)` when the entry must not be written: it is the
    /// archive root itself, or it was refused under the traversal policy.
    pub(crate) fn resolve(&mut self, name: &str, prefix: &str) -> Result<Option<PathBuf>> {
        let rel = if prefix.is_empty() {
            name
        } else if name.trim_end_matches('/') == prefix.trim_end_matches('/') {
            return Ok(None);
        } else if let Some(rest) = name.strip_prefix(prefix) {
            rest
        } else {
            self.refuse(name, NoticeKind::OutsidePrefix, self.policy.traversal)?;
            return Ok(None);
        };

        if rel.is_empty() {
            return Ok(None);
        }

        // Joining an absolute remainder replaces the root, which the
        // containment check below then rejects.
        let candidate = normalize_lexical(&self.root.join(rel));
        if candidate == self.root {
            return Ok(None);
        }
        if !candidate.starts_with(&self.root) || self.has_symlink_component(&candidate) {
            self.refuse(name, NoticeKind::PathEscape, self.policy.traversal)?;
            return Ok(None);
        }

        Ok(Some(candidate))
    }

    /// True if any existing component below the root (leaf included) is a
    /// symlink, so writing through it could land outside the root.
    fn has_symlink_component(&self, target: &Path) -> bool {
        let Ok(rel) = target.strip_prefix(&self.root) else {
            return true;
        };
        let mut cur = self.root.clone();
        for comp in rel.components() {
            cur.push(comp);
            if let Ok(md) = std::fs::symlink_metadata(&cur)
                && md.file_type().is_symlink()
            {
                return true;
            }
        }
        false
    }

    pub(crate) fn create_dir(&mut self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        self.report.directories += 1;
        Ok(())
    }

    /// Write a regular file, then try to restore its mode.
    pub(crate) fn write_file(
        &mut self,
        path: &Path,
        name: &str,
        content: &mut dyn Read,
        mode: Option<u32>,
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        std::io::copy(content, &mut file)?;
        drop(file);
        self.report.files += 1;

        if let Some(mode) = mode
            && let Err(e) = set_mode(path, mode & 0o777)
        {
            if self.policy.permissions == EntryPolicy::Enforce {
                return Err(Error::Io(e));
            }
            self.refuse(
                name,
                NoticeKind::PermissionsNotRestored,
                self.policy.permissions,
            )?;
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> ExtractReport {
        self.report
    }
}
