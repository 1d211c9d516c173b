//! Gzip-compressed tar snapshots.
//!
//! The prefix is the first directory entry in the archive. A buffered archive
//! is scanned for it up front; a streamed one learns it from the entries as
//! they arrive, so anything other than a directory before it is malformed.

use super::{ExtractPolicy, ExtractReport, Extraction, NoticeKind};
use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;
use tar::{Archive, EntryType};

/// Extract a gzip tar read from a stream, learning the prefix as it goes.
pub fn extract_tar_gz_stream<R: Read>(
    reader: R,
    dest: &Path,
    policy: &ExtractPolicy,
) -> Result<ExtractReport> {
    extract_tar(GzDecoder::new(reader), dest, policy, None)
}

/// Extract a gzip tar held fully in memory.
pub fn extract_tar_gz_buffered(
    data: &[u8],
    dest: &Path,
    policy: &ExtractPolicy,
) -> Result<ExtractReport> {
    let prefix = scan_prefix(GzDecoder::new(data))?
        .ok_or_else(|| Error::MalformedArchive("archive has no directory entry".to_string()))?;
    extract_tar(GzDecoder::new(data), dest, policy, Some(&prefix))
}

/// Find the first directory entry and return it with a trailing `/`.
pub fn scan_prefix<R: Read>(reader: R) -> Result<Option<String>> {
    let mut archive = Archive::new(reader);
    for entry in archive.entries().map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        if entry.header().entry_type().is_dir() {
            return Ok(Some(dir_prefix(&entry_name(&entry))));
        }
    }
    Ok(None)
}

/// Extract an uncompressed tar stream into `dest`.
///
/// With `known_prefix` unset the prefix is taken from the first directory
/// entry, which must precede every other entry.
pub fn extract_tar<R: Read>(
    reader: R,
    dest: &Path,
    policy: &ExtractPolicy,
    known_prefix: Option<&str>,
) -> Result<ExtractReport> {
    let mut extraction = Extraction::begin(dest, policy)?;
    let mut prefix = known_prefix.map(str::to_string);
    if let Some(p) = &prefix {
        extraction.set_prefix(p);
    }

    let mut archive = Archive::new(reader);
    for entry in archive.entries().map_err(read_error)? {
        let mut entry = entry.map_err(read_error)?;
        let entry_type = entry.header().entry_type();
        if is_metadata(entry_type) {
            continue;
        }

        let name = entry_name(&entry);
        if prefix.is_none() {
            if !entry_type.is_dir() {
                return Err(Error::MalformedArchive(format!(
                    "entry '{name}' precedes the top-level directory"
                )));
            }
            let learned = dir_prefix(&name);
            extraction.set_prefix(&learned);
            prefix = Some(learned);
            continue;
        }
        let current = prefix.as_deref().unwrap_or_default();

        if entry_type.is_symlink() || entry_type.is_hard_link() {
            extraction.refuse(&name, NoticeKind::Link, extraction.policy().links)?;
            continue;
        }
        if !entry_type.is_dir() && !entry_type.is_file() && entry_type != EntryType::Continuous {
            extraction.refuse(&name, NoticeKind::UnsupportedEntry, extraction.policy().links)?;
            continue;
        }

        let Some(target) = extraction.resolve(&name, current)? else {
            continue;
        };

        if entry_type.is_dir() {
            extraction.create_dir(&target)?;
        } else {
            let mode = entry.header().mode().ok();
            extraction.write_file(&target, &name, &mut entry, mode)?;
        }
    }

    if prefix.is_none() {
        return Err(Error::MalformedArchive(
            "archive has no directory entry".to_string(),
        ));
    }
    Ok(extraction.finish())
}

fn is_metadata(entry_type: EntryType) -> bool {
    entry_type.is_pax_global_extensions()
        || entry_type.is_pax_local_extensions()
        || entry_type.is_gnu_longname()
        || entry_type.is_gnu_longlink()
}

/// Entry name with separators normalized to `/`.
fn entry_name<R: Read>(entry: &tar::Entry<'_, R>) -> String {
    String::from_utf8_lossy(&entry.path_bytes()).replace('\\', "/")
}

fn dir_prefix(name: &str) -> String {
    format!("{}/", name.trim_end_matches('/'))
}

fn read_error(e: std::io::Error) -> Error {
    Error::MalformedArchive(format!("tar read error: {e}"))
}
