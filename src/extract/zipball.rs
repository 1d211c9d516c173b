//! Zip snapshots.
//!
//! The prefix is the lexicographically first top-level directory name, and it
//! is only stripped when every entry lives under it. Otherwise entries are
//! extracted with their full names.

use super::{ExtractPolicy, ExtractReport, Extraction, NoticeKind};
use crate::error::{Error, Result};
use std::io::{Read, Seek};
use std::path::Path;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Extract a zip archive into `dest`.
pub fn extract_zip<R: Read + Seek>(
    reader: R,
    dest: &Path,
    policy: &ExtractPolicy,
) -> Result<ExtractReport> {
    let mut archive = zip::ZipArchive::new(reader).map_err(read_error)?;

    let names: Vec<String> = archive.file_names().map(normalize_name).collect();
    let prefix = common_prefix(&names);

    let mut extraction = Extraction::begin(dest, policy)?;
    extraction.set_prefix(&prefix);

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(read_error)?;
        let name = normalize_name(file.name());
        let mode = file.unix_mode();

        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            extraction.refuse(&name, NoticeKind::Link, extraction.policy().links)?;
            continue;
        }

        let Some(target) = extraction.resolve(&name, &prefix)? else {
            continue;
        };

        if file.is_dir() {
            extraction.create_dir(&target)?;
        } else {
            let mode = mode.map(|m| m & 0o777).filter(|m| *m != 0);
            extraction.write_file(&target, &name, &mut file, mode)?;
        }
    }

    Ok(extraction.finish())
}

fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
}

/// Shared top-level directory with trailing `/`, or empty.
fn common_prefix(names: &[String]) -> String {
    let candidate = names
        .iter()
        .filter_map(|n| n.split_once('/').map(|(top, _)| top))
        .filter(|top| !top.is_empty())
        .min();

    let Some(top) = candidate else {
        return String::new();
    };
    let prefix = format!("{top}/");
    if names.iter().all(|n| n == top || n.starts_with(&prefix)) {
        prefix
    } else {
        String::new()
    }
}

fn read_error(e: zip::result::ZipError) -> Error {
    Error::MalformedArchive(format!("zip read error: {e}"))
}
