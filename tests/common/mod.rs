//! Common test utilities: archive builders and an in-memory transport.

#![allow(dead_code)]

use speedclone::HttpError;
use speedclone::http::{Body, Request, Transport};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::path::Path;

pub const SHA: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

const EMPTY: &[u8] = &[];

/// One archive member.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8], u32),
    Symlink(&'a str, &'a str),
    HardLink(&'a str, &'a str),
    Fifo(&'a str),
}

/// Build a GNU tar header with the name written byte-for-byte, so names
/// with `..`, leading `/` or backslashes survive.
fn raw_header(name: &str, entry_type: tar::EntryType, size: u64, mode: u32) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    let bytes = name.as_bytes();
    assert!(bytes.len() < 100, "test entry name too long: {name}");
    header.as_old_mut().name[..bytes.len()].copy_from_slice(bytes);
    header.set_entry_type(entry_type);
    header.set_size(size);
    header.set_mode(mode);
    header.set_mtime(0);
    header
}

fn set_link_name(header: &mut tar::Header, target: &str) {
    let bytes = target.as_bytes();
    header.as_old_mut().linkname[..bytes.len()].copy_from_slice(bytes);
}

/// Uncompressed tar bytes.
pub fn build_tar(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for entry in entries {
        let (mut header, data): (tar::Header, &[u8]) = match *entry {
            Entry::Dir(name) => (raw_header(name, tar::EntryType::Directory, 0, 0o755), EMPTY),
            Entry::File(name, data, mode) => (
                raw_header(name, tar::EntryType::Regular, data.len() as u64, mode),
                data,
            ),
            Entry::Symlink(name, target) => {
                let mut h = raw_header(name, tar::EntryType::Symlink, 0, 0o777);
                set_link_name(&mut h, target);
                (h, EMPTY)
            }
            Entry::HardLink(name, target) => {
                let mut h = raw_header(name, tar::EntryType::Link, 0, 0o644);
                set_link_name(&mut h, target);
                (h, EMPTY)
            }
            Entry::Fifo(name) => (raw_header(name, tar::EntryType::Fifo, 0, 0o644), EMPTY),
        };
        header.set_cksum();
        builder.append(&header, data).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Gzip-compressed tar bytes, as served for `tar.gz` snapshots.
pub fn build_tar_gz(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    gz.write_all(&build_tar(entries)).unwrap();
    gz.finish().unwrap()
}

/// Zip bytes. Hard links and fifos have no zip form and are left out.
pub fn build_zip(entries: &[Entry<'_>]) -> Vec<u8> {
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        match *entry {
            Entry::Dir(name) => {
                let options = SimpleFileOptions::default().unix_permissions(0o755);
                writer.add_directory(name, options).unwrap();
            }
            Entry::File(name, data, mode) => {
                let options = SimpleFileOptions::default().unix_permissions(mode);
                writer.start_file(name, options).unwrap();
                writer.write_all(data).unwrap();
            }
            Entry::Symlink(name, target) => {
                writer
                    .add_symlink(name, target, SimpleFileOptions::default())
                    .unwrap();
            }
            Entry::HardLink(..) | Entry::Fifo(..) => {}
        }
    }
    writer.finish().unwrap().into_inner()
}

/// A small, well-formed snapshot of `acme/widget`.
pub fn widget_entries() -> Vec<Entry<'static>> {
    vec![
        Entry::Dir("widget-main/"),
        Entry::File("widget-main/README.md", b"# widget\n", 0o644),
        Entry::Dir("widget-main/src/"),
        Entry::File("widget-main/src/lib.rs", b"pub fn widget() {}\n", 0o644),
        Entry::File("widget-main/run.sh", b"#!/bin/sh\necho hi\n", 0o755),
    ]
}

/// Relative paths of everything under `root`, sorted, `/`-separated.
pub fn tree(root: &Path) -> Vec<String> {
    let mut paths: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    paths.sort();
    paths
}

/// What a scripted request answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(Vec<u8>),
    Status(u16),
}

/// Transport that hands out scripted replies in order and records every URL.
///
/// Once the script runs out every request gets a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Reply>>,
    pub requests: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, request: &Request<'_>) -> Result<Body, HttpError> {
        self.requests.borrow_mut().push(request.url.to_string());
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Body(data)) => Ok(Box::new(Cursor::new(data))),
            Some(Reply::Status(status)) => Err(HttpError::from_status(request.url, status)),
            None => Err(HttpError::from_status(request.url, 404)),
        }
    }
}
