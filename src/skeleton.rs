//! `.git` skeleton synthesis
//!
//! Writes just enough repository metadata for git to open the snapshot as a
//! partial clone whose objects are all promised by `origin`. No objects are
//! written, so history commands will try to fetch.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Metadata describing the snapshot to git.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSkeleton {
    pub branch: String,
    pub commit_id: String,
    /// The URL the user asked for, recorded for both remotes.
    pub remote_url: String,
}

impl GitSkeleton {
    pub fn new(branch: &str, commit_id: &str, remote_url: &str) -> Self {
        Self {
            branch: branch.to_string(),
            commit_id: commit_id.to_string(),
            remote_url: remote_url.to_string(),
        }
    }

    /// Contents of `.git/config`.
    pub fn config_text(&self) -> String {
        let url = &self.remote_url;
        let branch = &self.branch;
        format!(
            "[core]
\trepositoryformatversion = 0
\tfilemode = true
\tbare = false
\tlogallrefupdates = true
[remote \"origin\"]
\turl = {url}
\tfetch = +refs/heads/*:refs/remotes/origin/*
\tpromisor = true
\tpartialclonefilter = blob:none
[remote \"upstream\"]
\turl = {url}
\tfetch = +refs/heads/*:refs/remotes/upstream/*
\tpromisor = true
\tpartialclonefilter = blob:none
[branch \"{branch}\"]
\tremote = origin
\tmerge = refs/heads/{branch}
[extensions]
\tpartialClone = origin
"
        )
    }

    /// Write the skeleton under `root/.git`, returning the files written.
    pub fn write(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let git = root.join(".git");
        let commit_line = format!("{}\n", self.commit_id);

        let files = [
            (PathBuf::from("HEAD"), format!("ref: refs/heads/{}\n", self.branch)),
            (Path::new("refs/heads").join(&self.branch), commit_line.clone()),
            (Path::new("refs/remotes/origin").join(&self.branch), commit_line.clone()),
            (Path::new("refs/remotes/upstream").join(&self.branch), commit_line),
            (PathBuf::from("objects/info/promisor"), "promisor\n".to_string()),
            (PathBuf::from("config"), self.config_text()),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (rel, contents) in files {
            let path = git.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, contents)?;
            written.push(path);
        }

        tracing::debug!(branch = %self.branch, "wrote .git skeleton");
        Ok(written)
    }
}
