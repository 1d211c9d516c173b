//! Destination directory handling.

use crate::error::{Error, Result};
use std::path::Path;

/// Make `dest` ready to receive a snapshot.
///
/// A missing path is created and an empty directory is reused. Anything else
/// is refused with [`Error::DestinationExists`] and left untouched, unless
/// `force` is set, in which case its contents (or the non-directory itself)
/// are removed first.
pub fn prepare_destination(dest: &Path, force: bool) -> Result<()> {
    let meta = match std::fs::symlink_metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            std::fs::create_dir_all(dest)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if meta.is_dir() {
        if std::fs::read_dir(dest)?.next().is_none() {
            return Ok(());
        }
        if !force {
            return Err(Error::DestinationExists(dest.to_path_buf()));
        }
        tracing::debug!(dest = %dest.display(), "clearing existing destination");
        return clear_directory(dest);
    }

    if !force {
        return Err(Error::DestinationExists(dest.to_path_buf()));
    }
    std::fs::remove_file(dest)?;
    std::fs::create_dir_all(dest)?;
    Ok(())
}

/// Remove every entry inside `dir`, keeping `dir` itself.
///
/// Symlinks are removed, never followed.
pub fn clear_directory(dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_destination_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a/b");
        prepare_destination(&dest, false).unwrap();
        assert!(dest.is_dir());
    }

    #[test]
    fn test_empty_directory_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        prepare_destination(dir.path(), false).unwrap();
    }

    #[test]
    fn test_non_empty_directory_is_refused_untouched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.txt"), "data").unwrap();

        let err = prepare_destination(dir.path(), false).unwrap_err();
        assert!(matches!(err, Error::DestinationExists(_)));
        assert_eq!(std::fs::read_to_string(dir.path().join("keep.txt")).unwrap(), "data");
    }

    #[test]
    fn test_existing_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("file");
        std::fs::write(&dest, "x").unwrap();

        assert!(matches!(
            prepare_destination(&dest, false),
            Err(Error::DestinationExists(_))
        ));
        prepare_destination(&dest, true).unwrap();
        assert!(dest.is_dir());
    }

    #[test]
    fn test_force_clears_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        std::fs::write(dir.path().join("sub/deeper/f"), "x").unwrap();
        std::fs::write(dir.path().join("top"), "x").unwrap();

        prepare_destination(dir.path(), true).unwrap();
        assert!(dir.path().is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_clear_does_not_follow_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("precious"), "x").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        clear_directory(dir.path()).unwrap();
        assert!(outside.path().join("precious").exists());
        assert!(!dir.path().join("link").exists());
    }
}
