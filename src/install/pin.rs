//! Atomic artifact pinning.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Pin an artifact: atomically replace `dest` with the content of
/// `source`.
///
/// The bytes are written to a temporary file in the destination
/// directory and renamed into place, so readers only ever observe the
/// old artifact or the new one, never a partial write. Repeating the
/// pin with identical content is a no-op from the outside: one file,
/// same bytes.
pub fn pin_artifact(source: &Path, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .context("pinned artifact path has no parent directory")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("creating install directory at {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .context("creating temporary file for pinning")?;

    let mut reader = fs::File::open(source)
        .with_context(|| format!("opening artifact {}", source.display()))?;
    io::copy(&mut reader, tmp.as_file_mut())
        .with_context(|| format!("copying artifact from {}", source.display()))?;

    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o755))
        .context("marking pinned artifact executable")?;

    // Same-directory rename, so the swap is atomic.
    tmp.persist(dest)
        .with_context(|| format!("pinning artifact at {}", dest.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn pinning_twice_leaves_one_identical_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("download.AppImage");
        fs::write(&source, b"artifact-v1").unwrap();
        let dest = dir.path().join("app/cursor.AppImage");

        pin_artifact(&source, &dest).unwrap();
        let first = fs::read(&dest).unwrap();
        pin_artifact(&source, &dest).unwrap();
        let second = fs::read(&dest).unwrap();

        assert_eq!(first, b"artifact-v1");
        assert_eq!(first, second);
        // Exactly one regular file in the install directory.
        let entries: Vec<_> = fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn pinning_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.AppImage");
        let new = dir.path().join("new.AppImage");
        fs::write(&old, b"old-bytes").unwrap();
        fs::write(&new, b"new-bytes").unwrap();
        let dest = dir.path().join("cursor.AppImage");

        pin_artifact(&old, &dest).unwrap();
        pin_artifact(&new, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"new-bytes");
    }

    #[test]
    fn pinned_artifact_is_executable() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("download.AppImage");
        fs::write(&source, b"bytes").unwrap();
        let dest = dir.path().join("cursor.AppImage");

        pin_artifact(&source, &dest).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cursor.AppImage");
        let result = pin_artifact(&dir.path().join("nope"), &dest);
        assert!(result.is_err());
        assert!(!dest.exists());
    }
}
