//! AppImage extraction.

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};

/// Unpack the pinned AppImage into the extraction directory.
///
/// `--appimage-extract` works without FUSE and always produces a
/// `squashfs-root` directory in the working directory. A leftover tree
/// from a previous run is replaced wholesale.
pub fn extract(artifact: &Path, extract_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(extract_dir)
        .with_context(|| format!("creating extraction directory at {}", extract_dir.display()))?;

    let root = extract_dir.join("squashfs-root");
    if root.exists() {
        fs::remove_dir_all(&root)
            .with_context(|| format!("removing previous extraction at {}", root.display()))?;
    }

    let output = duct::cmd(artifact, ["--appimage-extract"])
        .dir(extract_dir)
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .with_context(|| format!("running {} --appimage-extract", artifact.display()))?;

    if !output.status.success() {
        return Err(anyhow!(
            "extraction failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    if !root.is_dir() {
        return Err(anyhow!("extraction produced no squashfs-root directory"));
    }

    Ok(root)
}
