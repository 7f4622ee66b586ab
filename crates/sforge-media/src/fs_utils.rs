//! Filesystem helpers for handing finished files out of a run's temp area.
//!
//! The temp area and the output directory are often on different mounts, so a
//! plain rename can fail with EXDEV.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// EXDEV ("cross-device link") on Linux and macOS.
const EXDEV: i32 = 18;

/// Move `src` to `dst`, copying across filesystems when rename is not possible.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.exists() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(EXDEV) => {
            tracing::debug!(
                "Cross-device move {} -> {}, copying",
                src.display(),
                dst.display()
            );
            copy_then_remove(src, dst).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Move `src` into `dir`, keeping its file name. Returns the new path.
pub async fn move_into_dir(src: impl AsRef<Path>, dir: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let src = src.as_ref();
    let name = src
        .file_name()
        .ok_or_else(|| MediaError::internal(format!("{} has no file name", src.display())))?;
    let dst = dir.as_ref().join(name);
    move_file(src, &dst).await?;
    Ok(dst)
}

async fn copy_then_remove(src: &Path, dst: &Path) -> MediaResult<()> {
    // Stage next to the destination so the final rename stays on one filesystem.
    let staged = dst.with_extension("partial");

    if let Err(e) = fs::copy(src, &staged).await {
        let _ = fs::remove_file(&staged).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&staged, dst).await {
        let _ = fs::remove_file(&staged).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!("Could not remove {} after copy: {}", src.display(), e);
    }
    Ok(())
}
