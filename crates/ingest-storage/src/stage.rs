// SPDX-License-Identifier: MIT

//! Copying a claimed file into local ephemeral staging (spec.md §4.3 step 2)
//! and cleaning it up afterwards (step 5).

use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::debug;

use crate::claim::ensure_dir;
use crate::error::StorageError;

/// Copy `processing_path` into `staging_dir`, preserving size (implicit in
/// the copy) and mtime. Returns the staged path.
pub async fn copy_to_staging(
    processing_path: &Path,
    staging_dir: &Path,
) -> Result<PathBuf, StorageError> {
    ensure_dir(staging_dir).await?;
    let filename = processing_path.file_name().ok_or_else(|| {
        StorageError::io(
            processing_path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no filename"),
        )
    })?;
    let dest = staging_dir.join(filename);

    tokio::fs::copy(processing_path, &dest)
        .await
        .map_err(|e| StorageError::io(processing_path, e))?;

    let metadata =
        tokio::fs::metadata(processing_path).await.map_err(|e| StorageError::io(processing_path, e))?;
    let mtime = FileTime::from_last_modification_time(&metadata);
    let dest_for_blocking = dest.clone();
    // filetime is a sync API; run it on the blocking pool rather than
    // stalling the event loop.
    tokio::task::spawn_blocking(move || filetime::set_file_mtime(&dest_for_blocking, mtime))
        .await
        .map_err(|e| StorageError::Io { path: dest.clone(), source: std::io::Error::other(e) })?
        .map_err(|e| StorageError::io(&dest, e))?;

    Ok(dest)
}

/// Remove the staging copy. Failure is logged and non-fatal: staging is
/// ephemeral and is cleared on restart (spec.md §4.3 step 5).
pub async fn remove_staging(staged_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(staged_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %staged_path.display(), error = %e, "failed to remove staging copy");
        }
    }
}
