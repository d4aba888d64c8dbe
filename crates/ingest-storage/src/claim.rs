// SPDX-License-Identifier: MIT

//! The claim rename: `incoming/<session>/<name>` → `.processing/<date>/<session>/<name>`.
//!
//! This is the only cross-replica synchronization primitive available on
//! NFS (spec.md §9, "Rename as lock"). At most one racing claimer's rename
//! succeeds; the loser sees the source gone and drops the item silently
//! (spec.md I4).

use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Ensure `dir` exists, creating parents as needed. Workers call this
/// defensively even though session-start pre-creates it.
pub async fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) => Err(StorageError::io(dir, e)),
    }
}

/// Atomically rename `incoming_path` into `processing_dir`, returning the
/// new path. `Err(StorageError::Gone(_))` means another claimer won the
/// race; callers must treat that as a silent drop, not a failure.
pub async fn claim(incoming_path: &Path, processing_dir: &Path) -> Result<PathBuf, StorageError> {
    ensure_dir(processing_dir).await?;
    let filename = incoming_path.file_name().ok_or_else(|| {
        StorageError::io(
            incoming_path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no filename"),
        )
    })?;
    let dest = processing_dir.join(filename);
    tokio::fs::rename(incoming_path, &dest)
        .await
        .map_err(|e| StorageError::rename(incoming_path, &dest, e))?;
    Ok(dest)
}

/// Atomically rename a `.processing/` file to its `.completed` marker. This
/// is the commit point from the pipeline's perspective (spec.md §4.3 step 4).
pub async fn mark_completed(processing_path: &Path) -> Result<PathBuf, StorageError> {
    let marker = crate::paths::completed_path(processing_path);
    tokio::fs::rename(processing_path, &marker)
        .await
        .map_err(|e| StorageError::rename(processing_path, &marker, e))?;
    Ok(marker)
}
