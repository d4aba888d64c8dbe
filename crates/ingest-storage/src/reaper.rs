// SPDX-License-Identifier: MIT

//! Periodic sweep of `.processing/` (spec.md §4.6): unlink completion
//! markers, then prune empty `<session>/` and `<date>/` directories
//! bottom-up. All errors are logged and ignored by the caller — the next
//! cycle retries.

use std::path::Path;

use tracing::debug;

use crate::error::StorageError;
use crate::paths::is_completion_marker;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReapSummary {
    pub markers_removed: u64,
    pub dirs_removed: u64,
}

/// Run one reaper cycle over `processing_root`.
pub async fn sweep(processing_root: &Path) -> Result<ReapSummary, StorageError> {
    let mut summary = ReapSummary::default();

    let mut date_dirs = match tokio::fs::read_dir(processing_root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(summary),
        Err(e) => return Err(StorageError::io(processing_root, e)),
    };

    let mut date_paths = Vec::new();
    while let Some(entry) =
        date_dirs.next_entry().await.map_err(|e| StorageError::io(processing_root, e))?
    {
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            date_paths.push(entry.path());
        }
    }

    for date_path in date_paths {
        let mut session_dirs = tokio::fs::read_dir(&date_path)
            .await
            .map_err(|e| StorageError::io(&date_path, e))?;
        let mut session_paths = Vec::new();
        while let Some(entry) =
            session_dirs.next_entry().await.map_err(|e| StorageError::io(&date_path, e))?
        {
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                session_paths.push(entry.path());
            }
        }

        for session_path in session_paths {
            reap_session_dir(&session_path, &mut summary).await;
            remove_if_empty(&session_path, &mut summary).await;
        }

        remove_if_empty(&date_path, &mut summary).await;
    }

    Ok(summary)
}

async fn reap_session_dir(session_path: &Path, summary: &mut ReapSummary) {
    let mut files = match tokio::fs::read_dir(session_path).await {
        Ok(f) => f,
        Err(e) => {
            debug!(path = %session_path.display(), error = %e, "reaper: could not list session dir");
            return;
        }
    };

    let mut markers = Vec::new();
    loop {
        match files.next_entry().await {
            Ok(Some(entry)) => {
                let filename = entry.file_name().to_string_lossy().into_owned();
                if is_completion_marker(&filename) {
                    markers.push(entry.path());
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(path = %session_path.display(), error = %e, "reaper: listing error, will retry next cycle");
                break;
            }
        }
    }

    for marker in markers {
        match tokio::fs::remove_file(&marker).await {
            Ok(()) => summary.markers_removed += 1,
            Err(e) => debug!(path = %marker.display(), error = %e, "reaper: failed to remove marker"),
        }
    }
}

async fn remove_if_empty(dir: &Path, summary: &mut ReapSummary) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(e) => e,
        Err(_) => return,
    };
    let is_empty = matches!(entries.next_entry().await, Ok(None));
    if is_empty {
        match tokio::fs::remove_dir(dir).await {
            Ok(()) => summary.dirs_removed += 1,
            Err(e) => debug!(path = %dir.display(), error = %e, "reaper: failed to prune empty dir"),
        }
    }
}
