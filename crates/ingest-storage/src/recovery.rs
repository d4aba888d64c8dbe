// SPDX-License-Identifier: MIT

//! Startup recovery (spec.md §4.5): walk `.processing/`, produce a work
//! item for every file without a `.completed` sibling, and select the
//! lexicographically-last `(date, session)` pair to auto-resume.

use ingest_core::session::DatePrefix;
use ingest_core::work_item::WorkItem;

use crate::error::StorageError;
use crate::paths::is_completion_marker;

/// Walk `processing_root/<date>/<session>/<file>`, building a [`WorkItem`]
/// for every file that is not itself a completion marker. Directory
/// enumeration errors are propagated as `transient-fs` (caller decides
/// whether to retry); a missing `processing_root` yields an empty result.
pub async fn walk_processing(processing_root: &std::path::Path) -> Result<Vec<WorkItem>, StorageError> {
    let mut items = Vec::new();

    let mut date_dirs = match tokio::fs::read_dir(processing_root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(items),
        Err(e) => return Err(StorageError::io(processing_root, e)),
    };

    let mut date_paths = Vec::new();
    while let Some(entry) = date_dirs.next_entry().await.map_err(|e| StorageError::io(processing_root, e))? {
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            date_paths.push(entry.path());
        }
    }

    for date_path in date_paths {
        let Some(date_str) = date_path.file_name().and_then(|n| n.to_str()) else { continue };
        let Some(date) = DatePrefix::from_str(date_str) else { continue };

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
            let Some(session) = session_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let session = session.to_string();

            let mut files = tokio::fs::read_dir(&session_path)
                .await
                .map_err(|e| StorageError::io(&session_path, e))?;
            while let Some(entry) =
                files.next_entry().await.map_err(|e| StorageError::io(&session_path, e))?
            {
                if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                    continue;
                }
                let filename = entry.file_name().to_string_lossy().into_owned();
                if is_completion_marker(&filename) {
                    continue;
                }
                items.push(WorkItem::from_recovery(
                    entry.path(),
                    session.clone(),
                    date,
                    filename,
                ));
            }
        }
    }

    Ok(items)
}

/// Select the lexicographically largest `(date, session)` tuple among the
/// recovered items, to auto-resume the watcher on the most recent session
/// (spec.md §4.5 step 5). Other sessions' files remain individually
/// recoverable without the watcher being active for them.
pub fn select_latest_session(items: &[WorkItem]) -> Option<(DatePrefix, String)> {
    items
        .iter()
        .map(|item| (item.date_prefix, item.session_name.clone()))
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
}
