// SPDX-License-Identifier: MIT

//! The worker pipeline (spec.md §4.3): claim → stage → upload → mark →
//! clean, one work item at a time per worker, `W` workers consuming
//! concurrently from the shared queue. Workers never communicate with each
//! other; they synchronize through the filesystem (rename wins) and the
//! queue.

use std::path::PathBuf;
use std::sync::Arc;

use ingest_blob::BlobClient;
use ingest_core::session::SessionDescriptor;
use ingest_core::WorkItem;
use ingest_storage::claim::{claim, ensure_dir, mark_completed};
use ingest_storage::paths::{processing_dir, staging_dir};
use ingest_storage::stage::{copy_to_staging, remove_staging};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cancel::abandon_on_cancel;
use crate::queue::WorkReceiver;

pub struct WorkerContext {
    pub processing_root: PathBuf,
    pub staging_root: PathBuf,
    pub blob_client: Arc<dyn BlobClient>,
    pub session: Arc<SessionDescriptor>,
    pub upload_concurrency: usize,
}

/// Drain `receiver` until the queue closes or `cancel` fires, driving each
/// item through the full pipeline.
pub async fn run(id: usize, receiver: WorkReceiver, ctx: Arc<WorkerContext>, cancel: CancellationToken) {
    loop {
        let next = {
            let mut guard = receiver.lock().await;
            abandon_on_cancel(&cancel, guard.recv()).await
        };
        let item = match next {
            Some(Some(item)) => item,
            _ => break,
        };
        process_item(id, item, &ctx, &cancel).await;
    }
}

async fn process_item(id: usize, item: WorkItem, ctx: &WorkerContext, cancel: &CancellationToken) {
    let date = item.date_prefix;
    let session = item.session_name.as_str();
    let filename = item.filename.as_str();
    let blob_name = item.blob_name();

    // Step 1: claim (skip when recovery already found the file in `.processing`).
    let claimed_path = if item.from_recovery {
        item.source_path.clone()
    } else {
        let dest_dir = processing_dir(&ctx.processing_root, date, session);
        match abandon_on_cancel(cancel, claim(&item.source_path, &dest_dir)).await {
            None => return,
            Some(Ok(path)) => path,
            Some(Err(e)) if e.is_gone() => {
                info!(session, filename, "worker: claim lost race, benign");
                return;
            }
            Some(Err(e)) => {
                warn!(session, filename, error = %e, "worker: claim failed");
                ctx.session.record_err(format!("claim {filename}: {e}"));
                return;
            }
        }
    };

    // Step 2: stage.
    let stage_dir = staging_dir(&ctx.staging_root, date, session);
    if abandon_on_cancel(cancel, ensure_dir(&stage_dir)).await.is_none() {
        return;
    }
    let staged = match abandon_on_cancel(cancel, copy_to_staging(&claimed_path, &stage_dir)).await {
        None => return,
        Some(Ok(path)) => path,
        Some(Err(e)) => {
            warn!(session, filename, error = %e, "worker: stage failed");
            ctx.session.record_err(format!("stage {filename}: {e}"));
            return;
        }
    };

    // Step 3: upload. Duration and file size are recorded as observability
    // samples per spec.md §4.3 step 3.
    let file_size = tokio::fs::metadata(&staged).await.map(|m| m.len()).unwrap_or(0);
    let started = std::time::Instant::now();
    let upload = ctx.blob_client.put_block_blob(&blob_name, &staged, ctx.upload_concurrency);
    match abandon_on_cancel(cancel, upload).await {
        None => return,
        Some(Ok(())) => {
            info!(
                worker = id,
                session,
                filename,
                blob_name,
                bytes = file_size,
                duration_ms = started.elapsed().as_millis() as u64,
                "worker: blob upload complete"
            );
        }
        Some(Err(e)) => {
            warn!(worker = id, session, filename, blob_name, error = %e, "worker: upload failed");
            ctx.session.record_err(format!("upload {filename}: {e}"));
            return;
        }
    }

    // Step 4: mark (the commit point).
    match abandon_on_cancel(cancel, mark_completed(&claimed_path)).await {
        None => return,
        Some(Ok(_)) => {}
        Some(Err(e)) => {
            warn!(session, filename, error = %e, "worker: mark-completed failed");
            ctx.session.record_err(format!("mark {filename}: {e}"));
            return;
        }
    }

    // Step 5: clean (best-effort, non-fatal).
    abandon_on_cancel(cancel, remove_staging(&staged)).await;

    ctx.session.record_ok();
    info!(worker = id, session, filename, blob_name, "worker: upload complete");
}
