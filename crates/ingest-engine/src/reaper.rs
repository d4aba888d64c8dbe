// SPDX-License-Identifier: MIT

//! The background reaper task (spec.md §4.6): periodically sweep
//! `.processing/` for completion markers and prune empty directories. All
//! sweep errors are logged and ignored — the next cycle retries.

use std::path::PathBuf;
use std::time::Duration;

use ingest_storage::reaper::sweep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cancel::abandon_on_cancel;

/// Run the reaper loop until `cancel` fires.
pub async fn run(processing_root: PathBuf, interval: Duration, cancel: CancellationToken) {
    while abandon_on_cancel(&cancel, tokio::time::sleep(interval)).await.is_some() {
        match abandon_on_cancel(&cancel, sweep(&processing_root)).await {
            None => break,
            Some(Ok(summary)) if summary.markers_removed > 0 || summary.dirs_removed > 0 => {
                debug!(markers = summary.markers_removed, dirs = summary.dirs_removed, "reaper: swept");
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => warn!(error = %e, "reaper: sweep failed, will retry next cycle"),
        }
    }
}
