// SPDX-License-Identifier: MIT

//! The file-stability watcher (spec.md §4.1): a single cooperative task
//! polling the active session's `incoming` subdirectory, detecting files
//! whose `(size, mtime)` is unchanged across two consecutive polls and old
//! enough to trust, and handing them to the queue exactly once.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ingest_core::clock::Clock;
use ingest_core::session::SessionDescriptor;
use ingest_core::WorkItem;
use ingest_storage::paths::incoming_dir;
use ingest_storage::scan::{newly_stable, prune_pending, scan_directory, ScanRecord};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cancel::abandon_on_cancel;
use crate::queue::WorkSender;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

pub struct WatcherConfig<C: Clock> {
    pub incoming_root: PathBuf,
    pub poll_interval: Duration,
    pub min_file_age: Duration,
    pub extension_allowlist: Vec<String>,
    pub clock: C,
}

/// Run the watcher loop until `cancel` fires. Spec.md §4.1's per-cycle
/// contract, steps 1-6.
pub async fn run<C: Clock>(
    config: WatcherConfig<C>,
    session: Arc<SessionDescriptor>,
    sender: WorkSender,
    cancel: CancellationToken,
) {
    let mut previous = ScanRecord::new();
    let mut pending: HashSet<String> = HashSet::new();
    let mut backoff = config.poll_interval;

    while !cancel.is_cancelled() {
        if abandon_on_cancel(&cancel, tokio::time::sleep(backoff)).await.is_none() {
            break;
        }

        let Some((name, _date)) = session.active_session() else {
            previous.clear();
            pending.clear();
            backoff = config.poll_interval;
            continue;
        };

        let dir = incoming_dir(&config.incoming_root, name.as_str());
        let allowlist = config.extension_allowlist.clone();
        let extension_allowed = move |filename: &str| -> bool {
            if allowlist.is_empty() {
                return true;
            }
            match filename.rsplit_once('.') {
                Some((_, ext)) => allowlist.iter().any(|a| a.eq_ignore_ascii_case(ext)),
                None => false,
            }
        };

        let scan_result = abandon_on_cancel(&cancel, scan_directory(&dir, extension_allowed)).await;
        let Some(scan_result) = scan_result else { break };

        let current = match scan_result {
            Ok(current) => {
                backoff = config.poll_interval;
                current
            }
            Err(e) => {
                warn!(session = %name, error = %e, "watcher: scan failed, backing off");
                backoff = (backoff * 2).min(MAX_BACKOFF);
                continue;
            }
        };

        prune_pending(&mut pending, &current);

        let now_ms = config.clock.epoch_ms();
        let stable = newly_stable(&previous, &current, &pending, config.min_file_age, now_ms);

        for filename in stable {
            let Some((name, date)) = session.active_session() else { break };
            let item = WorkItem::new(dir.join(&filename), name.as_str(), date, filename.clone());
            if abandon_on_cancel(&cancel, sender.send(item)).await.is_none() {
                break;
            }
            pending.insert(filename);
        }

        previous = current;
    }
}
