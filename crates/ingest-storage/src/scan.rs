// SPDX-License-Identifier: MIT

//! The watcher's stability predicate: two consecutive identical
//! `(size, mtime)` observations plus a minimum-age floor (spec.md §4.1).
//!
//! The directory enumeration (I/O) and the stability decision (pure) are
//! split deliberately: the decision is exercised by unit tests with no
//! filesystem at all.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use crate::error::StorageError;

/// One observed `(size, mtime)` pair for a filename, in milliseconds since
/// the epoch for `mtime` to avoid pulling in a second time representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub mtime_ms: u64,
}

/// A single watcher iteration's directory listing.
pub type ScanRecord = HashMap<String, FileStat>;

/// Enumerate `dir`'s regular files matching `extension_allowed`, returning
/// an empty record (not an error) if `dir` itself does not exist — spec.md
/// §4.1 step 3: "Missing `incoming/<session>/` is not an error."
pub async fn scan_directory(
    dir: &Path,
    extension_allowed: impl Fn(&str) -> bool,
) -> Result<ScanRecord, StorageError> {
    let mut record = ScanRecord::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(record),
        Err(e) => return Err(StorageError::io(dir, e)),
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            // A per-entry "gone" error (ENOENT/ESTALE) is swallowed; any
            // other enumeration error aborts the cycle.
            Err(e) => {
                let classified = StorageError::io(dir, e);
                if classified.is_gone() {
                    continue;
                }
                return Err(classified);
            }
        };

        let filename = entry.file_name().to_string_lossy().into_owned();
        if !extension_allowed(&filename) {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(m) => m,
            Err(e) => {
                let classified = StorageError::io(entry.path(), e);
                if classified.is_gone() {
                    continue;
                }
                return Err(classified);
            }
        };
        if !metadata.is_file() {
            continue;
        }
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        record.insert(filename, FileStat { size: metadata.len(), mtime_ms });
    }

    Ok(record)
}

/// Decide which filenames newly became stable this cycle: present in both
/// `previous` and `current` with an identical `(size, mtime)`, old enough
/// (`now_ms - mtime_ms >= min_file_age`), and not already in `pending`
/// (spec.md §4.1 step 5).
pub fn newly_stable(
    previous: &ScanRecord,
    current: &ScanRecord,
    pending: &HashSet<String>,
    min_file_age: Duration,
    now_ms: u64,
) -> Vec<String> {
    let min_age_ms = min_file_age.as_millis() as u64;
    let mut stable = Vec::new();
    for (filename, stat) in current {
        if pending.contains(filename) {
            continue;
        }
        let Some(prev_stat) = previous.get(filename) else { continue };
        if prev_stat != stat {
            continue;
        }
        if now_ms.saturating_sub(stat.mtime_ms) < min_age_ms {
            continue;
        }
        stable.push(filename.clone());
    }
    stable.sort();
    stable
}

/// Prune `pending` to only filenames still present in `current` — entries
/// absent from the listing are assumed claimed by a worker (spec.md §4.1
/// step 4).
pub fn prune_pending(pending: &mut HashSet<String>, current: &ScanRecord) {
    pending.retain(|name| current.contains_key(name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(size: u64, mtime_ms: u64) -> FileStat {
        FileStat { size, mtime_ms }
    }

    #[test]
    fn identical_and_old_enough_is_stable() {
        let mut prev = ScanRecord::new();
        prev.insert("a.bin".into(), stat(10, 1000));
        let mut cur = ScanRecord::new();
        cur.insert("a.bin".into(), stat(10, 1000));

        let stable = newly_stable(&prev, &cur, &HashSet::new(), Duration::from_secs(5), 6500);
        assert_eq!(stable, vec!["a.bin".to_string()]);
    }

    #[test]
    fn too_young_is_not_stable() {
        let mut prev = ScanRecord::new();
        prev.insert("a.bin".into(), stat(10, 1000));
        let mut cur = ScanRecord::new();
        cur.insert("a.bin".into(), stat(10, 1000));

        // only 2s elapsed, min age is 5s
        let stable = newly_stable(&prev, &cur, &HashSet::new(), Duration::from_secs(5), 3000);
        assert!(stable.is_empty());
    }

    #[test]
    fn changed_size_is_not_stable() {
        let mut prev = ScanRecord::new();
        prev.insert("a.bin".into(), stat(10, 1000));
        let mut cur = ScanRecord::new();
        cur.insert("a.bin".into(), stat(20, 1000));

        let stable = newly_stable(&prev, &cur, &HashSet::new(), Duration::from_secs(5), 60_000);
        assert!(stable.is_empty());
    }

    #[test]
    fn already_pending_is_not_restable() {
        let mut prev = ScanRecord::new();
        prev.insert("a.bin".into(), stat(10, 1000));
        let mut cur = ScanRecord::new();
        cur.insert("a.bin".into(), stat(10, 1000));
        let mut pending = HashSet::new();
        pending.insert("a.bin".to_string());

        let stable = newly_stable(&prev, &cur, &pending, Duration::from_secs(5), 60_000);
        assert!(stable.is_empty());
    }

    #[test]
    fn prune_drops_entries_absent_from_listing() {
        let mut pending: HashSet<String> = ["a.bin".to_string(), "b.bin".to_string()].into();
        let mut cur = ScanRecord::new();
        cur.insert("a.bin".into(), stat(1, 1));
        prune_pending(&mut pending, &cur);
        assert!(pending.contains("a.bin"));
        assert!(!pending.contains("b.bin"));
    }

    #[tokio::test]
    async fn scan_missing_directory_is_empty_not_error() {
        let record = scan_directory(Path::new("/does/not/exist"), |_| true).await.unwrap();
        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn scan_directory_respects_extension_filter() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("x.bin"), b"1").await.unwrap();
        tokio::fs::write(dir.path().join("y.tmp"), b"1").await.unwrap();

        let record = scan_directory(dir.path(), |name| name.ends_with(".bin")).await.unwrap();
        assert_eq!(record.len(), 1);
        assert!(record.contains_key("x.bin"));
    }
}
