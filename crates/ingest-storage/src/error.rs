// SPDX-License-Identifier: MIT

//! Storage-layer error taxonomy: `transient-fs`, `benign-gone`, and
//! `item-fs` from the error-kind table in spec.md §7.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The rename/unlink source disappeared from under us: ENOENT or ESTALE.
    /// A benign race with another claimer (spec.md I4); callers drop the
    /// item silently rather than treating it as a failure.
    #[error("path gone (benign race): {0}")]
    Gone(PathBuf),

    /// Any other I/O failure. `item-fs` for worker-step errors, `transient-fs`
    /// for watcher/reaper sweep errors — the caller assigns the meaning.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Claim attempted across filesystems — a configuration error per
    /// spec.md §9 ("Rename as lock" requires same-filesystem renames).
    #[error("cross-device rename from {from} to {to}: same-filesystem layout required")]
    CrossDevice { from: PathBuf, to: PathBuf },
}

/// errno ESTALE (Linux): a stale NFS file handle after a remote delete.
#[cfg(target_os = "linux")]
const ESTALE: i32 = 116;
/// errno EXDEV: rename attempted across filesystems.
#[cfg(target_os = "linux")]
const EXDEV: i32 = 18;

impl StorageError {
    /// Classify a failed rename/unlink/open against `path`: `ENOENT`/`ESTALE`
    /// become [`StorageError::Gone`] (spec.md I4's benign race), everything
    /// else is a plain I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if is_gone(&source) {
            Self::Gone(path)
        } else {
            Self::Io { path, source }
        }
    }

    /// Classify a failed rename specifically, additionally detecting
    /// cross-device renames (a configuration error per spec.md §9).
    pub fn rename(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let from = from.into();
        let to = to.into();
        if is_gone(&source) {
            Self::Gone(from)
        } else if is_cross_device(&source) {
            Self::CrossDevice { from, to }
        } else {
            Self::Io { path: from, source }
        }
    }

    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone(_))
    }
}

fn is_gone(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    if err.kind() == ErrorKind::NotFound {
        return true;
    }
    #[cfg(target_os = "linux")]
    {
        err.raw_os_error() == Some(ESTALE)
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

fn is_cross_device(err: &std::io::Error) -> bool {
    #[cfg(target_os = "linux")]
    {
        err.raw_os_error() == Some(EXDEV)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = err;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_gone() {
        let err = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(StorageError::io("/tmp/x", err).is_gone());
    }

    #[test]
    fn other_errors_are_not_gone() {
        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(!StorageError::io("/tmp/x", err).is_gone());
    }
}
