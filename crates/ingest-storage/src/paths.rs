// SPDX-License-Identifier: MIT

//! Path computation for the three trees in spec.md §6:
//! `incoming/<session>/`, `.processing/<date>/<session>/`, and
//! `staging/<date>/<session>/`.

use std::path::{Path, PathBuf};

use ingest_core::session::DatePrefix;

/// Literal suffix marking a completed upload: `<name>.completed`.
pub const COMPLETION_MARKER_SUFFIX: &str = ".completed";

pub fn incoming_dir(incoming_root: &Path, session: &str) -> PathBuf {
    incoming_root.join(session)
}

pub fn incoming_path(incoming_root: &Path, session: &str, filename: &str) -> PathBuf {
    incoming_dir(incoming_root, session).join(filename)
}

pub fn processing_dir(processing_root: &Path, date: DatePrefix, session: &str) -> PathBuf {
    processing_root.join(date.as_str()).join(session)
}

pub fn processing_path(
    processing_root: &Path,
    date: DatePrefix,
    session: &str,
    filename: &str,
) -> PathBuf {
    processing_dir(processing_root, date, session).join(filename)
}

pub fn completed_path(processing_path: &Path) -> PathBuf {
    let mut os = processing_path.as_os_str().to_owned();
    os.push(COMPLETION_MARKER_SUFFIX);
    PathBuf::from(os)
}

pub fn is_completion_marker(filename: &str) -> bool {
    filename.ends_with(COMPLETION_MARKER_SUFFIX)
}

/// Strip the `.completed` suffix, if present.
pub fn strip_completion_marker(filename: &str) -> &str {
    filename.strip_suffix(COMPLETION_MARKER_SUFFIX).unwrap_or(filename)
}

pub fn staging_dir(staging_root: &Path, date: DatePrefix, session: &str) -> PathBuf {
    staging_root.join(date.as_str()).join(session)
}

pub fn staging_path(
    staging_root: &Path,
    date: DatePrefix,
    session: &str,
    filename: &str,
) -> PathBuf {
    staging_dir(staging_root, date, session).join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_core::clock::FakeClock;

    fn date() -> DatePrefix {
        DatePrefix::capture(&FakeClock::new(0))
    }

    #[test]
    fn processing_layout_matches_spec() {
        let root = Path::new("/nfs/.processing");
        let path = processing_path(root, date(), "S1", "a.bin");
        assert_eq!(path, root.join(date().as_str()).join("S1").join("a.bin"));
    }

    #[test]
    fn completed_path_appends_suffix() {
        let p = Path::new("/x/.processing/20260301/S1/a.bin");
        let marked = completed_path(p);
        assert_eq!(marked, Path::new("/x/.processing/20260301/S1/a.bin.completed"));
        assert!(is_completion_marker(marked.file_name().unwrap().to_str().unwrap()));
    }

    #[test]
    fn strip_marker_is_identity_without_suffix() {
        assert_eq!(strip_completion_marker("a.bin"), "a.bin");
        assert_eq!(strip_completion_marker("a.bin.completed"), "a.bin");
    }
}
