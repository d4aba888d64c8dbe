// SPDX-License-Identifier: MIT

//! The session control surface consumed by the HTTP layer (spec.md §6):
//! `start_session`/`stop_session`/`get_status`, backed by
//! [`ingest_core::SessionDescriptor`] and the three on-disk trees it must
//! provision at start.

use std::path::PathBuf;
use std::sync::Arc;

use ingest_core::clock::Clock;
use ingest_core::session::{DatePrefix, SessionDescriptor, SessionName, SessionStatus};
use ingest_storage::claim::ensure_dir;
use ingest_storage::paths::{incoming_dir, processing_dir, staging_dir};

use crate::error::EngineError;

/// Owns the single active session descriptor plus the three filesystem
/// roots needed to provision a new session's directories.
pub struct SessionRegistry {
    descriptor: Arc<SessionDescriptor>,
    incoming_root: PathBuf,
    processing_root: PathBuf,
    staging_root: PathBuf,
}

impl SessionRegistry {
    pub fn new(incoming_root: PathBuf, processing_root: PathBuf, staging_root: PathBuf) -> Self {
        Self { descriptor: SessionDescriptor::new(), incoming_root, processing_root, staging_root }
    }

    pub fn descriptor(&self) -> Arc<SessionDescriptor> {
        Arc::clone(&self.descriptor)
    }

    /// Start a session: reject if one is already active, otherwise
    /// provision `incoming/`, `.processing/<date>/<session>/`, and
    /// `staging/<date>/<session>/` before marking the session active
    /// (spec.md §6, `start_session`).
    pub async fn start_session(
        &self,
        name: Option<String>,
        clock: &impl Clock,
    ) -> Result<(DatePrefix, SessionName), EngineError> {
        if self.descriptor.is_active() {
            return Err(EngineError::AlreadyActive);
        }

        let name = match name {
            Some(raw) => SessionName::parse(raw)?,
            None => SessionName::generate(),
        };
        let date = DatePrefix::capture(clock);

        ensure_dir(&incoming_dir(&self.incoming_root, name.as_str())).await?;
        ensure_dir(&processing_dir(&self.processing_root, date, name.as_str())).await?;
        ensure_dir(&staging_dir(&self.staging_root, date, name.as_str())).await?;

        if !self.descriptor.start(name.clone(), date) {
            return Err(EngineError::AlreadyActive);
        }
        Ok((date, name))
    }

    /// Stop the active session. In-flight workers and queued items continue
    /// to drain; the watcher simply stops enqueueing new files (spec.md §6,
    /// `stop_session`). Idempotent: stopping an inactive session is a no-op.
    pub fn stop_session(&self) {
        self.descriptor.stop();
    }

    pub fn status(&self) -> SessionStatus {
        self.descriptor.status()
    }
}
