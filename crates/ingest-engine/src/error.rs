// SPDX-License-Identifier: MIT

//! Errors surfaced by the engine's control-surface operations
//! (`start_session`/`stop_session`): session-name validation and directory
//! setup failures, both `fatal-configuration`-adjacent in the spec's terms
//! but scoped to a single request rather than the whole process.

use ingest_core::IngestError;
use ingest_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a session is already active")]
    AlreadyActive,

    #[error(transparent)]
    InvalidSessionName(#[from] IngestError),

    #[error("failed to prepare session directories: {0}")]
    Storage(#[from] StorageError),
}
