// SPDX-License-Identifier: MIT

//! Top-level daemon error, wrapping each crate's error taxonomy with
//! `#[from]` conversions, matching the teacher's `LifecycleError` pattern of
//! one daemon-wide enum collecting subsystem errors.

use ingest_blob::BlobError;
use ingest_core::IngestError;
use ingest_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(#[from] IngestError),

    #[error("blob credential validation failed at startup: {0}")]
    BlobValidation(#[from] BlobError),

    #[error("storage error during startup recovery: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to bind control-surface listener on {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },

    #[error("http server error: {0}")]
    Http(#[source] std::io::Error),
}
