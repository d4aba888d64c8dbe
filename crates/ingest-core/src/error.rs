// SPDX-License-Identifier: MIT

//! Error taxonomy shared by the core crate: configuration loading and
//! session-name validation. Storage- and blob-specific failures live in
//! their own crates' error enums (`ingest_storage::StorageError`,
//! `ingest_blob::BlobError`) per the error-kind table in the spec.

use thiserror::Error;

/// Errors raised while loading configuration or validating session names.
///
/// These are all `fatal-configuration` in the spec's terms: callers should
/// abort startup rather than attempt recovery.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {name}: {value:?}")]
    InvalidEnvVar { name: String, value: String },

    #[error("invalid session name {0:?}: must match [A-Za-z0-9_.-]+")]
    InvalidSessionName(String),
}
