// SPDX-License-Identifier: MIT

//! Failure modes surfaced across the upload boundary (spec.md §4.4):
//! transient (network/throttling, may already have been retried
//! internally) and terminal (auth, missing container, retry budget
//! exhausted). The core treats any error as item-level failure; the
//! transient/terminal split exists for logging and for the startup
//! credential check, which must abort on terminal failures only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("transient upload failure for {blob_name}: {message}")]
    Transient { blob_name: String, message: String },

    #[error("terminal upload failure for {blob_name}: {message}")]
    Terminal { blob_name: String, message: String },

    #[error("blob credential validation failed against container {container}: {message}")]
    AuthValidation { container: String, message: String },

    #[error("local I/O error while preparing upload of {blob_name}: {source}")]
    Io {
        blob_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid blob client configuration: {0}")]
    Config(String),
}

impl BlobError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. } | Self::AuthValidation { .. })
    }
}
