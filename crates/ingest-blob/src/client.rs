// SPDX-License-Identifier: MIT

//! The blob-upload boundary trait (spec.md §4.4).

use std::path::Path;

use async_trait::async_trait;

use crate::error::BlobError;

/// The one contract the ingest core requires from cloud storage: commit a
/// new blob version whose contents are exactly the bytes of a local file,
/// with overwrite semantics, resolved last-writer-wins on concurrent
/// uploads to the same name. Partial uploads must not be visible.
#[async_trait]
pub trait BlobClient: Send + Sync {
    /// Validate credentials with one successful metadata call against the
    /// target container. Called once at startup before the pipeline
    /// accepts work (spec.md §4.4's authentication lifecycle).
    async fn validate(&self) -> Result<(), BlobError>;

    /// Upload `local_path`'s contents as a block blob named `blob_name`,
    /// overwriting any existing blob under that name, with `concurrency`
    /// block puts in flight at once (spec.md §4.3 step 3, §4.4's
    /// concurrency-hint input). Implementations that upload in a single
    /// call are free to ignore the hint.
    async fn put_block_blob(
        &self,
        blob_name: &str,
        local_path: &Path,
        concurrency: usize,
    ) -> Result<(), BlobError>;
}
