// SPDX-License-Identifier: MIT

//! In-memory [`BlobClient`] for tests, in the same spirit as the teacher's
//! `test-support` feature gating fake runtime adapters.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::BlobClient;
use crate::error::BlobError;

/// One recorded upload.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub blob_name: String,
    pub bytes: Vec<u8>,
}

/// Fake blob store. Uploads succeed and are recorded unless the blob name
/// matches a configured failure.
#[derive(Default)]
pub struct FakeBlobClient {
    uploads: Mutex<Vec<RecordedUpload>>,
    fail_terminal: Mutex<HashMap<String, String>>,
    fail_transient: Mutex<HashMap<String, String>>,
    validate_error: Mutex<Option<String>>,
    last_concurrency: Mutex<Option<usize>>,
}

impl FakeBlobClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put_block_blob` for `blob_name` fail terminally.
    pub fn fail_terminal(&self, blob_name: &str, message: &str) {
        self.fail_terminal.lock().insert(blob_name.to_string(), message.to_string());
    }

    /// Make the next `put_block_blob` for `blob_name` fail transiently; the
    /// failure is consumed on first attempt so a retry can succeed.
    pub fn fail_transient_once(&self, blob_name: &str, message: &str) {
        self.fail_transient.lock().insert(blob_name.to_string(), message.to_string());
    }

    pub fn fail_validate(&self, message: &str) {
        *self.validate_error.lock() = Some(message.to_string());
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().len()
    }

    pub fn find_upload(&self, blob_name: &str) -> Option<RecordedUpload> {
        self.uploads.lock().iter().find(|u| u.blob_name == blob_name).cloned()
    }

    /// The `concurrency` hint passed to the most recent `put_block_blob`
    /// call, for assertions that the worker actually threads it through.
    pub fn last_concurrency(&self) -> Option<usize> {
        *self.last_concurrency.lock()
    }
}

#[async_trait]
impl BlobClient for FakeBlobClient {
    async fn validate(&self) -> Result<(), BlobError> {
        match self.validate_error.lock().clone() {
            Some(message) => Err(BlobError::AuthValidation { container: "fake".to_string(), message }),
            None => Ok(()),
        }
    }

    async fn put_block_blob(
        &self,
        blob_name: &str,
        local_path: &Path,
        concurrency: usize,
    ) -> Result<(), BlobError> {
        *self.last_concurrency.lock() = Some(concurrency);
        if let Some(message) = self.fail_terminal.lock().get(blob_name).cloned() {
            return Err(BlobError::Terminal { blob_name: blob_name.to_string(), message });
        }
        if let Some(message) = self.fail_transient.lock().remove(blob_name) {
            return Err(BlobError::Transient { blob_name: blob_name.to_string(), message });
        }

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|source| BlobError::Io { blob_name: blob_name.to_string(), source })?;
        self.uploads.lock().push(RecordedUpload { blob_name: blob_name.to_string(), bytes });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    async fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = tokio::fs::File::create(&path).await.unwrap();
        file.write_all(contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn records_successful_uploads() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", b"hello").await;
        let client = FakeBlobClient::new();
        client.put_block_blob("2026/00-session-x/a.txt", &path, 8).await.unwrap();
        assert_eq!(client.upload_count(), 1);
        assert_eq!(client.find_upload("2026/00-session-x/a.txt").unwrap().bytes, b"hello");
    }

    #[tokio::test]
    async fn terminal_failure_is_not_recorded() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", b"hello").await;
        let client = FakeBlobClient::new();
        client.fail_terminal("bad", "container missing");
        let err = client.put_block_blob("bad", &path, 8).await.unwrap_err();
        assert!(err.is_terminal());
        assert_eq!(client.upload_count(), 0);
    }

    #[tokio::test]
    async fn transient_failure_is_consumed_once() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", b"hello").await;
        let client = FakeBlobClient::new();
        client.fail_transient_once("flaky", "throttled");
        let err = client.put_block_blob("flaky", &path, 8).await.unwrap_err();
        assert!(!err.is_terminal());
        client.put_block_blob("flaky", &path, 8).await.unwrap();
        assert_eq!(client.upload_count(), 1);
    }
}
