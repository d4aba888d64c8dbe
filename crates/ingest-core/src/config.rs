// SPDX-License-Identifier: MIT

//! Centralized environment-variable configuration, in the style of the
//! teacher's `daemon/src/env.rs` accessors: one function (or field) per
//! variable, sensible defaults for the tunables, hard failure for the
//! handful of variables that have none.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::IngestError;

/// Blob-store credentials, resolved at startup. The primary path is an
/// account URL plus ambient/managed-identity auth; the fallback is an
/// explicit connection string or account key, per spec.md §4.4's
/// authentication lifecycle.
#[derive(Debug, Clone)]
pub enum BlobCredentials {
    ConnectionString(String),
    AccountKey { account: String, key: String },
    Ambient,
}

/// Fully resolved daemon configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub azure_account_url: String,
    pub azure_container: String,
    pub credentials: BlobCredentials,

    pub nfs_incoming_root: PathBuf,
    pub nfs_processing_root: PathBuf,
    pub local_staging_root: PathBuf,

    pub poll_interval: Duration,
    pub min_file_age: Duration,
    pub extension_allowlist: Vec<String>,

    pub queue_capacity: usize,
    pub worker_count: usize,
    pub upload_concurrency: usize,
    pub reaper_interval: Duration,

    pub http_bind: String,
}

fn required(name: &str) -> Result<String, IngestError> {
    std::env::var(name).map_err(|_| IngestError::MissingEnvVar(name.to_string()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_u64(name: &str, default: u64) -> Result<u64, IngestError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| IngestError::InvalidEnvVar { name: name.to_string(), value }),
    }
}

fn parse_usize(name: &str, default: usize) -> Result<usize, IngestError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| IngestError::InvalidEnvVar { name: name.to_string(), value }),
    }
}

impl Config {
    /// Load configuration from `INGEST_`-prefixed environment variables.
    pub fn from_env() -> Result<Self, IngestError> {
        let azure_account_url = required("INGEST_AZURE_ACCOUNT_URL")?;
        let azure_container = required("INGEST_AZURE_CONTAINER")?;

        let credentials = if let Some(conn) = optional("INGEST_AZURE_CONNECTION_STRING") {
            BlobCredentials::ConnectionString(conn)
        } else if let Some(key) = optional("INGEST_AZURE_ACCOUNT_KEY") {
            let account = required("INGEST_AZURE_ACCOUNT_URL").map(|url| {
                // account name is the first URL path segment's host label
                url.trim_start_matches("https://")
                    .split('.')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })?;
            BlobCredentials::AccountKey { account, key }
        } else {
            BlobCredentials::Ambient
        };

        let extension_allowlist = optional("INGEST_EXTENSION_ALLOWLIST")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            azure_account_url,
            azure_container,
            credentials,
            nfs_incoming_root: PathBuf::from(required("INGEST_NFS_INCOMING_ROOT")?),
            nfs_processing_root: PathBuf::from(required("INGEST_NFS_PROCESSING_ROOT")?),
            local_staging_root: PathBuf::from(required("INGEST_LOCAL_STAGING_ROOT")?),
            poll_interval: Duration::from_secs(parse_u64("INGEST_POLL_INTERVAL_SECS", 5)?),
            min_file_age: Duration::from_secs(parse_u64("INGEST_MIN_FILE_AGE_SECS", 5)?),
            extension_allowlist,
            queue_capacity: parse_usize("INGEST_QUEUE_CAPACITY", 2000)?,
            worker_count: parse_usize("INGEST_WORKER_COUNT", 4)?,
            upload_concurrency: parse_usize("INGEST_UPLOAD_CONCURRENCY", 8)?,
            reaper_interval: Duration::from_secs(parse_u64("INGEST_REAPER_INTERVAL_SECS", 30)?),
            http_bind: optional("INGEST_HTTP_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        })
    }

    /// True if `filename`'s extension passes the allow-list (empty list = all).
    pub fn extension_allowed(&self, filename: &str) -> bool {
        if self.extension_allowlist.is_empty() {
            return true;
        }
        match filename.rsplit_once('.') {
            Some((_, ext)) => self.extension_allowlist.iter().any(|a| a.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}
