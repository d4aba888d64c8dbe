// SPDX-License-Identifier: MIT

//! Session naming and the in-memory session descriptor.
//!
//! The directory tree is the source of truth (see `ingest-storage`); this
//! descriptor is a cache consulted by the watcher and mutated by the
//! control surface and workers. No in-memory state here is required for
//! correctness after a crash.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::IngestError;

/// A validated session name: either the auto-generated
/// `00-session-<UUIDv7>` form, or a user-provided name matching
/// `[A-Za-z0-9_.-]+`. The `00-` prefix on generated names exists so that
/// lexicographic sort still yields chronological order when mixed with
/// user-provided names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionName(String);

impl SessionName {
    /// Generate an auto-named session: `00-session-<UUIDv7>`.
    pub fn generate() -> Self {
        Self(format!("00-session-{}", Uuid::now_v7()))
    }

    /// Validate a user-provided session name against the control-surface
    /// grammar. Rejects anything containing a path separator or other
    /// character outside `[A-Za-z0-9_.-]`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, IngestError> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw.bytes().all(|b| {
                b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-'
            });
        if valid {
            Ok(Self(raw))
        } else {
            Err(IngestError::InvalidSessionName(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC `YYYYMMDD` date prefix, captured once at session start. It does
/// not roll over for the lifetime of the session even if the ingest run
/// crosses midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatePrefix([u8; 8]);

impl DatePrefix {
    /// Capture today's UTC date from the given clock.
    pub fn capture(clock: &impl Clock) -> Self {
        let dt: DateTime<Utc> = DateTime::from_timestamp_millis(clock.epoch_ms() as i64)
            .unwrap_or_else(Utc::now);
        let formatted = dt.format("%Y%m%d").to_string();
        Self::from_str(&formatted).unwrap_or(Self(*b"19700101"))
    }

    /// Parse an 8-digit `YYYYMMDD` string, as found in a `.processing/<date>/` path segment.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(s.as_bytes());
            Some(Self(buf))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        // Invariant: only ever constructed from 8 ASCII digit bytes.
        std::str::from_utf8(&self.0).unwrap_or("00000000")
    }
}

impl fmt::Display for DatePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of session counters, returned by the control surface's
/// `get_status` and safe to serialize across the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub active: bool,
    pub name: Option<String>,
    pub date_prefix: Option<String>,
    pub processed_ok: u64,
    pub processed_err: u64,
    pub last_error: Option<String>,
}

/// The single active session descriptor, owned by the daemon process and
/// consulted by the watcher and workers.
///
/// Counters are plain atomics rather than a mutex: increments need no
/// ordering relative to each other, only atomicity, per the spec's
/// concurrency model (§5).
pub struct SessionDescriptor {
    inner: RwLock<Option<Active>>,
    processed_ok: AtomicU64,
    processed_err: AtomicU64,
    last_error: RwLock<Option<String>>,
}

#[derive(Clone)]
struct Active {
    name: SessionName,
    date_prefix: DatePrefix,
}

impl SessionDescriptor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(None),
            processed_ok: AtomicU64::new(0),
            processed_err: AtomicU64::new(0),
            last_error: RwLock::new(None),
        })
    }

    /// Start a session. Returns `false` if a session is already active.
    pub fn start(&self, name: SessionName, date_prefix: DatePrefix) -> bool {
        let mut guard = self.inner.write();
        if guard.is_some() {
            return false;
        }
        *guard = Some(Active { name, date_prefix });
        true
    }

    /// Stop the session. In-flight workers and queued items continue; the
    /// watcher simply stops enqueueing new files.
    pub fn stop(&self) {
        self.inner.write().take();
    }

    pub fn active_session(&self) -> Option<(SessionName, DatePrefix)> {
        self.inner.read().as_ref().map(|a| (a.name.clone(), a.date_prefix))
    }

    pub fn is_active(&self) -> bool {
        self.inner.read().is_some()
    }

    pub fn record_ok(&self) {
        self.processed_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_err(&self, context: impl Into<String>) {
        self.processed_err.fetch_add(1, Ordering::Relaxed);
        *self.last_error.write() = Some(context.into());
    }

    pub fn status(&self) -> SessionStatus {
        let guard = self.inner.read();
        SessionStatus {
            active: guard.is_some(),
            name: guard.as_ref().map(|a| a.name.to_string()),
            date_prefix: guard.as_ref().map(|a| a.date_prefix.to_string()),
            processed_ok: self.processed_ok.load(Ordering::Relaxed),
            processed_err: self.processed_err.load(Ordering::Relaxed),
            last_error: self.last_error.read().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_name_has_chronological_prefix() {
        let name = SessionName::generate();
        assert!(name.as_str().starts_with("00-session-"));
    }

    #[test]
    fn user_name_rejects_path_separator() {
        assert!(SessionName::parse("foo/bar").is_err());
        assert!(SessionName::parse("foo bar").is_err());
        assert!(SessionName::parse("").is_err());
    }

    #[test]
    fn user_name_accepts_grammar() {
        assert!(SessionName::parse("S1").is_ok());
        assert!(SessionName::parse("my_session-1.final").is_ok());
    }

    #[test]
    fn date_prefix_round_trips() {
        let clock = crate::clock::FakeClock::new(0);
        let date = DatePrefix::capture(&clock);
        assert_eq!(date.as_str().len(), 8);
        assert_eq!(DatePrefix::from_str(date.as_str()), Some(date));
    }

    #[test]
    fn descriptor_rejects_second_start() {
        let desc = SessionDescriptor::new();
        let name = SessionName::parse("S1").unwrap();
        let clock = crate::clock::FakeClock::new(0);
        let date = DatePrefix::capture(&clock);
        assert!(desc.start(name.clone(), date));
        assert!(!desc.start(name, date));
    }

    #[test]
    fn descriptor_counters_are_independent() {
        let desc = SessionDescriptor::new();
        desc.record_ok();
        desc.record_ok();
        desc.record_err("boom: a.bin");
        let status = desc.status();
        assert_eq!(status.processed_ok, 2);
        assert_eq!(status.processed_err, 1);
        assert_eq!(status.last_error.as_deref(), Some("boom: a.bin"));
    }
}
