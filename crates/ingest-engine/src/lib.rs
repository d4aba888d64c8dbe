// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ingest-engine: the runtime driving the ingest pipeline over the
//! directory-model state machine in `ingest-storage` and the upload
//! boundary in `ingest-blob` — the watcher, the bounded queue, the worker
//! pool, and the session registry the control surface calls into.

pub mod cancel;
pub mod error;
pub mod queue;
pub mod reaper;
pub mod runtime;
pub mod session;
pub mod watcher;
pub mod worker;

pub use error::EngineError;
pub use runtime::{start, Engine};
pub use session::SessionRegistry;
