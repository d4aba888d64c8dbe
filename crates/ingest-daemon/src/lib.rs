// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `ingestd` library half: the HTTP control surface and its error type,
//! split out from the binary so integration tests can drive the real
//! router against a live engine (spec.md §6).

pub mod error;
pub mod http;

pub use error::DaemonError;
