// SPDX-License-Identifier: MIT

//! Cooperative cancellation over blocking-ish NFS calls (spec.md §5,
//! "Cancellation and timeouts"): every call against the NFS tree races
//! against a [`CancellationToken`], and on cancellation the in-flight call
//! is abandoned rather than awaited, so a stuck NFS mount can never block
//! shutdown. `tokio::fs` already dispatches onto the blocking pool
//! internally, so racing the returned future is enough — dropping it here
//! detaches the underlying blocking task rather than joining it.

use tokio_util::sync::CancellationToken;

/// Race `fut` against `cancel`. Returns `None` if cancellation won, in
/// which case `fut` is dropped (abandoned, not awaited).
pub async fn abandon_on_cancel<F>(cancel: &CancellationToken, fut: F) -> Option<F::Output>
where
    F: std::future::Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}
