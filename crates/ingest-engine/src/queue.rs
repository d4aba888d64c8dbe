// SPDX-License-Identifier: MIT

//! The bounded handoff queue between watcher/recovery (producers) and
//! workers (consumers) — spec.md §4.2. Backed by `tokio::sync::mpsc`,
//! matching the teacher's use of `tokio::sync::mpsc` for its internal event
//! channel. Only small descriptors cross the queue, never file bytes, so
//! cancelling a producer or consumer never loses in-flight data.

use std::sync::Arc;

use ingest_core::WorkItem;
use tokio::sync::{mpsc, Mutex};

pub type WorkSender = mpsc::Sender<WorkItem>;

/// Multiple workers share one receiver; `tokio::sync::Mutex` serializes
/// access to `recv` without blocking the executor thread.
pub type WorkReceiver = Arc<Mutex<mpsc::Receiver<WorkItem>>>;

/// Create the bounded queue with capacity `Q` (spec.md §4.2 default 2000).
pub fn bounded(capacity: usize) -> (WorkSender, WorkReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, Arc::new(Mutex::new(rx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_core::clock::FakeClock;
    use ingest_core::session::DatePrefix;
    use std::path::PathBuf;

    fn item(name: &str) -> WorkItem {
        WorkItem::new(PathBuf::from(name), "s1", DatePrefix::capture(&FakeClock::new(0)), name)
    }

    #[tokio::test]
    async fn dequeue_order_is_fifo() {
        let (tx, rx) = bounded(8);
        tx.send(item("a.bin")).await.unwrap();
        tx.send(item("b.bin")).await.unwrap();

        let mut guard = rx.lock().await;
        assert_eq!(guard.recv().await.unwrap().filename, "a.bin");
        assert_eq!(guard.recv().await.unwrap().filename, "b.bin");
    }

    #[tokio::test]
    async fn closing_sender_ends_receiver() {
        let (tx, rx) = bounded(2);
        drop(tx);
        let mut guard = rx.lock().await;
        assert!(guard.recv().await.is_none());
    }
}
