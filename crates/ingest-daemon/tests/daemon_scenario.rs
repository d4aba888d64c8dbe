// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used, clippy::expect_used)]

//! The control surface driven against a live engine, not a bare registry
//! (spec.md §8 "reaper" and "happy path" scenarios, exercised end to end
//! through the HTTP layer rather than at the unit level).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ingest_blob::fake::FakeBlobClient;
use ingest_core::clock::FakeClock;
use ingest_core::config::{BlobCredentials, Config};
use ingest_daemon::http::{router, AppState};
use tempfile::tempdir;
use tower::ServiceExt;

fn config(root: &std::path::Path) -> Config {
    Config {
        azure_account_url: "https://acct.blob.core.windows.net".into(),
        azure_container: "ingest".into(),
        credentials: BlobCredentials::Ambient,
        nfs_incoming_root: root.join("incoming"),
        nfs_processing_root: root.join(".processing"),
        local_staging_root: root.join("staging"),
        poll_interval: Duration::from_millis(10),
        min_file_age: Duration::from_millis(0),
        extension_allowlist: vec![],
        queue_capacity: 64,
        worker_count: 2,
        upload_concurrency: 4,
        reaper_interval: Duration::from_millis(20),
        http_bind: "127.0.0.1:0".into(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Start a session over HTTP, drop a file on disk, and watch `/status`
/// reflect the upload without ever touching the engine directly.
#[tokio::test]
async fn http_start_session_then_status_reflects_upload() {
    let root = tempdir().unwrap();
    let cfg = config(root.path());
    let client = Arc::new(FakeBlobClient::new());
    let engine = ingest_engine::start(&cfg, client.clone(), FakeClock::new(0)).await.unwrap();
    let state = AppState { session_registry: engine.session_registry.clone(), ready: Arc::new(AtomicBool::new(true)) };
    let app = router(state);

    let start_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sessions")
                .header("content-type", "application/json")
                .body(Body::from("{\"name\":\"S1\"}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(start_response.status(), StatusCode::OK);
    let started = body_json(start_response).await;
    let date = started["date_prefix"].as_str().unwrap().to_string();

    tokio::fs::write(cfg.nfs_incoming_root.join("S1").join("a.bin"), b"hello from http").await.unwrap();

    let blob_name = format!("{date}/S1/a.bin");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if client.find_upload(&blob_name).is_some() {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "upload did not complete in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let status_response =
        app.clone().oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap()).await.unwrap();
    let status = body_json(status_response).await;
    assert_eq!(status["processed_ok"], 1);
    assert_eq!(status["processed_err"], 0);

    let stop_response = app
        .oneshot(Request::builder().method("POST").uri("/sessions/stop").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let stopped = body_json(stop_response).await;
    assert_eq!(stopped["active"], false);

    engine.shutdown();
    engine.join().await;
}

/// Scenario 6: reaper. A completed marker left behind by an upload is
/// swept away by the background reaper without any HTTP interaction.
#[tokio::test]
async fn completed_marker_is_reaped_in_the_background() {
    let root = tempdir().unwrap();
    let cfg = config(root.path());
    let client = Arc::new(FakeBlobClient::new());
    let engine = ingest_engine::start(&cfg, client.clone(), FakeClock::new(0)).await.unwrap();

    engine.session_registry.start_session(Some("S1".to_string()), &FakeClock::new(0)).await.unwrap();
    tokio::fs::write(cfg.nfs_incoming_root.join("S1").join("a.bin"), b"x").await.unwrap();

    wait_for_marker_removed(&cfg.nfs_processing_root).await;

    engine.shutdown();
    engine.join().await;
}

async fn wait_for_marker_removed(processing_root: &std::path::Path) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let has_completed_marker = walk_for_marker(processing_root).await;
        if !has_completed_marker {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "reaper never swept the completion marker");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn walk_for_marker(root: &std::path::Path) -> bool {
    fn walk<'a>(
        dir: std::path::PathBuf,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + 'a>> {
        Box::pin(async move {
            let Ok(mut entries) = tokio::fs::read_dir(&dir).await else { return false };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.to_string_lossy().ends_with(".completed") {
                    return true;
                }
                if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) && walk(path).await {
                    return true;
                }
            }
            false
        })
    }
    walk(root.to_path_buf()).await
}
