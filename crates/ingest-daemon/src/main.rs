// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `ingestd`: wires configuration, the blob client, storage recovery, the
//! engine's background tasks, and the HTTP control surface together
//! (SPEC_FULL.md §6 **(AMBIENT)**).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use ingest_blob::azure::AzureBlobClient;
use ingest_blob::BlobClient;
use ingest_core::clock::SystemClock;
use ingest_core::config::Config;
use ingest_daemon::{http, DaemonError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        error!(error = %e, "fatal startup error");
        std::process::exit(1);
    }
}

/// `RUST_LOG`/`INGEST_LOG` controls verbosity, matching the corpus's
/// `tracing-subscriber` env-filter convention.
fn init_tracing() {
    let filter = std::env::var("INGEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(filter)).init();
}

async fn run() -> Result<(), DaemonError> {
    let config = Config::from_env()?;
    info!(
        container = %config.azure_container,
        workers = config.worker_count,
        "ingestd: configuration loaded"
    );

    let blob_client: Arc<dyn BlobClient> =
        Arc::new(AzureBlobClient::new(&config.azure_account_url, &config.azure_container, &config.credentials)?);
    blob_client.validate().await?;
    info!(container = %config.azure_container, "ingestd: blob credentials validated");

    let engine = ingest_engine::start(&config, blob_client, SystemClock).await?;
    info!("ingestd: recovery complete, background tasks started");

    let ready = Arc::new(AtomicBool::new(true));
    let state = http::AppState { session_registry: engine.session_registry.clone(), ready };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&config.http_bind)
        .await
        .map_err(|source| DaemonError::Bind { addr: config.http_bind.clone(), source })?;
    info!(bind = %config.http_bind, "ingestd: control surface listening");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("ingestd: shutdown signal received");
    };

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await.map_err(DaemonError::Http)?;

    engine.shutdown();
    engine.join().await;
    Ok(())
}
