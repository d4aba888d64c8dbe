// SPDX-License-Identifier: MIT

//! The HTTP control surface (spec.md §6, **(AMBIENT)** transport in
//! SPEC_FULL.md §6): thin `axum` handlers that call into
//! [`ingest_engine::SessionRegistry`] and serialize its return value as
//! JSON, matching the corpus's web framework of choice (`ferrex-server`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use ingest_core::clock::SystemClock;
use ingest_engine::{EngineError, SessionRegistry};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct AppState {
    pub session_registry: Arc<SessionRegistry>,
    pub ready: Arc<AtomicBool>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(start_session))
        .route("/sessions/stop", post(stop_session))
        .route("/status", get(get_status))
        .route("/live", get(live))
        .route("/ready", get(ready))
        .with_state(state)
}

#[derive(Debug, Deserialize, Default)]
struct StartSessionRequest {
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct StartSessionResponse {
    date_prefix: String,
    name: String,
}

async fn start_session(
    State(state): State<AppState>,
    body: Option<Json<StartSessionRequest>>,
) -> Response {
    let name = body.and_then(|Json(req)| req.name);
    match state.session_registry.start_session(name, &SystemClock).await {
        Ok((date, name)) => {
            Json(StartSessionResponse { date_prefix: date.to_string(), name: name.to_string() })
                .into_response()
        }
        Err(e) => engine_error_response(e),
    }
}

async fn stop_session(State(state): State<AppState>) -> Response {
    state.session_registry.stop_session();
    Json(state.session_registry.status()).into_response()
}

async fn get_status(State(state): State<AppState>) -> Response {
    Json(state.session_registry.status()).into_response()
}

/// Must never touch NFS (spec.md §6): a constant response proving the
/// process is alive and scheduling tasks.
async fn live() -> StatusCode {
    StatusCode::OK
}

async fn ready(State(state): State<AppState>) -> StatusCode {
    if state.ready.load(Ordering::Acquire) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

fn engine_error_response(e: EngineError) -> Response {
    let status = match e {
        EngineError::AlreadyActive => StatusCode::CONFLICT,
        EngineError::InvalidSessionName(_) => StatusCode::BAD_REQUEST,
        EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn state(root: &std::path::Path) -> AppState {
        AppState {
            session_registry: Arc::new(SessionRegistry::new(
                root.join("incoming"),
                root.join(".processing"),
                root.join("staging"),
            )),
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    #[tokio::test]
    async fn live_never_requires_ready() {
        let root = tempdir().unwrap();
        let app = router(state(root.path()));
        let response =
            app.oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn start_then_duplicate_start_is_conflict() {
        let root = tempdir().unwrap();
        let app = router(state(root.path()));
        let first = app
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
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sessions")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"name\":\"S2\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn bad_session_name_is_bad_request() {
        let root = tempdir().unwrap();
        let app = router(state(root.path()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sessions")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"name\":\"foo/bar\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ready_reflects_startup_flag() {
        let root = tempdir().unwrap();
        let mut s = state(root.path());
        s.ready = Arc::new(AtomicBool::new(false));
        let app = router(s);
        let response =
            app.oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
