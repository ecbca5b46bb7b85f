// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared application state for health endpoints.
#[derive(Clone)]
pub struct AppState {
    /// Flag indicating if we're shutting down
    pub shutting_down: Arc<AtomicBool>,
    /// Configured authentication provider, reported by readiness
    pub auth_provider: Option<&'static str>,
}

impl AppState {
    pub fn new(auth_provider: Option<&'static str>) -> Self {
        Self {
            shutting_down: Arc::new(AtomicBool::new(false)),
            auth_provider,
        }
    }
}

/// Health check response body.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_provider: Option<&'static str>,
}

/// Kubernetes liveness probe endpoint.
///
/// Returns 200 OK if the process is alive.
///
/// # Endpoint
/// `GET /health/live`
pub async fn health_live() -> Response {
    let response = HealthResponse {
        status: "ok",
        auth_provider: None,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Kubernetes readiness probe endpoint.
///
/// Returns 503 once shutdown has started. The handler only exists after its
/// provider was configured, so there is nothing else to wait for.
///
/// # Endpoint
/// `GET /health/ready`
pub async fn health_ready(State(state): State<AppState>) -> Response {
    if state.shutting_down.load(Ordering::SeqCst) {
        let response = HealthResponse {
            status: "shutting_down",
            auth_provider: None,
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response();
    }

    let response = HealthResponse {
        status: "ok",
        auth_provider: Some(state.auth_provider.unwrap_or("none")),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Kubernetes startup probe endpoint.
///
/// # Endpoint
/// `GET /health/startup`
pub async fn health_startup() -> Response {
    let response = HealthResponse {
        status: "ok",
        auth_provider: None,
    };
    (StatusCode::OK, Json(response)).into_response()
}
