// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
mod health;
mod metrics;
mod proxy;

pub use health::{health_live, health_ready, health_startup, AppState};
pub use metrics::metrics_handler;
pub use proxy::{proxy_request, ProxyState};

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// Health and metrics routes take precedence; everything else goes to the
/// proxy, which answers 404 outside its mount path.
pub fn build_router(app_state: AppState, proxy_state: ProxyState) -> Router {
    let metrics = proxy_state.metrics.clone();

    Router::new()
        .route("/health/live", get(health_live))
        .route("/health/startup", get(health_startup))
        .route("/health/ready", get(health_ready).with_state(app_state))
        .route("/metrics", get(metrics_handler).with_state(metrics))
        .fallback(any(proxy_request).with_state(proxy_state))
        .layer(TraceLayer::new_for_http())
}
