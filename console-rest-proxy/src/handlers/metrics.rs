// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! `GET /metrics`: proxy counters in the Prometheus text format.
//!
//! Families exposed:
//! - `proxy_requests_total{method,status}`
//! - `proxy_request_duration_seconds{method,status}`
//! - `proxy_auth_failures_total{provider}`

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::IntoResponse,
};

use crate::metrics::Metrics;

pub async fn metrics_handler(State(metrics): State<Metrics>) -> impl IntoResponse {
    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(prometheus::TEXT_FORMAT),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        metrics.encode(),
    )
}
