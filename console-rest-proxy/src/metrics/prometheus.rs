// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;

/// Prometheus metrics for the proxy.
///
/// Cheap to clone; every clone records into the same registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    /// Request counter: proxy_requests_total{method, status}
    requests_total: CounterVec,

    /// Request duration histogram: proxy_request_duration_seconds{method, status}
    request_duration: HistogramVec,

    /// Credential failures: proxy_auth_failures_total{provider}
    auth_failures_total: CounterVec,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("proxy_requests_total", "Total number of proxied requests"),
            &["method", "status"],
        )
        .expect("failed to create requests_total counter");

        // Buckets from 1ms to 30s, the default backend timeout
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "proxy_request_duration_seconds",
                "Proxied request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
            &["method", "status"],
        )
        .expect("failed to create request_duration histogram");

        let auth_failures_total = CounterVec::new(
            Opts::new(
                "proxy_auth_failures_total",
                "Requests rejected because credentials could not be produced",
            ),
            &["provider"],
        )
        .expect("failed to create auth_failures_total counter");

        registry
            .register(Box::new(requests_total.clone()))
            .expect("failed to register requests_total");
        registry
            .register(Box::new(request_duration.clone()))
            .expect("failed to register request_duration");
        registry
            .register(Box::new(auth_failures_total.clone()))
            .expect("failed to register auth_failures_total");

        Self {
            registry: Arc::new(registry),
            requests_total,
            request_duration,
            auth_failures_total,
        }
    }

    /// Record a completed request, whatever its outcome.
    pub fn record_request(&self, method: &str, status: u16, duration: Duration) {
        let status_str = status.to_string();

        self.request_duration
            .with_label_values(&[method, &status_str])
            .observe(duration.as_secs_f64());
        self.requests_total
            .with_label_values(&[method, &status_str])
            .inc();
    }

    /// Record a request that failed while producing credentials.
    pub fn record_auth_failure(&self, provider: &str) {
        self.auth_failures_total
            .with_label_values(&[provider])
            .inc();
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
