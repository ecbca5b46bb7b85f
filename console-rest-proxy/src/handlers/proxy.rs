// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;

use crate::error::ProxyError;
use crate::metrics::Metrics;
use crate::proxy::{InboundRequest, ProxyRequestHandler, RequestOrigin};

/// State of the proxy endpoint.
#[derive(Clone)]
pub struct ProxyState {
    pub handler: Arc<ProxyRequestHandler>,
    pub metrics: Metrics,
    /// Normalized mount path, empty when mounted at the root
    pub mount_path: Arc<str>,
    /// Origin used when the request carries no `Host`
    pub fallback_origin: Arc<RequestOrigin>,
}

impl ProxyState {
    pub fn new(
        handler: ProxyRequestHandler,
        metrics: Metrics,
        mount_path: impl Into<Arc<str>>,
        fallback_origin: RequestOrigin,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            metrics,
            mount_path: mount_path.into(),
            fallback_origin: Arc::new(fallback_origin),
        }
    }

    /// Path below the mount point, `None` when nothing follows it.
    ///
    /// Returns `Err(())` for paths outside the mount point.
    fn path_info<'a>(&self, path: &'a str) -> Result<Option<&'a str>, ()> {
        let rest = path.strip_prefix(&*self.mount_path).ok_or(())?;
        if rest.is_empty() {
            Ok(None)
        } else if rest.starts_with('/') {
            Ok(Some(rest))
        } else {
            Err(())
        }
    }
}

/// Proxy endpoint: every request under the mount path ends up here.
pub async fn proxy_request(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();

    let path_info = match state.path_info(parts.uri.path()) {
        Ok(path_info) => path_info.map(str::to_string),
        Err(()) => return StatusCode::NOT_FOUND.into_response(),
    };

    let origin = RequestOrigin::from_request(&parts.uri, &parts.headers, &state.fallback_origin);
    let method = parts.method.clone();

    let mut inbound = InboundRequest::new(parts.method)
        .headers(parts.headers)
        .body(body);
    inbound.path_info = path_info;
    inbound.query_string = parts.uri.query().map(str::to_string);

    let response = match state.handler.handle(&origin, inbound).await {
        Ok(response) => response,
        Err(e) => {
            if let ProxyError::AuthenticationSetup(_) = &e {
                state
                    .metrics
                    .record_auth_failure(state.handler.auth_provider_name().unwrap_or("none"));
            }
            e.into_response()
        }
    };

    state
        .metrics
        .record_request(method.as_str(), response.status().as_u16(), started.elapsed());
    response
}
