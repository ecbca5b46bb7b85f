// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    body::Body,
    http::{header, HeaderMap, Method},
    response::Response,
};
use std::sync::Arc;

use super::request::{InboundRequest, OutboundRequest, RequestOrigin};
use super::url::{build_target_url, has_dot_segment};
use crate::auth::{AuthProvider, AuthProviderSelector};
use crate::error::{ConfigError, ProxyError};
use crate::settings::{OutboundMethod, ProxyConfiguration};

/// Request headers the HTTP client manages itself; they are not forwarded.
pub const TRANSPORT_MANAGED_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

/// Proxies browser requests to the protected backend.
///
/// One instance serves every request of an endpoint. The configuration and
/// the authentication provider are fixed at construction and only read
/// afterwards, so concurrent requests share them without locking.
#[derive(Clone)]
pub struct ProxyRequestHandler {
    configuration: Arc<ProxyConfiguration>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    client: reqwest::Client,
}

impl ProxyRequestHandler {
    /// Create a handler, resolving and configuring the authentication
    /// provider up front.
    pub fn new(configuration: ProxyConfiguration) -> Result<Self, ConfigError> {
        let auth_provider = configuration
            .auth_provider
            .map(|kind| AuthProviderSelector::resolve_kind(kind, &configuration.settings))
            .transpose()?;

        let mut builder =
            reqwest::Client::builder().connect_timeout(configuration.connect_timeout);
        if let Some(timeout) = configuration.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ConfigError::HttpClient)?;

        tracing::info!(
            proxy_url = %configuration.proxy_url_template,
            auth_provider = auth_provider.as_ref().map(|p| p.name()).unwrap_or("none"),
            outbound_method = ?configuration.outbound_method,
            "rest proxy configured"
        );

        Ok(Self {
            configuration: Arc::new(configuration),
            auth_provider,
            client,
        })
    }

    pub fn configuration(&self) -> &ProxyConfiguration {
        &self.configuration
    }

    /// Name of the configured provider, if any.
    pub fn auth_provider_name(&self) -> Option<&'static str> {
        self.auth_provider.as_ref().map(|p| p.name())
    }

    /// Target URL for the given request coordinates.
    pub fn target_url(
        &self,
        origin: &RequestOrigin,
        path_info: Option<&str>,
        query_string: Option<&str>,
    ) -> String {
        build_target_url(
            &self.configuration.proxy_url_template,
            origin,
            path_info,
            query_string,
        )
    }

    /// Proxy one request and return the backend response.
    ///
    /// Backend error statuses are returned as responses, not errors.
    pub async fn handle(
        &self,
        origin: &RequestOrigin,
        inbound: InboundRequest,
    ) -> Result<Response, ProxyError> {
        let outbound = self.prepare(origin, inbound).await?;
        self.execute(outbound).await
    }

    /// Build the outbound request: URL, headers, credentials, body.
    pub async fn prepare(
        &self,
        origin: &RequestOrigin,
        inbound: InboundRequest,
    ) -> Result<OutboundRequest, ProxyError> {
        let InboundRequest {
            method,
            path_info,
            query_string,
            headers,
            body,
        } = inbound;

        if method != Method::GET && method != Method::POST {
            tracing::warn!(method = %method, "unsupported HTTP method");
            return Err(ProxyError::MethodNotAllowed(method));
        }

        // The URL parser would resolve these and leave the base path
        if let Some(path) = path_info.as_deref().filter(|p| has_dot_segment(p)) {
            tracing::warn!(path_info = %path, "rejecting path with dot segments");
            return Err(ProxyError::DotSegmentPath(path.to_string()));
        }

        let url = self.target_url(origin, path_info.as_deref(), query_string.as_deref());
        let outbound_method = match self.configuration.outbound_method {
            OutboundMethod::Preserve => method.clone(),
            OutboundMethod::ForceGet => Method::GET,
        };

        let mut outbound = OutboundRequest::new(outbound_method, url);
        copy_request_headers(&headers, &mut outbound.headers);

        // Credentials go on after the copy so they win over browser headers
        if let Some(provider) = &self.auth_provider {
            provider.authenticate(&mut outbound).await?;
        }

        if method == Method::POST {
            if let Some(body) = body {
                let bytes = axum::body::to_bytes(body, usize::MAX)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "failed to read request body");
                        ProxyError::Stream(format!("failed to read request body: {e}"))
                    })?;
                outbound.body = Some(bytes);
            }
        }

        Ok(outbound)
    }

    /// Send the outbound request and stream the backend response back.
    pub async fn execute(&self, outbound: OutboundRequest) -> Result<Response, ProxyError> {
        let url = reqwest::Url::parse(&outbound.url).map_err(|e| ProxyError::InvalidTargetUrl {
            url: outbound.url.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            method = %outbound.method,
            target_url = %url,
            "proxying request"
        );

        let mut request = self
            .client
            .request(outbound.method, url)
            .headers(outbound.headers);
        if let Some(body) = outbound.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(
                error = %e,
                target_url = %outbound.url,
                timeout = e.is_timeout(),
                connect = e.is_connect(),
                "failed to forward request to backend"
            );
            ProxyError::Backend(e)
        })?;

        Ok(convert_response(response))
    }
}

/// Copy inbound headers, keeping every value of multi-valued headers.
fn copy_request_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from.iter() {
        if !TRANSPORT_MANAGED_HEADERS.contains(&name.as_str()) {
            to.append(name.clone(), value.clone());
        }
    }
}

/// Copy backend headers except `Transfer-Encoding`; the body is re-streamed.
fn copy_response_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from.iter() {
        if *name != header::TRANSFER_ENCODING {
            to.append(name.clone(), value.clone());
        }
    }
}

/// Convert a backend response into the caller's response.
fn convert_response(response: reqwest::Response) -> Response {
    let status = response.status();
    let mut headers = HeaderMap::with_capacity(response.headers().len());
    copy_response_headers(response.headers(), &mut headers);

    let mut proxied = Response::new(Body::from_stream(response.bytes_stream()));
    *proxied.status_mut() = status;
    *proxied.headers_mut() = headers;
    proxied
}
