// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    body::Body,
    http::{header::HOST, uri::Authority, HeaderMap, Method, Uri},
};
use bytes::Bytes;

/// Scheme, host and port of the inbound request as seen by the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Resolve the origin from the request target, then the `Host` header,
    /// then `fallback` (the server's own address).
    pub fn from_request(uri: &Uri, headers: &HeaderMap, fallback: &RequestOrigin) -> Self {
        let scheme = uri
            .scheme_str()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.scheme.clone());

        let authority = uri.authority().cloned().or_else(|| {
            headers
                .get(HOST)
                .and_then(|v| v.to_str().ok())
                .and_then(|host| host.parse::<Authority>().ok())
        });

        match authority {
            Some(authority) => {
                let port = authority
                    .port_u16()
                    .unwrap_or_else(|| default_port(&scheme));
                Self {
                    host: authority.host().to_string(),
                    scheme,
                    port,
                }
            }
            None => Self {
                scheme,
                ..fallback.clone()
            },
        }
    }
}

fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("https") {
        443
    } else {
        80
    }
}

/// A browser request as received by the proxy.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    /// Raw path below the mount point, if any
    pub path_info: Option<String>,
    /// Raw query string, if any
    pub query_string: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

impl InboundRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            path_info: None,
            query_string: None,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn path_info(mut self, path_info: impl Into<String>) -> Self {
        self.path_info = Some(path_info.into());
        self
    }

    pub fn query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = Some(query_string.into());
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The request sent to the backend.
///
/// `headers` is a multimap: `append` keeps earlier values, `insert`
/// replaces them.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}
