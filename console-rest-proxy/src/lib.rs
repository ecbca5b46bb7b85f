// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Console REST Proxy - authenticated reverse proxy for protected REST APIs
//!
//! The browser calls this proxy instead of the protected backend. The proxy
//! rewrites the request against the backend URL, injects credentials the
//! browser cannot hold (HTTP Basic or a SAML bearer assertion), forwards the
//! call and streams the backend response back unchanged.
//!
//! # Example
//!
//! ```rust,no_run
//! use console_rest_proxy::{ProxyConfiguration, ProxyRequestHandler, Settings};
//!
//! let settings = Settings::from_yaml_str(
//!     r#"
//! bpel-console:
//!   rest-proxy:
//!     proxy-url: "SCHEME://HOST:PORT/bpel-console-server/rs/"
//!     authentication-provider: basic
//!     authentication:
//!       basic:
//!         user: admin
//!         password: secret
//! "#,
//! )
//! .unwrap();
//!
//! let configuration = ProxyConfiguration::from_settings(settings).unwrap();
//! let handler = ProxyRequestHandler::new(configuration).unwrap();
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod proxy;
pub mod saml;
pub mod settings;

pub use auth::{AuthProvider, AuthProviderKind, AuthProviderSelector};
pub use error::{AuthSetupError, ConfigError, ProxyError};
pub use proxy::{InboundRequest, OutboundRequest, ProxyRequestHandler, RequestOrigin};
pub use settings::{OutboundMethod, ProxyConfiguration, Settings};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
