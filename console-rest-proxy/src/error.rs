// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Error types
//!
//! - [`ConfigError`]: the endpoint cannot be built (fatal, raised at startup)
//! - [`AuthSetupError`]: credentials could not be produced for one request
//! - [`ProxyError`]: everything that can end a single proxied request

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing config property: {0}")]
    MissingSetting(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Unknown authentication provider: {0}")]
    UnknownAuthProvider(String),

    #[error("Failed to read settings file {path}: {source}")]
    SettingsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    SettingsParse(#[from] serde_yaml::Error),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

// =============================================================================
// Authentication setup
// =============================================================================

#[derive(Debug, Error)]
pub enum AuthSetupError {
    #[error("Failed to read keystore {path}: {source}")]
    KeystoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open keystore: {0}")]
    KeystoreOpen(String),

    #[error("Key alias not found in keystore: {0}")]
    KeyAliasNotFound(String),

    #[error("Keystore entry {0} has no private key")]
    MissingPrivateKey(String),

    #[error("Keystore entry {0} is not the key entry; only single-key PKCS#12 keystores are supported")]
    SecondaryKeystoreEntry(String),

    #[error("Failed to build assertion: {0}")]
    Assertion(String),

    #[error("Unsupported signing key type: {0}")]
    UnsupportedKeyType(String),

    #[error("Assertion signing failed: {0}")]
    Signing(String),

    #[error("Credential is not a valid header value")]
    InvalidHeaderValue,
}

// =============================================================================
// Per-request errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    AuthenticationSetup(#[from] AuthSetupError),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(Method),

    #[error("Invalid target URL {url}: {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    #[error("Path contains dot segments: {0}")]
    DotSegmentPath(String),

    #[error("Backend request failed: {0}")]
    Backend(#[source] reqwest::Error),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl ProxyError {
    /// HTTP status surfaced to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Configuration(_)
            | ProxyError::AuthenticationSetup(_)
            | ProxyError::InvalidTargetUrl { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::DotSegmentPath(_) => StatusCode::BAD_REQUEST,
            ProxyError::Backend(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Backend(_) | ProxyError::Stream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::Configuration(_) => "configuration_error",
            ProxyError::AuthenticationSetup(_) => "authentication_setup_error",
            ProxyError::MethodNotAllowed(_) => "method_not_allowed",
            ProxyError::InvalidTargetUrl { .. } => "invalid_target_url",
            ProxyError::DotSegmentPath(_) => "invalid_path",
            ProxyError::Backend(_) => "backend_error",
            ProxyError::Stream(_) => "stream_error",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
