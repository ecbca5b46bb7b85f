// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Outbound Authentication
//!
//! Credentials the browser cannot hold are injected into the outbound
//! request by an [`AuthProvider`].
//!
//! ## Components
//!
//! - **encoder**: the shared `Authorization` header encoder
//! - **basic**: HTTP Basic credentials from settings
//! - **saml**: SAML bearer token, optionally signed
//! - **selector**: maps a configured identifier to a configured provider
//!
//! ## Usage
//!
//! ```ignore
//! use console_rest_proxy::auth::AuthProviderSelector;
//!
//! // Resolved once per handler; None means no header is added
//! let provider = AuthProviderSelector::resolve(Some("basic"), &settings)?;
//!
//! if let Some(provider) = &provider {
//!     provider.authenticate(&mut outbound).await?;
//! }
//! ```

pub mod basic;
pub mod encoder;
pub mod saml;
pub mod selector;

pub use basic::BasicAuthProvider;
pub use encoder::{authorization_header, encode_credentials};
pub use saml::SamlBearerTokenProvider;
pub use selector::{AuthProviderKind, AuthProviderSelector};

use async_trait::async_trait;

use crate::error::{AuthSetupError, ConfigError};
use crate::proxy::OutboundRequest;
use crate::settings::Settings;

// =============================================================================
// Provider capability
// =============================================================================

/// Injects credentials into an outbound request.
///
/// `configure` is called exactly once, before the provider is shared across
/// concurrent requests; `authenticate` must only read the configured state.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Identifier used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Read and validate provider settings.
    fn configure(&mut self, settings: &Settings) -> Result<(), ConfigError>;

    /// Add or override headers on the outbound request.
    async fn authenticate(&self, request: &mut OutboundRequest) -> Result<(), AuthSetupError>;
}

/// Provider that leaves the outbound request untouched.
#[derive(Debug, Clone, Default)]
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    fn name(&self) -> &'static str {
        "none"
    }

    fn configure(&mut self, _settings: &Settings) -> Result<(), ConfigError> {
        Ok(())
    }

    async fn authenticate(&self, _request: &mut OutboundRequest) -> Result<(), AuthSetupError> {
        Ok(())
    }
}
