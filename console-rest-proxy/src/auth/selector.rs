// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Provider selection
//!
//! Providers form a closed set. Besides the short identifiers, the class
//! names written in existing console configuration files are accepted.

use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use super::{AuthProvider, BasicAuthProvider, NoAuthProvider, SamlBearerTokenProvider};
use crate::error::ConfigError;
use crate::settings::Settings;

const LEGACY_BASIC: &str = "org.jboss.bpm.console.server.RestProxyBasicAuthProvider";
const LEGACY_SAML: &str = "org.jboss.bpm.console.server.RestProxySAMLBearerTokenAuthProvider";

/// Known authentication providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProviderKind {
    None,
    Basic,
    SamlBearerToken,
}

impl AuthProviderKind {
    /// Create an unconfigured provider instance.
    pub fn instantiate(self) -> Box<dyn AuthProvider> {
        match self {
            AuthProviderKind::None => Box::new(NoAuthProvider),
            AuthProviderKind::Basic => Box::new(BasicAuthProvider::new()),
            AuthProviderKind::SamlBearerToken => Box::new(SamlBearerTokenProvider::new()),
        }
    }
}

impl FromStr for AuthProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        match id {
            LEGACY_BASIC => return Ok(AuthProviderKind::Basic),
            LEGACY_SAML => return Ok(AuthProviderKind::SamlBearerToken),
            _ => {}
        }

        match id.to_ascii_lowercase().as_str() {
            "none" => Ok(AuthProviderKind::None),
            "basic" => Ok(AuthProviderKind::Basic),
            "saml" | "saml-bearer-token" => Ok(AuthProviderKind::SamlBearerToken),
            _ => Err(ConfigError::UnknownAuthProvider(id.to_string())),
        }
    }
}

impl std::fmt::Display for AuthProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthProviderKind::None => write!(f, "none"),
            AuthProviderKind::Basic => write!(f, "basic"),
            AuthProviderKind::SamlBearerToken => write!(f, "saml-bearer-token"),
        }
    }
}

/// Resolves and configures the provider for a handler.
pub struct AuthProviderSelector;

impl AuthProviderSelector {
    /// Resolve a configured identifier. `None` means no header is added.
    pub fn resolve(
        identifier: Option<&str>,
        settings: &Settings,
    ) -> Result<Option<Arc<dyn AuthProvider>>, ConfigError> {
        let Some(id) = identifier.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let kind = id.parse::<AuthProviderKind>()?;
        Self::resolve_kind(kind, settings).map(Some)
    }

    /// Instantiate and configure a known provider.
    pub fn resolve_kind(
        kind: AuthProviderKind,
        settings: &Settings,
    ) -> Result<Arc<dyn AuthProvider>, ConfigError> {
        Self::configure(kind.instantiate(), settings)
    }

    /// Configure a provider once and freeze it for shared use.
    pub fn configure(
        mut provider: Box<dyn AuthProvider>,
        settings: &Settings,
    ) -> Result<Arc<dyn AuthProvider>, ConfigError> {
        provider.configure(settings)?;
        info!(provider = provider.name(), "authentication provider configured");
        Ok(Arc::from(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::basic::{BASIC_AUTH_PASSWORD, BASIC_AUTH_USER};
    use crate::error::AuthSetupError;
    use crate::proxy::OutboundRequest;
    use async_trait::async_trait;
    use axum::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_parse_identifiers() {
        assert_eq!("basic".parse::<AuthProviderKind>().unwrap(), AuthProviderKind::Basic);
        assert_eq!(" NONE ".parse::<AuthProviderKind>().unwrap(), AuthProviderKind::None);
        assert_eq!(
            "saml-bearer-token".parse::<AuthProviderKind>().unwrap(),
            AuthProviderKind::SamlBearerToken
        );
        assert_eq!(LEGACY_BASIC.parse::<AuthProviderKind>().unwrap(), AuthProviderKind::Basic);
        assert_eq!(
            LEGACY_SAML.parse::<AuthProviderKind>().unwrap(),
            AuthProviderKind::SamlBearerToken
        );
        assert!("kerberos".parse::<AuthProviderKind>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for kind in [
            AuthProviderKind::None,
            AuthProviderKind::Basic,
            AuthProviderKind::SamlBearerToken,
        ] {
            assert_eq!(kind.to_string().parse::<AuthProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_absent_identifier_resolves_to_none() {
        let settings = Settings::new();
        assert!(AuthProviderSelector::resolve(None, &settings).unwrap().is_none());
        assert!(AuthProviderSelector::resolve(Some("  "), &settings)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unknown_identifier_fails() {
        let settings = Settings::new();
        let result = AuthProviderSelector::resolve(Some("com.example.Custom"), &settings);
        assert!(matches!(result, Err(ConfigError::UnknownAuthProvider(_))));
    }

    #[test]
    fn test_unconstructible_provider_fails() {
        // basic without credentials cannot be configured
        let settings = Settings::new();
        let result = AuthProviderSelector::resolve(Some("basic"), &settings);
        assert!(matches!(result, Err(ConfigError::MissingSetting(_))));
    }

    #[test]
    fn test_resolves_configured_basic() {
        let settings: Settings = [(BASIC_AUTH_USER, "alice"), (BASIC_AUTH_PASSWORD, "secret")]
            .into_iter()
            .collect();
        let provider = AuthProviderSelector::resolve(Some("basic"), &settings)
            .unwrap()
            .unwrap();
        assert_eq!(provider.name(), "basic");
    }

    struct CountingProvider {
        configured: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AuthProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn configure(&mut self, _settings: &Settings) -> Result<(), ConfigError> {
            self.configured.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn authenticate(&self, _request: &mut OutboundRequest) -> Result<(), AuthSetupError> {
            assert_eq!(self.configured.load(Ordering::SeqCst), 1);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_configure_runs_once_before_authenticate() {
        let configured = Arc::new(AtomicUsize::new(0));
        let provider = AuthProviderSelector::configure(
            Box::new(CountingProvider {
                configured: Arc::clone(&configured),
            }),
            &Settings::new(),
        )
        .unwrap();

        for _ in 0..3 {
            let mut request = OutboundRequest::new(Method::GET, "http://backend/rs");
            provider.authenticate(&mut request).await.unwrap();
        }
        assert_eq!(configured.load(Ordering::SeqCst), 1);
    }
}
