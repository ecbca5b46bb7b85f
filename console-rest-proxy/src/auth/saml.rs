// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! SAML Bearer Token provider
//!
//! Sends `Authorization: Basic base64("SAML-BEARER-TOKEN:" + assertion)`.
//! A fresh assertion is built per request. When signing is enabled the
//! keystore is opened per request as well, and any failure aborts the
//! request: an unsigned assertion is never sent in place of a signed one.
//!
//! The asserted principal is the configured `subject` (default `anonymous`).
//! The subject header is read only when `trust-subject-header` is `true`,
//! i.e. when an authenticating front end sets it and drops any value the
//! browser sent. Otherwise a browser could name its own principal.

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderName};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error};

use super::encoder::authorization_header;
use super::AuthProvider;
use crate::error::{AuthSetupError, ConfigError};
use crate::proxy::OutboundRequest;
use crate::saml::assertion::ANONYMOUS_SUBJECT;
use crate::saml::{sign_assertion, Keystore, SamlAssertionBuilder, DEFAULT_VALIDITY};
use crate::settings::Settings;

/// Username slot value for SAML bearer tokens.
pub const SAML_BEARER_TOKEN_SCHEME: &str = "SAML-BEARER-TOKEN";

pub const SAML_AUTH_ISSUER: &str = "bpel-console.rest-proxy.authentication.saml.issuer";
pub const SAML_AUTH_SERVICE: &str = "bpel-console.rest-proxy.authentication.saml.service";
pub const SAML_AUTH_SIGN_ASSERTIONS: &str =
    "bpel-console.rest-proxy.authentication.saml.sign-assertions";
pub const SAML_AUTH_KEYSTORE: &str = "bpel-console.rest-proxy.authentication.saml.keystore";
pub const SAML_AUTH_KEYSTORE_PASSWORD: &str =
    "bpel-console.rest-proxy.authentication.saml.keystore-password";
pub const SAML_AUTH_KEY_ALIAS: &str = "bpel-console.rest-proxy.authentication.saml.key-alias";
pub const SAML_AUTH_KEY_PASSWORD: &str = "bpel-console.rest-proxy.authentication.saml.key-password";
pub const SAML_AUTH_SUBJECT: &str = "bpel-console.rest-proxy.authentication.saml.subject";
pub const SAML_AUTH_SUBJECT_HEADER: &str =
    "bpel-console.rest-proxy.authentication.saml.subject-header";
pub const SAML_AUTH_TRUST_SUBJECT_HEADER: &str =
    "bpel-console.rest-proxy.authentication.saml.trust-subject-header";
pub const SAML_AUTH_VALIDITY_SECONDS: &str =
    "bpel-console.rest-proxy.authentication.saml.validity-seconds";

/// Inbound header carrying the authenticated principal.
pub const DEFAULT_SUBJECT_HEADER: &str = "x-forwarded-user";

/// Longest accepted assertion lifetime.
pub const MAX_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
struct SigningSettings {
    keystore: PathBuf,
    keystore_password: String,
    key_alias: String,
    key_password: Option<String>,
}

#[derive(Clone)]
struct SamlSettings {
    issuer: String,
    service: String,
    subject: String,
    /// Only set when the header comes from a trusted front end
    subject_header: Option<HeaderName>,
    validity: Duration,
    signing: Option<SigningSettings>,
}

/// Builds (and optionally signs) a SAML assertion for every request.
#[derive(Clone, Default)]
pub struct SamlBearerTokenProvider {
    settings: Option<SamlSettings>,
}

impl SamlBearerTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether assertions are signed.
    pub fn signs_assertions(&self) -> bool {
        self.settings
            .as_ref()
            .is_some_and(|s| s.signing.is_some())
    }

    async fn create_assertion(
        &self,
        settings: &SamlSettings,
        subject: &str,
    ) -> Result<String, AuthSetupError> {
        let assertion = SamlAssertionBuilder::new(&settings.issuer, &settings.service)
            .subject(subject)
            .validity(settings.validity)
            .build()?;

        let Some(signing) = &settings.signing else {
            return Ok(assertion.xml);
        };

        let keystore = Keystore::load(&signing.keystore, &signing.keystore_password).await?;
        let key_pair = keystore.key_pair(&signing.key_alias, signing.key_password.as_deref())?;
        let signed = sign_assertion(&assertion, &key_pair)?;

        debug!(assertion_id = %signed.id, "saml assertion signed");
        Ok(signed.xml)
    }
}

impl std::fmt::Debug for SamlBearerTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("SamlBearerTokenProvider");
        if let Some(settings) = &self.settings {
            s.field("issuer", &settings.issuer)
                .field("service", &settings.service)
                .field("sign_assertions", &settings.signing.is_some());
        }
        s.finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for SamlBearerTokenProvider {
    fn name(&self) -> &'static str {
        "saml-bearer-token"
    }

    fn configure(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        let issuer = settings.require(SAML_AUTH_ISSUER)?.to_string();
        let service = settings.require(SAML_AUTH_SERVICE)?.to_string();

        let subject = settings
            .get(SAML_AUTH_SUBJECT)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS_SUBJECT)
            .to_string();

        let subject_header = match settings.get(SAML_AUTH_SUBJECT_HEADER) {
            Some(name) => HeaderName::from_bytes(name.trim().as_bytes()).map_err(|e| {
                ConfigError::InvalidSetting {
                    key: SAML_AUTH_SUBJECT_HEADER.to_string(),
                    reason: e.to_string(),
                }
            })?,
            None => HeaderName::from_static(DEFAULT_SUBJECT_HEADER),
        };
        let subject_header = settings
            .is_true(SAML_AUTH_TRUST_SUBJECT_HEADER)
            .then_some(subject_header);

        let validity = match settings.get_u64(SAML_AUTH_VALIDITY_SECONDS)? {
            None => DEFAULT_VALIDITY,
            Some(secs) if secs == 0 || secs > MAX_VALIDITY.as_secs() => {
                return Err(ConfigError::InvalidSetting {
                    key: SAML_AUTH_VALIDITY_SECONDS.to_string(),
                    reason: format!("must be between 1 and {}", MAX_VALIDITY.as_secs()),
                });
            }
            Some(secs) => Duration::from_secs(secs),
        };

        let signing = if settings.is_true(SAML_AUTH_SIGN_ASSERTIONS) {
            let keystore_password = settings
                .get(SAML_AUTH_KEYSTORE_PASSWORD)
                .ok_or_else(|| ConfigError::MissingSetting(SAML_AUTH_KEYSTORE_PASSWORD.to_string()))?
                .to_string();
            Some(SigningSettings {
                keystore: PathBuf::from(settings.require(SAML_AUTH_KEYSTORE)?),
                keystore_password,
                key_alias: settings.require(SAML_AUTH_KEY_ALIAS)?.to_string(),
                key_password: settings.get(SAML_AUTH_KEY_PASSWORD).map(str::to_string),
            })
        } else {
            None
        };

        self.settings = Some(SamlSettings {
            issuer,
            service,
            subject,
            subject_header,
            validity,
            signing,
        });
        Ok(())
    }

    async fn authenticate(&self, request: &mut OutboundRequest) -> Result<(), AuthSetupError> {
        let Some(settings) = &self.settings else {
            return Ok(());
        };

        let subject = settings
            .subject_header
            .as_ref()
            .and_then(|name| request.headers.get(name))
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(settings.subject.as_str())
            .to_string();

        let assertion = match self.create_assertion(settings, &subject).await {
            Ok(assertion) => assertion,
            Err(e) => {
                error!(error = %e, "failed to create saml assertion");
                return Err(e);
            }
        };

        let value = authorization_header(SAML_BEARER_TOKEN_SCHEME, &assertion)?;
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::test_support::pkcs12_keystore;
    use axum::http::{HeaderValue, Method};
    use base64::{engine::general_purpose::STANDARD, Engine};

    fn base_settings() -> Vec<(&'static str, String)> {
        vec![
            (SAML_AUTH_ISSUER, "/bpel-console".to_string()),
            (SAML_AUTH_SERVICE, "/bpel-console-server".to_string()),
        ]
    }

    fn configured(pairs: Vec<(&'static str, String)>) -> SamlBearerTokenProvider {
        let settings: Settings = pairs.into_iter().collect();
        let mut provider = SamlBearerTokenProvider::new();
        provider.configure(&settings).unwrap();
        provider
    }

    fn decoded_credential(request: &OutboundRequest) -> String {
        let value = request.headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        let encoded = value.strip_prefix("Basic ").unwrap();
        String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_unsigned_wire_format() {
        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_SUBJECT, "alice".to_string()));
        let provider = configured(pairs);
        let mut request = OutboundRequest::new(Method::GET, "http://backend/rs");

        provider.authenticate(&mut request).await.unwrap();

        let credential = decoded_credential(&request);
        let assertion = credential.strip_prefix("SAML-BEARER-TOKEN:").unwrap();
        assert!(assertion.starts_with("<saml2:Assertion "));
        assert!(assertion.ends_with("</saml2:Assertion>"));
        assert!(assertion.contains("<saml2:Issuer>/bpel-console</saml2:Issuer>"));
        assert!(assertion.contains("<saml2:Audience>/bpel-console-server</saml2:Audience>"));
        assert!(assertion.contains("<saml2:NameID>alice</saml2:NameID>"));
        assert!(!assertion.contains("ds:Signature"));
    }

    #[tokio::test]
    async fn test_untrusted_subject_header_is_ignored() {
        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_SUBJECT, "console".to_string()));
        let provider = configured(pairs);

        let mut request = OutboundRequest::new(Method::GET, "http://backend/rs");
        request
            .headers
            .insert("x-forwarded-user", HeaderValue::from_static("admin"));
        provider.authenticate(&mut request).await.unwrap();

        let credential = decoded_credential(&request);
        assert!(credential.contains("<saml2:NameID>console</saml2:NameID>"));
        assert!(!credential.contains("admin"));
    }

    #[tokio::test]
    async fn test_default_subject_is_anonymous() {
        let provider = configured(base_settings());
        let mut request = OutboundRequest::new(Method::GET, "http://backend/rs");
        request
            .headers
            .insert("x-forwarded-user", HeaderValue::from_static("admin"));
        provider.authenticate(&mut request).await.unwrap();

        assert!(decoded_credential(&request).contains("<saml2:NameID>anonymous</saml2:NameID>"));
    }

    #[tokio::test]
    async fn test_trusted_subject_header() {
        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_SUBJECT_HEADER, "X-Remote-User".to_string()));
        pairs.push((SAML_AUTH_TRUST_SUBJECT_HEADER, "true".to_string()));
        let provider = configured(pairs);

        let mut request = OutboundRequest::new(Method::GET, "http://backend/rs");
        request
            .headers
            .insert("x-remote-user", HeaderValue::from_static("bob"));
        provider.authenticate(&mut request).await.unwrap();

        assert!(decoded_credential(&request).contains("<saml2:NameID>bob</saml2:NameID>"));
    }

    #[tokio::test]
    async fn test_signed_assertion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.p12");
        let (der, _) = pkcs12_keystore("proxy", "changeit");
        std::fs::write(&path, der).unwrap();

        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_SIGN_ASSERTIONS, "true".to_string()));
        pairs.push((SAML_AUTH_KEYSTORE, path.display().to_string()));
        pairs.push((SAML_AUTH_KEYSTORE_PASSWORD, "changeit".to_string()));
        pairs.push((SAML_AUTH_KEY_ALIAS, "proxy".to_string()));
        pairs.push((SAML_AUTH_KEY_PASSWORD, "changeit".to_string()));
        let provider = configured(pairs);
        assert!(provider.signs_assertions());

        let mut request = OutboundRequest::new(Method::GET, "http://backend/rs");
        provider.authenticate(&mut request).await.unwrap();

        let credential = decoded_credential(&request);
        assert!(credential.starts_with("SAML-BEARER-TOKEN:<saml2:Assertion "));
        assert!(credential.contains("<ds:SignatureValue>"));
    }

    #[tokio::test]
    async fn test_invalid_keystore_aborts_without_header() {
        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_SIGN_ASSERTIONS, "true".to_string()));
        pairs.push((SAML_AUTH_KEYSTORE, "/nonexistent/proxy.p12".to_string()));
        pairs.push((SAML_AUTH_KEYSTORE_PASSWORD, "changeit".to_string()));
        pairs.push((SAML_AUTH_KEY_ALIAS, "proxy".to_string()));
        let provider = configured(pairs);

        let mut request = OutboundRequest::new(Method::GET, "http://backend/rs");
        let err = provider.authenticate(&mut request).await.unwrap_err();

        assert!(matches!(err, AuthSetupError::KeystoreRead { .. }));
        assert!(request.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_wrong_alias_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.p12");
        let (der, _) = pkcs12_keystore("proxy", "changeit");
        std::fs::write(&path, der).unwrap();

        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_SIGN_ASSERTIONS, "true".to_string()));
        pairs.push((SAML_AUTH_KEYSTORE, path.display().to_string()));
        pairs.push((SAML_AUTH_KEYSTORE_PASSWORD, "changeit".to_string()));
        pairs.push((SAML_AUTH_KEY_ALIAS, "someone-else".to_string()));
        let provider = configured(pairs);

        let mut request = OutboundRequest::new(Method::GET, "http://backend/rs");
        let err = provider.authenticate(&mut request).await.unwrap_err();
        assert!(matches!(err, AuthSetupError::KeyAliasNotFound(_)));
    }

    #[test]
    fn test_sign_assertions_requires_keystore_settings() {
        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_SIGN_ASSERTIONS, "true".to_string()));
        let settings: Settings = pairs.into_iter().collect();

        let err = SamlBearerTokenProvider::new().configure(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting(_)));
    }

    #[test]
    fn test_sign_assertions_other_than_true_is_unsigned() {
        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_SIGN_ASSERTIONS, "yes".to_string()));
        assert!(!configured(pairs).signs_assertions());
    }

    #[test]
    fn test_missing_issuer() {
        let settings: Settings = [(SAML_AUTH_SERVICE, "/svc")].into_iter().collect();
        let err = SamlBearerTokenProvider::new().configure(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting(key) if key == SAML_AUTH_ISSUER));
    }

    #[test]
    fn test_validity_is_bounded() {
        for value in ["0", "86401", "1000000000000000"] {
            let mut pairs = base_settings();
            pairs.push((SAML_AUTH_VALIDITY_SECONDS, value.to_string()));
            let settings: Settings = pairs.into_iter().collect();
            let err = SamlBearerTokenProvider::new().configure(&settings).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidSetting { key, .. } if key == SAML_AUTH_VALIDITY_SECONDS),
                "{value}: {err}"
            );
        }

        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_VALIDITY_SECONDS, "86400".to_string()));
        configured(pairs);
    }

    #[test]
    fn test_invalid_subject_header() {
        let mut pairs = base_settings();
        pairs.push((SAML_AUTH_SUBJECT_HEADER, "bad header".to_string()));
        let settings: Settings = pairs.into_iter().collect();
        let err = SamlBearerTokenProvider::new().configure(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }
}
