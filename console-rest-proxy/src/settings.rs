// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Proxy settings
//!
//! [`Settings`] is the resolved key/value view of the console configuration
//! file. Nested YAML mappings are flattened into dotted keys, so these two
//! files are equivalent:
//!
//! ```yaml
//! bpel-console.rest-proxy.proxy-url: "SCHEME://HOST:PORT/rs"
//! ```
//!
//! ```yaml
//! bpel-console:
//!   rest-proxy:
//!     proxy-url: "SCHEME://HOST:PORT/rs"
//! ```
//!
//! [`ProxyConfiguration`] is the validated, immutable configuration the
//! request handler is built from.

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthProviderKind;
use crate::error::ConfigError;

/// Backend URL template, with `SCHEME`, `HOST` and `PORT` placeholders.
pub const PROXY_URL: &str = "bpel-console.rest-proxy.proxy-url";

/// Identifier of the authentication provider to use.
pub const AUTH_PROVIDER: &str = "bpel-console.rest-proxy.authentication-provider";

/// Older spelling of [`AUTH_PROVIDER`], read when the current key is absent.
pub const LEGACY_AUTH_PROVIDER: &str = "bpel-console.rest-proxy.authentication.provider";

// =============================================================================
// Settings
// =============================================================================

/// Read-only string settings, keyed by fully qualified name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_yaml::from_str(yaml)?;
        let mut values = BTreeMap::new();
        flatten("", &root, &mut values);
        Ok(Self { values })
    }

    /// Load settings from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Look up a setting.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a setting that must be present and non-empty.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingSetting(key.to_string()))
    }

    /// A setting is true only when it is exactly `true`.
    pub fn is_true(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    /// Parse an optional numeric setting.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: std::num::ParseIntError| ConfigError::InvalidSetting {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Settings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let Some(segment) = scalar_to_string(k) else {
                    continue;
                };
                let key = if prefix.is_empty() {
                    segment
                } else {
                    format!("{prefix}.{segment}")
                };
                flatten(&key, v, out);
            }
        }
        Value::Sequence(items) => {
            // Lists collapse to a comma separated value
            let joined: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
            out.insert(prefix.to_string(), joined.join(","));
        }
        Value::Tagged(tagged) => flatten(prefix, &tagged.value, out),
        other => {
            if let Some(s) = scalar_to_string(other) {
                out.insert(prefix.to_string(), s);
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

// =============================================================================
// Proxy configuration
// =============================================================================

/// Which HTTP method the outbound call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutboundMethod {
    /// Forward the inbound method unchanged.
    #[default]
    Preserve,
    /// Always call the backend with GET (legacy console behavior).
    ForceGet,
}

/// Validated configuration for one proxy endpoint.
#[derive(Debug, Clone)]
pub struct ProxyConfiguration {
    /// Backend URL template (`SCHEME`, `HOST`, `PORT` placeholders)
    pub proxy_url_template: String,

    /// Authentication provider, if any
    pub auth_provider: Option<AuthProviderKind>,

    /// All settings, handed to the provider at configure time
    pub settings: Arc<Settings>,

    /// Outbound method policy
    pub outbound_method: OutboundMethod,

    /// Whole-request timeout for backend calls (None = no timeout)
    pub upstream_timeout: Option<Duration>,

    /// Connect timeout for backend calls
    pub connect_timeout: Duration,
}

impl ProxyConfiguration {
    /// Build from settings, failing fast when `proxy-url` is missing or the
    /// provider identifier is not recognised.
    ///
    /// The provider comes from `authentication-provider`, or from the legacy
    /// `authentication.provider` key when only that one is set. Both set to
    /// different providers is an error.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let proxy_url_template = settings.require(PROXY_URL)?.trim().to_string();

        let current = provider_at(&settings, AUTH_PROVIDER)?;
        let legacy = provider_at(&settings, LEGACY_AUTH_PROVIDER)?;
        let auth_provider = match (current, legacy) {
            (Some(current), Some(legacy)) if current != legacy => {
                return Err(ConfigError::InvalidSetting {
                    key: LEGACY_AUTH_PROVIDER.to_string(),
                    reason: format!(
                        "names {legacy} but {AUTH_PROVIDER} names {current}; set only one"
                    ),
                });
            }
            (current, legacy) => current.or(legacy),
        };

        Ok(Self {
            proxy_url_template,
            auth_provider,
            settings: Arc::new(settings),
            outbound_method: OutboundMethod::default(),
            upstream_timeout: Some(Duration::from_secs(30)),
            connect_timeout: Duration::from_secs(5),
        })
    }

    pub fn with_outbound_method(mut self, method: OutboundMethod) -> Self {
        self.outbound_method = method;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

fn provider_at(settings: &Settings, key: &str) -> Result<Option<AuthProviderKind>, ConfigError> {
    match settings.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => Ok(Some(id.parse::<AuthProviderKind>()?)),
    }
}
