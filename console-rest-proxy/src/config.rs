// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::settings::{OutboundMethod, ProxyConfiguration, Settings};
use crate::error::ConfigError;

/// Process configuration loaded from environment variables.
///
/// Proxy behavior (backend URL, credentials) lives in the settings file
/// pointed to by `SETTINGS_FILE`; this struct only covers how the process
/// runs.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "json" or "pretty" (default: json)
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// YAML settings file (default: bpel-console.yaml)
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,

    /// Path the proxy is mounted under (default: /proxy)
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    /// Outbound method policy: "preserve" or "force-get" (default: preserve)
    #[serde(default)]
    pub outbound_method: OutboundMethod,

    /// Backend request timeout in seconds, 0 disables (default: 30)
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// Backend connect timeout in seconds (default: 5)
    #[serde(default = "default_upstream_connect_timeout")]
    pub upstream_connect_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_settings_file() -> PathBuf {
    PathBuf::from("bpel-console.yaml")
}

fn default_mount_path() -> String {
    "/proxy".to_string()
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_upstream_connect_timeout() -> u64 {
    5
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are uppercase with underscore separators.
    /// Example: `SETTINGS_FILE`, `LOG_LEVEL`, etc.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Mount path normalized to a leading slash and no trailing slash.
    pub fn normalized_mount_path(&self) -> String {
        let trimmed = self.mount_path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Load the settings file and build the proxy configuration from it.
    pub fn load_proxy_configuration(&self) -> Result<ProxyConfiguration, ConfigError> {
        let settings = Settings::from_yaml_file(&self.settings_file)?;
        self.proxy_configuration(settings)
    }

    /// Build the proxy configuration from already loaded settings.
    pub fn proxy_configuration(&self, settings: Settings) -> Result<ProxyConfiguration, ConfigError> {
        let upstream_timeout = match self.upstream_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(ProxyConfiguration::from_settings(settings)?
            .with_outbound_method(self.outbound_method)
            .with_upstream_timeout(upstream_timeout)
            .with_connect_timeout(Duration::from_secs(self.upstream_connect_timeout_secs)))
    }
}
