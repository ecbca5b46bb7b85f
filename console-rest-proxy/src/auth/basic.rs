// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;

use super::encoder::authorization_header;
use super::AuthProvider;
use crate::error::{AuthSetupError, ConfigError};
use crate::proxy::OutboundRequest;
use crate::settings::Settings;

pub const BASIC_AUTH_USER: &str = "bpel-console.rest-proxy.authentication.basic.user";
pub const BASIC_AUTH_PASSWORD: &str = "bpel-console.rest-proxy.authentication.basic.password";

#[derive(Clone)]
struct BasicCredentials {
    user: String,
    password: String,
}

/// Sends a fixed HTTP Basic credential with every request.
#[derive(Clone, Default)]
pub struct BasicAuthProvider {
    credentials: Option<BasicCredentials>,
}

impl BasicAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for BasicAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthProvider")
            .field("user", &self.credentials.as_ref().map(|c| c.user.as_str()))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for BasicAuthProvider {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn configure(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        let user = settings.require(BASIC_AUTH_USER)?.to_string();
        // An empty password is a legitimate credential
        let password = settings
            .get(BASIC_AUTH_PASSWORD)
            .ok_or_else(|| ConfigError::MissingSetting(BASIC_AUTH_PASSWORD.to_string()))?
            .to_string();

        self.credentials = Some(BasicCredentials { user, password });
        Ok(())
    }

    async fn authenticate(&self, request: &mut OutboundRequest) -> Result<(), AuthSetupError> {
        let Some(credentials) = &self.credentials else {
            return Ok(());
        };

        let value = authorization_header(&credentials.user, &credentials.password)?;
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}
