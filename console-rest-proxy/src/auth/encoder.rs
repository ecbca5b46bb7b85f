// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Authorization header encoding
//!
//! Both Basic credentials and SAML bearer tokens travel as
//! `Basic base64(<scheme>:<credential>)`. The SAML provider puts the literal
//! `SAML-BEARER-TOKEN` in the username slot.

use axum::http::HeaderValue;
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::AuthSetupError;

/// Build `Basic base64(scheme:credential)`.
pub fn encode_credentials(scheme: &str, credential: &str) -> String {
    let mut payload = String::with_capacity(scheme.len() + 1 + credential.len());
    payload.push_str(scheme);
    payload.push(':');
    payload.push_str(credential);
    format!("Basic {}", STANDARD.encode(payload.as_bytes()))
}

/// Encoded credentials as a sensitive header value.
pub fn authorization_header(scheme: &str, credential: &str) -> Result<HeaderValue, AuthSetupError> {
    let mut value = HeaderValue::from_str(&encode_credentials(scheme, credential))
        .map_err(|_| AuthSetupError::InvalidHeaderValue)?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_credentials() {
        assert_eq!(
            encode_credentials("alice", "secret"),
            format!("Basic {}", STANDARD.encode("alice:secret"))
        );
        assert_eq!(encode_credentials("alice", "secret"), "Basic YWxpY2U6c2VjcmV0");
    }

    #[test]
    fn test_colons_in_credential_are_kept() {
        let value = encode_credentials("SAML-BEARER-TOKEN", "<a b=\"1:2\"/>");
        let decoded = STANDARD
            .decode(value.strip_prefix("Basic ").unwrap())
            .unwrap();
        assert_eq!(decoded, b"SAML-BEARER-TOKEN:<a b=\"1:2\"/>");
    }

    #[test]
    fn test_empty_parts() {
        assert_eq!(encode_credentials("", ""), "Basic Og==");
    }

    #[test]
    fn test_header_is_sensitive() {
        let value = authorization_header("alice", "secret").unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value, "Basic YWxpY2U6c2VjcmV0");
    }
}
