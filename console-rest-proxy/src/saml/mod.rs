// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! SAML bearer assertions
//!
//! - **assertion**: unsigned SAML 2.0 assertion, emitted in canonical form
//! - **keystore**: PKCS#12 key material addressed by alias
//! - **signing**: enveloped XML signature (RSA-SHA256)

pub mod assertion;
pub mod keystore;
pub mod signing;

pub use assertion::{SamlAssertion, SamlAssertionBuilder, DEFAULT_VALIDITY};
pub use keystore::{KeyPair, Keystore};
pub use signing::sign_assertion;

use xml_canonicalization::Canonicalizer;

use crate::error::AuthSetupError;

/// Exclusive C14N (without comments) of an XML fragment.
pub(crate) fn canonicalize_xml(xml: &str) -> Result<String, AuthSetupError> {
    let mut output = Vec::new();
    Canonicalizer::read_from_str(xml)
        .write_to_writer(&mut output)
        .canonicalize(false)
        .map_err(|e| AuthSetupError::Signing(format!("XML canonicalization failed: {e}")))?;

    String::from_utf8(output)
        .map_err(|e| AuthSetupError::Signing(format!("canonical XML is not UTF-8: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support;
