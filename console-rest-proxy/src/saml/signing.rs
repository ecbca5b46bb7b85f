// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Enveloped XML signature for assertions
//!
//! The assertion is canonicalized (exclusive C14N) before signing and the
//! signed result is that canonical text with the signature inserted right
//! after `Issuer`, as the SAML schema requires. The reference digest covers
//! the canonical assertion without the signature; `SignedInfo` is signed in
//! its own canonical form.

use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::{hash::MessageDigest, sign::Signer};
use quick_xml::escape::escape;

use super::assertion::SamlAssertion;
use super::canonicalize_xml;
use super::keystore::KeyPair;
use crate::error::AuthSetupError;

pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";
pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

const ISSUER_END: &str = "</saml2:Issuer>";

/// Sign an unsigned assertion. Any failure is returned as an error; there is
/// no unsigned fallback.
pub fn sign_assertion(
    assertion: &SamlAssertion,
    key_pair: &KeyPair,
) -> Result<SamlAssertion, AuthSetupError> {
    if assertion.signed {
        return Err(AuthSetupError::Signing(
            "assertion is already signed".to_string(),
        ));
    }
    if key_pair.private_key.rsa().is_err() {
        return Err(AuthSetupError::UnsupportedKeyType(format!(
            "{:?}",
            key_pair.private_key.id()
        )));
    }

    let canonical = canonicalize_xml(&assertion.xml)?;
    let insert_at = canonical
        .find(ISSUER_END)
        .map(|pos| pos + ISSUER_END.len())
        .ok_or_else(|| AuthSetupError::Signing("assertion has no Issuer".to_string()))?;

    let digest = openssl::hash::hash(MessageDigest::sha256(), canonical.as_bytes())
        .map_err(|e| AuthSetupError::Signing(format!("digest failed: {e}")))?;

    let signed_info = canonicalize_xml(&signed_info(&assertion.id, &STANDARD.encode(digest)))?;

    let mut signer = Signer::new(MessageDigest::sha256(), &key_pair.private_key)
        .map_err(|e| AuthSetupError::Signing(e.to_string()))?;
    signer
        .update(signed_info.as_bytes())
        .map_err(|e| AuthSetupError::Signing(e.to_string()))?;
    let signature_value = signer
        .sign_to_vec()
        .map_err(|e| AuthSetupError::Signing(e.to_string()))?;

    let mut signature = String::with_capacity(2048);
    signature.push_str("<ds:Signature xmlns:ds=\"");
    signature.push_str(XMLDSIG_NS);
    signature.push_str("\">");
    signature.push_str(&signed_info);
    signature.push_str("<ds:SignatureValue>");
    signature.push_str(&STANDARD.encode(&signature_value));
    signature.push_str("</ds:SignatureValue>");
    if let Some(cert) = &key_pair.certificate {
        let der = cert
            .to_der()
            .map_err(|e| AuthSetupError::Signing(format!("certificate encoding failed: {e}")))?;
        signature.push_str("<ds:KeyInfo><ds:X509Data><ds:X509Certificate>");
        signature.push_str(&STANDARD.encode(der));
        signature.push_str("</ds:X509Certificate></ds:X509Data></ds:KeyInfo>");
    }
    signature.push_str("</ds:Signature>");

    let mut xml = String::with_capacity(canonical.len() + signature.len());
    xml.push_str(&canonical[..insert_at]);
    xml.push_str(&signature);
    xml.push_str(&canonical[insert_at..]);

    Ok(SamlAssertion {
        id: assertion.id.clone(),
        xml,
        signed: true,
    })
}

/// `SignedInfo` before canonicalization.
fn signed_info(reference_id: &str, digest_b64: &str) -> String {
    let mut s = String::with_capacity(768);
    s.push_str("<ds:SignedInfo xmlns:ds=\"");
    s.push_str(XMLDSIG_NS);
    s.push_str("\"><ds:CanonicalizationMethod Algorithm=\"");
    s.push_str(EXC_C14N);
    s.push_str("\"></ds:CanonicalizationMethod><ds:SignatureMethod Algorithm=\"");
    s.push_str(RSA_SHA256);
    s.push_str("\"></ds:SignatureMethod><ds:Reference URI=\"#");
    s.push_str(&escape(reference_id));
    s.push_str("\"><ds:Transforms><ds:Transform Algorithm=\"");
    s.push_str(ENVELOPED_SIGNATURE);
    s.push_str("\"></ds:Transform><ds:Transform Algorithm=\"");
    s.push_str(EXC_C14N);
    s.push_str("\"></ds:Transform></ds:Transforms><ds:DigestMethod Algorithm=\"");
    s.push_str(SHA256);
    s.push_str("\"></ds:DigestMethod><ds:DigestValue>");
    s.push_str(digest_b64);
    s.push_str("</ds:DigestValue></ds:Reference></ds:SignedInfo>");
    s
}
