// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! SAML 2.0 bearer assertion builder
//!
//! Values are escaped with `quick_xml`; signing canonicalizes the result
//! before digesting it.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use std::time::Duration;
use uuid::Uuid;

use crate::error::AuthSetupError;

pub const SAML_ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
pub const BEARER_CONFIRMATION: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";

/// Default assertion lifetime.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(10);

/// Subject used when no principal is known.
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// A serialized assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlAssertion {
    /// Value of the `ID` attribute
    pub id: String,
    /// Assertion XML
    pub xml: String,
    /// Whether an enveloped signature is present
    pub signed: bool,
}

/// Builds an unsigned assertion for `(issuer, service)`.
#[derive(Debug, Clone)]
pub struct SamlAssertionBuilder {
    issuer: String,
    service: String,
    subject: String,
    validity: Duration,
    issue_instant: Option<DateTime<Utc>>,
    id: Option<String>,
}

impl SamlAssertionBuilder {
    pub fn new(issuer: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            service: service.into(),
            subject: ANONYMOUS_SUBJECT.to_string(),
            validity: DEFAULT_VALIDITY,
            issue_instant: None,
            id: None,
        }
    }

    /// Principal placed in `Subject/NameID`.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Lifetime of the assertion (`NotOnOrAfter - NotBefore`).
    pub fn validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Fix the issue instant instead of using the current time.
    pub fn issue_instant(mut self, instant: DateTime<Utc>) -> Self {
        self.issue_instant = Some(instant);
        self
    }

    /// Fix the assertion ID instead of generating one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Serialize the assertion. Fails when the validity window does not fit
    /// in a timestamp.
    pub fn build(self) -> Result<SamlAssertion, AuthSetupError> {
        let id = self.id.unwrap_or_else(|| format!("ID_{}", Uuid::new_v4()));
        let now = self.issue_instant.unwrap_or_else(Utc::now);
        let not_on_or_after = chrono::Duration::from_std(self.validity)
            .ok()
            .and_then(|validity| now.checked_add_signed(validity))
            .ok_or_else(|| {
                AuthSetupError::Assertion(format!(
                    "validity of {}s is out of range",
                    self.validity.as_secs()
                ))
            })?;

        let issue_instant = timestamp(now);

        let mut xml = String::with_capacity(1024);
        xml.push_str("<saml2:Assertion xmlns:saml2=\"");
        xml.push_str(SAML_ASSERTION_NS);
        xml.push_str("\" ID=\"");
        xml.push_str(&escape(&id));
        xml.push_str("\" IssueInstant=\"");
        xml.push_str(&issue_instant);
        xml.push_str("\" Version=\"2.0\">");

        xml.push_str("<saml2:Issuer>");
        xml.push_str(&escape(&self.issuer));
        xml.push_str("</saml2:Issuer>");

        xml.push_str("<saml2:Subject><saml2:NameID>");
        xml.push_str(&escape(&self.subject));
        xml.push_str("</saml2:NameID><saml2:SubjectConfirmation Method=\"");
        xml.push_str(BEARER_CONFIRMATION);
        xml.push_str("\"></saml2:SubjectConfirmation></saml2:Subject>");

        xml.push_str("<saml2:Conditions NotBefore=\"");
        xml.push_str(&issue_instant);
        xml.push_str("\" NotOnOrAfter=\"");
        xml.push_str(&timestamp(not_on_or_after));
        xml.push_str("\"><saml2:AudienceRestriction><saml2:Audience>");
        xml.push_str(&escape(&self.service));
        xml.push_str("</saml2:Audience></saml2:AudienceRestriction></saml2:Conditions>");

        xml.push_str("</saml2:Assertion>");

        Ok(SamlAssertion {
            id,
            xml,
            signed: false,
        })
    }
}

fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
