// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! PKCS#12 keystore access
//!
//! The keystore password unlocks the container; the entry is selected by
//! its alias (the PKCS#12 friendly name). When the key password differs
//! from the keystore password the container is reopened with it.
//!
//! Only the primary key entry of a PKCS#12 file is reachable. Aliases that
//! name another entry fail with [`AuthSetupError::SecondaryKeystoreEntry`];
//! export the signing key into its own keystore in that case.

use openssl::{
    pkcs12::Pkcs12,
    pkey::{PKey, Private},
    x509::X509,
};
use std::path::Path;
use tracing::debug;

use crate::error::AuthSetupError;

/// Signing key and its certificate.
#[derive(Clone)]
pub struct KeyPair {
    pub private_key: PKey<Private>,
    pub certificate: Option<X509>,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_type", &self.private_key.id())
            .field("has_certificate", &self.certificate.is_some())
            .finish()
    }
}

/// An opened keystore.
pub struct Keystore {
    der: Vec<u8>,
    password: String,
    private_key: Option<PKey<Private>>,
    certificate: Option<X509>,
    /// Friendly names of the additional certificates in the bag
    other_aliases: Vec<String>,
}

impl Keystore {
    /// Read and open a keystore file.
    pub async fn load(path: impl AsRef<Path>, password: &str) -> Result<Self, AuthSetupError> {
        let path = path.as_ref();
        let der = tokio::fs::read(path)
            .await
            .map_err(|source| AuthSetupError::KeystoreRead {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "keystore loaded");
        Self::from_der(der, password)
    }

    /// Open a DER encoded PKCS#12 keystore.
    pub fn from_der(der: Vec<u8>, password: &str) -> Result<Self, AuthSetupError> {
        let parsed = Pkcs12::from_der(&der)
            .and_then(|p12| p12.parse2(password))
            .map_err(|e| AuthSetupError::KeystoreOpen(e.to_string()))?;

        let other_aliases = parsed
            .ca
            .iter()
            .flat_map(|stack| stack.iter())
            .filter_map(|cert| cert.alias())
            .map(|alias| String::from_utf8_lossy(alias).into_owned())
            .collect();

        Ok(Self {
            der,
            password: password.to_string(),
            private_key: parsed.pkey,
            certificate: parsed.cert,
            other_aliases,
        })
    }

    /// Alias of the keystore entry, if it carries one.
    pub fn alias(&self) -> Option<String> {
        self.certificate
            .as_ref()
            .and_then(|cert| cert.alias())
            .map(|alias| String::from_utf8_lossy(alias).into_owned())
    }

    /// Extract the key pair stored under `alias`.
    pub fn key_pair(&self, alias: &str, key_password: Option<&str>) -> Result<KeyPair, AuthSetupError> {
        check_alias(alias, self.alias().as_deref(), &self.other_aliases)?;

        let (private_key, certificate) = match key_password {
            Some(key_password) if key_password != self.password => {
                let reopened = Self::from_der(self.der.clone(), key_password)?;
                (reopened.private_key, reopened.certificate)
            }
            _ => (self.private_key.clone(), self.certificate.clone()),
        };

        let private_key =
            private_key.ok_or_else(|| AuthSetupError::MissingPrivateKey(alias.to_string()))?;

        Ok(KeyPair {
            private_key,
            certificate,
        })
    }
}

fn check_alias(
    requested: &str,
    primary: Option<&str>,
    others: &[String],
) -> Result<(), AuthSetupError> {
    if primary == Some(requested) {
        Ok(())
    } else if others.iter().any(|other| other == requested) {
        Err(AuthSetupError::SecondaryKeystoreEntry(requested.to_string()))
    } else {
        Err(AuthSetupError::KeyAliasNotFound(requested.to_string()))
    }
}
