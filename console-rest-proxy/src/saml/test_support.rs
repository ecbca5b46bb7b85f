// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Key material for tests. Also compiled into the integration tests, so it
//! only depends on `openssl`.

use openssl::{
    asn1::Asn1Time,
    bn::BigNum,
    hash::MessageDigest,
    pkcs12::Pkcs12,
    pkey::{PKey, Private},
    rsa::Rsa,
    x509::{X509Builder, X509NameBuilder, X509},
};

/// Self-signed RSA key pair.
pub fn rsa_identity() -> (PKey<Private>, X509) {
    let rsa = Rsa::generate(2048).unwrap();
    let private_key = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "console-rest-proxy").unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&private_key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(&private_key, MessageDigest::sha256()).unwrap();

    (private_key, builder.build())
}

/// PKCS#12 keystore holding one RSA entry under `alias`.
pub fn pkcs12_keystore(alias: &str, password: &str) -> (Vec<u8>, X509) {
    let (private_key, cert) = rsa_identity();
    let mut builder = Pkcs12::builder();
    builder.name(alias).pkey(&private_key).cert(&cert);
    let der = builder.build2(password).unwrap().to_der().unwrap();
    (der, cert)
}
