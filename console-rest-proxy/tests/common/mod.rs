// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
#![allow(dead_code)]

use console_rest_proxy::{ProxyConfiguration, ProxyRequestHandler, RequestOrigin, Settings};
use std::io::Write;
use std::net::SocketAddr;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::MockServer;

#[path = "../../src/saml/test_support.rs"]
mod key_material;

/// Origin pointing at the mock backend, for `SCHEME://HOST:PORT` templates.
pub fn origin_of(server: &MockServer) -> RequestOrigin {
    let addr = server.address();
    RequestOrigin::new("http", addr.ip().to_string(), addr.port())
}

/// Origin pointing at a plain TCP backend.
pub fn origin_at(addr: SocketAddr) -> RequestOrigin {
    RequestOrigin::new("http", addr.ip().to_string(), addr.port())
}

/// Response of the chunked backend: fixed headers, body `<processes/>` in
/// two chunks.
pub const CHUNKED_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: application/xml\r\n\
X-Backend: bpel\r\n\
Set-Cookie: a=1\r\n\
Set-Cookie: b=2\r\n\
Transfer-Encoding: chunked\r\n\
Connection: close\r\n\
\r\n\
5\r\n<proc\r\n\
7\r\nesses/>\r\n\
0\r\n\r\n";

/// Backend answering every request with [`CHUNKED_RESPONSE`]. Wiremock
/// always sends a length and a `Date`, so this one is a bare listener.
pub async fn spawn_chunked_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                // Requests are bodiless GETs; the head is all there is
                while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                    if read == buf.len() {
                        return;
                    }
                }
                let _ = socket.write_all(CHUNKED_RESPONSE).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

pub fn handler_with(pairs: &[(&str, &str)]) -> ProxyRequestHandler {
    let settings: Settings = pairs.iter().copied().collect();
    let configuration = ProxyConfiguration::from_settings(settings).unwrap();
    ProxyRequestHandler::new(configuration).unwrap()
}

/// Write a PKCS#12 keystore with one self-signed RSA entry.
pub fn write_keystore(alias: &str, password: &str) -> NamedTempFile {
    let (der, _) = key_material::pkcs12_keystore(alias, password);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&der).unwrap();
    file
}
