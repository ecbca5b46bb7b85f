// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
mod handler;
mod request;
mod url;

pub use handler::{ProxyRequestHandler, TRANSPORT_MANAGED_HEADERS};
pub use request::{InboundRequest, OutboundRequest, RequestOrigin};
pub use url::{build_target_url, resolve_template};
