// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use super::RequestOrigin;

/// Substitute `SCHEME`, `HOST` and `PORT` in the template, in that order.
pub fn resolve_template(template: &str, origin: &RequestOrigin) -> String {
    template
        .replace("SCHEME", &origin.scheme)
        .replace("HOST", &origin.host)
        .replace("PORT", &origin.port.to_string())
}

/// Target URL for a proxied request.
///
/// One trailing slash of the resolved template is dropped; path info and
/// query string are appended exactly as received.
pub fn build_target_url(
    template: &str,
    origin: &RequestOrigin,
    path_info: Option<&str>,
    query_string: Option<&str>,
) -> String {
    let mut url = resolve_template(template, origin);
    if url.ends_with('/') {
        url.pop();
    }
    if let Some(path_info) = path_info {
        url.push_str(path_info);
    }
    if let Some(query_string) = query_string {
        url.push('?');
        url.push_str(query_string);
    }
    url
}

/// Whether a path contains a `.` or `..` segment, literal or percent-encoded.
///
/// URL parsers resolve these segments, which would move the request out of
/// the configured base path.
pub fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}
