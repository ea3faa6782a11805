//! Response rewriting before the caller sees anything.
//!
//! # Responsibilities
//! - Clone the upstream headers; the upstream mapping is never mutated
//! - Inject permissive cross-origin headers on every response
//! - Strip headers that would block browser consumption of proxied content
//! - Carry API quota headers through verbatim; they are load-bearing for
//!   client backoff logic
//!
//! # Design Decisions
//! - Idempotent: applying the rewrite twice yields the same header set
//! - Status and body stream pass through unchanged

use axum::body::Body;
use axum::http::{header, HeaderValue, Response};

use crate::proxy::transport::UpstreamResponse;

// Headers that restrict cross-origin use of the proxied bytes.
const BLOCKED_RESPONSE_HEADERS: &[&str] = &[
    "content-security-policy",
    "content-security-policy-report-only",
    "clear-site-data",
    "x-frame-options",
];

// Quota headers API clients key their backoff on.
const API_QUOTA_HEADERS: &[&str] = &[
    "x-ratelimit-limit",
    "x-ratelimit-remaining",
    "x-ratelimit-reset",
    "x-ratelimit-used",
    "x-github-media-type",
];

/// Build the caller-facing response from an upstream response.
pub fn rewrite(upstream: UpstreamResponse, api: bool) -> Response<Body> {
    let UpstreamResponse {
        status,
        headers,
        body,
    } = upstream;

    let mut rewritten = headers.clone();
    rewritten.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("*"),
    );
    rewritten.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    for &name in BLOCKED_RESPONSE_HEADERS {
        rewritten.remove(name);
    }

    if api {
        for &name in API_QUOTA_HEADERS {
            if let Some(value) = headers.get(name) {
                rewritten.insert(header::HeaderName::from_static(name), value.clone());
            }
        }
    }

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = rewritten;
    response
}
