//! Upstream execution and redirect chasing.
//!
//! One logical client request may take several upstream round trips. Every
//! hop is fetched with redirects disabled so the `Location` header is
//! inspected here:
//!
//! - a location that classifies as proxiable is re-anchored under the
//!   relay prefix and returned with the original status and body, so the
//!   browser keeps coming back through the relay;
//! - an API call redirected within the canonical API host is followed
//!   transparently, bounded by the configured hop budget, because API
//!   clients expect final JSON without an extra client-side hop;
//! - any other location passes through untouched.

use axum::body::Body;
use axum::http::{header, HeaderValue, Response};

use crate::config::ProxyOptions;
use crate::proxy::classify::{self, Category};
use crate::proxy::error::ProxyError;
use crate::proxy::rewrite;
use crate::proxy::transport::{OutboundRequest, Transport, UpstreamResponse};
use crate::proxy::TargetDescriptor;

/// Issue the outbound call and resolve redirects per policy.
pub async fn execute(
    transport: &dyn Transport,
    request: OutboundRequest,
    descriptor: &TargetDescriptor,
    options: &ProxyOptions,
) -> Result<Response<Body>, ProxyError> {
    let api = descriptor.is_api_surface();
    let OutboundRequest {
        method,
        headers,
        body,
        target_url,
    } = request;

    // The inbound body can only be streamed once; chased hops re-issue
    // with an empty body.
    let mut body = Some(body);
    let mut target = target_url;
    let mut hops = 0u32;

    loop {
        let outbound = OutboundRequest {
            method: method.clone(),
            headers: headers.clone(),
            body: body.take().unwrap_or_else(Body::empty),
            target_url: target.clone(),
        };

        let upstream = transport
            .send(outbound)
            .await
            .map_err(|source| ProxyError::Upstream { source, api })?;

        let location = upstream
            .headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if let Some(location) = location {
            // API clients expect final JSON without an extra client-side
            // hop, so the same-host check runs before re-anchoring.
            if api && location.starts_with(options.api_host.as_str()) {
                hops += 1;
                if hops > options.max_redirect_hops {
                    tracing::warn!(
                        url = %target,
                        hops,
                        "redirect chain exceeded hop budget"
                    );
                    return Err(ProxyError::RedirectLoop { hops, api });
                }
                tracing::debug!(from = %target, to = %location, hop = hops, "following api redirect");
                target = location;
                continue;
            }
            if classify::classify(&location) != Category::Unsupported {
                return Ok(reanchor(upstream, &location, options, api));
            }
            // Non-proxiable location: passes through untouched.
        }

        return Ok(rewrite::rewrite(upstream, api));
    }
}

// Keep the upstream status and body, but point the location back at the
// relay so the next request also flows through it.
fn reanchor(
    upstream: UpstreamResponse,
    location: &str,
    options: &ProxyOptions,
    api: bool,
) -> Response<Body> {
    let mut response = rewrite::rewrite(upstream, api);
    let anchored = format!("{}{}", options.prefix, location);
    if let Ok(value) = HeaderValue::from_str(&anchored) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}
