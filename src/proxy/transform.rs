//! Outbound request construction.
//!
//! # Responsibilities
//! - Copy method and body verbatim; clone headers (never mutate the
//!   inbound mapping)
//! - Inject a realistic browser identity for API surfaces when the caller
//!   supplied none, and drop the inbound host header for those calls
//! - Apply the blob→raw substitution in proxy mode
//! - Short-circuit blob/raw targets to the CDN mirror in mirror mode
//!
//! # Design Decisions
//! - Mirror rewrites produce an `@`-delimited revision marker the CDN
//!   understands; no outbound fetch happens on that path

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::config::ProxyOptions;
use crate::proxy::classify::Category;
use crate::proxy::error::ProxyError;
use crate::proxy::transport::OutboundRequest;
use crate::proxy::TargetDescriptor;

/// What the transformer decided to do with the request.
pub enum Transformed {
    /// Mirror mode: send the caller to the CDN, skip the fetch entirely.
    MirrorRedirect(String),
    /// Proxy mode: perform the outbound call.
    Fetch(OutboundRequest),
}

static GITHUB_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)(?:https?://)?github\.com").expect("github host pattern"));

/// Build the outbound request (or mirror redirect) for a classified target.
pub fn build(
    method: &Method,
    headers: &HeaderMap,
    body: Body,
    descriptor: &TargetDescriptor,
    options: &ProxyOptions,
) -> Result<Transformed, ProxyError> {
    if options.mirror {
        match descriptor.category {
            Category::BlobOrRaw => {
                return Ok(Transformed::MirrorRedirect(mirror_blob_url(
                    &descriptor.raw_url,
                    &options.mirror_host,
                )));
            }
            Category::RawContent => {
                return Ok(Transformed::MirrorRedirect(mirror_raw_url(
                    &descriptor.raw_url,
                    &options.mirror_host,
                )?));
            }
            _ => {}
        }
    }

    let mut target = descriptor.raw_url.clone();
    if descriptor.category == Category::BlobOrRaw {
        target = target.replacen("/blob/", "/raw/", 1);
    }
    Url::parse(&target).map_err(|_| ProxyError::InvalidTargetUrl)?;

    let mut outbound_headers = headers.clone();
    if descriptor.category.is_api_surface() {
        if !outbound_headers.contains_key(header::USER_AGENT) {
            if let Ok(identity) = HeaderValue::from_str(&options.api_user_agent) {
                outbound_headers.insert(header::USER_AGENT, identity);
            }
        }
        outbound_headers.remove(header::HOST);
    }

    Ok(Transformed::Fetch(OutboundRequest {
        method: method.clone(),
        headers: outbound_headers,
        body,
        target_url: target,
    }))
}

// `github.com/o/r/blob/rev/path` → `<mirror>/o/r@rev/path`.
fn mirror_blob_url(raw_url: &str, mirror_host: &str) -> String {
    let marked = raw_url.replacen("/blob/", "@", 1);
    GITHUB_HOST
        .replace(&marked, regex::NoExpand(mirror_host))
        .into_owned()
}

// `raw.githubusercontent.com/o/r/rev/path` → `<mirror>/o/r@rev/path`.
fn mirror_raw_url(raw_url: &str, mirror_host: &str) -> Result<String, ProxyError> {
    let url = Url::parse(raw_url).map_err(|_| ProxyError::InvalidTargetUrl)?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    let [owner, repo, revision, rest @ ..] = segments.as_slice() else {
        return Err(ProxyError::InvalidTargetUrl);
    };
    if rest.is_empty() {
        return Err(ProxyError::InvalidTargetUrl);
    }
    let mut rewritten = format!("{mirror_host}/{owner}/{repo}@{revision}/{}", rest.join("/"));
    if let Some(query) = url.query() {
        rewritten.push('?');
        rewritten.push_str(query);
    }
    Ok(rewritten)
}
