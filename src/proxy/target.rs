//! Target URL extraction from the inbound request.
//!
//! # Responsibilities
//! - Recover the embedded target URL from the query form (`?q=<url>`) or
//!   the path form (`<prefix><url>`)
//! - Enforce the "must be a complete URL" invariant before anything
//!   downstream sees the string
//!
//! # Design Decisions
//! - The query form is never proxied directly; it is normalized with a 301
//!   to the canonical path form
//! - The edge collapses `//` runs in paths, so `https:/host/...` is
//!   repaired before the scheme check
//! - No other normalization happens here; the string is forwarded as-is

use axum::http::Uri;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::proxy::error::ProxyError;

/// Outcome of extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Query form: redirect the caller to the canonical path form.
    Normalize { location: String },
    /// Empty path form: answer with the informational landing response.
    Landing,
    /// A complete target URL, ready for admission and classification.
    Target(String),
}

// Repairs scheme slashes collapsed by the edge: `https:/x` → `https://x`.
static SCHEME_COLLAPSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)(https?):/+").expect("scheme collapse pattern"));

// Scheme presence is checked case-insensitively, like the classifier rules.
static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)https?://").expect("scheme pattern"));

fn has_scheme(candidate: &str) -> bool {
    SCHEME.is_match(candidate)
}

/// Extract the target from the inbound request URL.
///
/// `host` is the inbound Host header, used only to build the absolute
/// normalization redirect; when absent the redirect falls back to a
/// relative location.
pub fn extract(uri: &Uri, host: Option<&str>, prefix: &str) -> Result<Extraction, ProxyError> {
    if let Some(query) = uri.query() {
        let q = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned());
        if let Some(target) = q {
            if !has_scheme(&target) {
                return Err(ProxyError::InvalidTargetFormat);
            }
            let location = match host {
                Some(host) => format!("https://{host}{prefix}{target}"),
                None => format!("{prefix}{target}"),
            };
            return Ok(Extraction::Normalize { location });
        }
    }

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let remainder = path_and_query
        .strip_prefix(prefix)
        .ok_or(ProxyError::UnsupportedFormat)?;

    if remainder.is_empty() {
        return Ok(Extraction::Landing);
    }

    let candidate = SCHEME_COLLAPSE.replace(remainder, "${1}://").into_owned();
    if !has_scheme(&candidate) {
        return Err(ProxyError::UnsupportedFormat);
    }

    Ok(Extraction::Target(candidate))
}
