//! The URL-classification-and-rewrite pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → target.rs    (recover + validate the embedded target URL)
//!     → allowlist.rs (substring admission, before classification)
//!     → classify.rs  (ordered category rules, first match wins)
//!     → transform.rs (outbound request or mirror redirect)
//!     → executor.rs  (fetch, chase API redirects, re-anchor locations)
//!     → rewrite.rs   (CORS injection, restrictive-header scrub)
//! ```
//!
//! A rejection at any gate short-circuits with a terminal response; no
//! stage after a rejection runs.

pub mod allowlist;
pub mod classify;
pub mod error;
pub mod executor;
pub mod rewrite;
pub mod target;
pub mod transform;
pub mod transport;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};

use crate::config::ProxyOptions;
use crate::http::response;
use crate::observability::metrics;
use crate::proxy::classify::Category;
use crate::proxy::error::ProxyError;
use crate::proxy::target::Extraction;
use crate::proxy::transform::Transformed;
use crate::proxy::transport::Transport;

pub use classify::classify;
pub use transport::{HttpTransport, OutboundRequest, Transport as RelayTransport, UpstreamResponse};

/// A classified target, derived per request and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    /// Complete target URL; always carries an explicit scheme.
    pub raw_url: String,
    pub category: Category,
}

impl TargetDescriptor {
    pub fn is_api_surface(&self) -> bool {
        self.category.is_api_surface()
    }
}

/// The relay pipeline: immutable policy plus an injected transport.
///
/// One instance serves all requests; nothing here is mutated after
/// construction.
pub struct Pipeline {
    options: ProxyOptions,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub fn new(options: ProxyOptions, transport: Arc<dyn Transport>) -> Self {
        Self { options, transport }
    }

    pub fn options(&self) -> &ProxyOptions {
        &self.options
    }

    /// Handle one inbound request end to end. This is the error boundary:
    /// every pipeline failure is rendered into a terminal response here.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let method = request.method().to_string();
        let request_id = request
            .headers()
            .get(crate::http::X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        if is_preflight(&request) {
            return response::preflight();
        }

        let (category, result) = self.dispatch(request).await;
        let response = match result {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(
                    request_id = %request_id,
                    code = error.code(),
                    status = error.status().as_u16(),
                    "request rejected: {error}"
                );
                response::error(&error, self.options.error_format)
            }
        };

        let label = category.map(Category::label).unwrap_or("none");
        metrics::record_request(&method, response.status().as_u16(), label, start);
        tracing::debug!(
            request_id = %request_id,
            category = label,
            status = response.status().as_u16(),
            "request complete"
        );
        response
    }

    async fn dispatch(
        &self,
        request: Request<Body>,
    ) -> (Option<Category>, Result<Response<Body>, ProxyError>) {
        let (parts, body) = request.into_parts();
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok());

        let extraction = match target::extract(&parts.uri, host, &self.options.prefix) {
            Ok(extraction) => extraction,
            Err(error) => return (None, Err(error)),
        };

        let raw_url = match extraction {
            Extraction::Normalize { location } => {
                return (None, Ok(response::moved_permanently(&location)));
            }
            Extraction::Landing => return (None, Ok(response::landing())),
            Extraction::Target(raw_url) => raw_url,
        };

        if let Err(error) = allowlist::check(&raw_url, &self.options.allow_list) {
            return (None, Err(error));
        }

        let category = classify::classify(&raw_url);
        if category == Category::Unsupported {
            return (Some(category), Err(ProxyError::NotSupported));
        }
        let descriptor = TargetDescriptor { raw_url, category };

        tracing::debug!(
            url = %descriptor.raw_url,
            category = category.label(),
            "proxying target"
        );

        let transformed = match transform::build(
            &parts.method,
            &parts.headers,
            body,
            &descriptor,
            &self.options,
        ) {
            Ok(transformed) => transformed,
            Err(error) => return (Some(category), Err(error)),
        };

        let result = match transformed {
            Transformed::MirrorRedirect(location) => Ok(response::found(&location)),
            Transformed::Fetch(outbound) => {
                executor::execute(self.transport.as_ref(), outbound, &descriptor, &self.options)
                    .await
            }
        };
        (Some(category), result)
    }
}

fn is_preflight(request: &Request<Body>) -> bool {
    request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_HEADERS)
}
