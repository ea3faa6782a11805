//! Outbound transport abstraction.
//!
//! The pipeline never talks to the network directly: it hands an
//! [`OutboundRequest`] to a [`Transport`] and gets an [`UpstreamResponse`]
//! back. Tests substitute a recording double; production uses the
//! reqwest-backed [`HttpTransport`] with redirects disabled, since the
//! executor must see every `Location` itself.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, StatusCode};
use tokio::time::timeout;

use crate::config::TimeoutConfig;

/// The request one upstream hop sends.
pub struct OutboundRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Body,
    pub target_url: String,
}

/// The response one upstream hop produced. Read-only: the rewriter always
/// constructs a fresh response for the caller.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

/// Failure contacting upstream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Send(#[from] reqwest::Error),

    #[error("no response headers within {0:?}")]
    Timeout(Duration),
}

/// Capability to perform one upstream round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError>;
}

/// Production transport over reqwest.
///
/// Streams bodies in both directions; a hop is bounded by the configured
/// header timeout, body streaming is not.
pub struct HttpTransport {
    client: reqwest::Client,
    header_timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()?;
        Ok(Self {
            client,
            header_timeout: Duration::from_secs(timeouts.upstream_header_secs),
        })
    }
}

// Connection-scoped headers never survive a proxy hop; the client
// recomputes host and framing for the new destination.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
];

fn sanitize_request_headers(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
        let OutboundRequest {
            method,
            mut headers,
            body,
            target_url,
        } = request;
        sanitize_request_headers(&mut headers);

        let outbound = self
            .client
            .request(method, &target_url)
            .headers(headers)
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .build()?;

        let response = timeout(self.header_timeout, self.client.execute(outbound))
            .await
            .map_err(|_| TransportError::Timeout(self.header_timeout))??;

        Ok(UpstreamResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: Body::from_stream(response.bytes_stream()),
        })
    }
}
