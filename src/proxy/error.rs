//! Error taxonomy for the relay pipeline.
//!
//! Every variant is terminal: the stage that detects it stops the pipeline
//! and the error is rendered into an HTTP response at the boundary. Nothing
//! here propagates past the handler.

use axum::http::StatusCode;

use crate::proxy::transport::TransportError;

/// Terminal pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Query-form target without an explicit http(s) scheme.
    #[error("target must be an absolute http(s) URL")]
    InvalidTargetFormat,

    /// Target carried a scheme but does not parse as a URL.
    #[error("invalid URL")]
    InvalidTargetUrl,

    /// Path-form remainder without an explicit http(s) scheme.
    #[error("unsupported path format")]
    UnsupportedFormat,

    /// Classifier returned no proxiable category.
    #[error("target is not a proxied surface")]
    NotSupported,

    /// Allow-list rejected the target.
    #[error("blocked")]
    AccessDenied,

    /// Network/DNS/TLS failure contacting upstream.
    #[error("upstream request failed: {source}")]
    Upstream {
        source: TransportError,
        /// Whether the failing call was an API-surface request.
        api: bool,
    },

    /// Transparent redirect chase exceeded the hop budget.
    #[error("redirect chain exceeded {hops} hops")]
    RedirectLoop { hops: u32, api: bool },
}

impl ProxyError {
    /// HTTP status the error maps to. API-surface upstream failures use
    /// 503 so API clients can distinguish them from relay-side faults.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidTargetFormat | ProxyError::InvalidTargetUrl => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::UnsupportedFormat | ProxyError::NotSupported => StatusCode::NOT_FOUND,
            ProxyError::AccessDenied => StatusCode::FORBIDDEN,
            ProxyError::Upstream { api, .. } | ProxyError::RedirectLoop { api, .. } => {
                if *api {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
        }
    }

    /// Stable machine-readable code used by structured error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::InvalidTargetFormat => "invalid_target_format",
            ProxyError::InvalidTargetUrl => "invalid_target_url",
            ProxyError::UnsupportedFormat => "unsupported_format",
            ProxyError::NotSupported => "not_supported",
            ProxyError::AccessDenied => "access_denied",
            ProxyError::Upstream { .. } => "upstream_failure",
            ProxyError::RedirectLoop { .. } => "redirect_loop",
        }
    }
}
