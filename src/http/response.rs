//! Terminal response shaping.
//!
//! # Responsibilities
//! - Render pipeline errors as plain-text or structured JSON bodies
//! - Serve the canned CORS preflight response
//! - Build redirects and the informational landing response
//!
//! # Design Decisions
//! - Every response, success or error, carries `access-control-allow-origin: *`

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::config::ErrorFormat;
use crate::proxy::error::ProxyError;

const ALLOW_METHODS: &str = "GET,POST,PUT,PATCH,TRACE,DELETE,HEAD,OPTIONS";
const PREFLIGHT_MAX_AGE: &str = "1728000";

fn with_cors(status: StatusCode, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

/// Plain response with the mandatory CORS header.
pub fn plain(status: StatusCode, body: impl Into<String>) -> Response<Body> {
    with_cors(status, Body::from(body.into()))
}

/// Canned CORS preflight answer; never reaches the network stage.
pub fn preflight() -> Response<Body> {
    let mut response = with_cors(StatusCode::NO_CONTENT, Body::empty());
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    response.headers_mut().insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE),
    );
    response
}

/// Informational response for an empty path form.
pub fn landing() -> Response<Body> {
    plain(
        StatusCode::OK,
        "gh-relay: append a complete GitHub release/archive/raw/blob/gist/tags/API URL to this origin to proxy it\n",
    )
}

/// 301 used to normalize the query form onto the canonical path form.
pub fn moved_permanently(location: &str) -> Response<Body> {
    redirect(StatusCode::MOVED_PERMANENTLY, location)
}

/// 302 used for mirror-mode redirects.
pub fn found(location: &str) -> Response<Body> {
    redirect(StatusCode::FOUND, location)
}

fn redirect(status: StatusCode, location: &str) -> Response<Body> {
    let mut response = with_cors(status, Body::empty());
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

/// Render a pipeline error as a terminal response.
pub fn error(error: &ProxyError, format: ErrorFormat) -> Response<Body> {
    match format {
        ErrorFormat::Text => plain(error.status(), error.to_string()),
        ErrorFormat::Json => {
            let body = serde_json::json!({
                "error": error.code(),
                "message": error.to_string(),
            });
            let mut response = with_cors(error.status(), Body::from(body.to_string()));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
    }
}
