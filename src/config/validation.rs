//! Semantic validation of parsed configuration.
//!
//! Serde guarantees shape; this module checks the values make sense
//! together before the config is handed to the pipeline.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::RelayConfig;

/// A single failed semantic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field,
        message: message.into(),
    }
}

/// Run all semantic checks, collecting every failure.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err(
            "listener.bind_address",
            "must be a socket address like 0.0.0.0:8080",
        ));
    }

    let prefix = &config.proxy.prefix;
    if !prefix.starts_with('/') || !prefix.ends_with('/') {
        errors.push(err("proxy.prefix", "must start and end with '/'"));
    }

    if config.proxy.max_redirect_hops == 0 {
        errors.push(err("proxy.max_redirect_hops", "must be at least 1"));
    }

    match Url::parse(&config.proxy.api_host) {
        Ok(api) if api.scheme() == "http" || api.scheme() == "https" => {}
        _ => errors.push(err(
            "proxy.api_host",
            "must be an absolute http(s) URL",
        )),
    }

    if Url::parse(&config.proxy.mirror_host).is_err() {
        errors.push(err("proxy.mirror_host", "must be an absolute URL"));
    } else if config.proxy.mirror_host.ends_with('/') {
        errors.push(err("proxy.mirror_host", "must not end with '/'"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(err(
            "observability.metrics_address",
            "must be a socket address like 0.0.0.0:9090",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
