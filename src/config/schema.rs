//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Proxying policy: prefix, mirror mode, allow-list, redirect budget.
    pub proxy: ProxyOptions,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Proxying policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyOptions {
    /// Path prefix the target URL follows (e.g. "/" or "/gh/").
    /// Must start and end with a slash.
    pub prefix: String,

    /// Redirect blob/raw targets to a CDN mirror instead of proxying bytes.
    pub mirror: bool,

    /// Base URL of the CDN mirror used when `mirror` is on. No trailing slash.
    pub mirror_host: String,

    /// Substring allow-list. Empty means every target is admitted.
    pub allow_list: Vec<String>,

    /// Identity sent to the REST API when the caller supplied none.
    /// The API rejects default automation identities.
    pub api_user_agent: String,

    /// Canonical REST API origin. Redirects confined to this host are
    /// followed transparently during API calls.
    pub api_host: String,

    /// Upper bound on transparently followed redirect hops.
    pub max_redirect_hops: u32,

    /// Shape of error response bodies.
    pub error_format: ErrorFormat,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            prefix: "/".to_string(),
            mirror: false,
            mirror_host: "https://cdn.jsdelivr.net/gh".to_string(),
            allow_list: Vec::new(),
            api_user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string(),
            api_host: "https://api.github.com/".to_string(),
            max_redirect_hops: 5,
            error_format: ErrorFormat::Text,
        }
    }
}

/// Error response body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorFormat {
    /// Short plain-text bodies.
    #[default]
    Text,
    /// Structured `{ "error", "message" }` JSON bodies.
    Json,
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Per-hop time budget for receiving upstream response headers, in
    /// seconds. Body streaming is not bounded.
    pub upstream_header_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_header_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
