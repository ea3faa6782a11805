//! Edge-style reverse proxy for GitHub surfaces.
//!
//! Clients request `<proxy-origin>/<target-url>`, where the target is a
//! complete URL naming a GitHub release, archive, raw, blob, gist, tags or
//! REST API resource. The proxy classifies the target, forwards the request
//! upstream, and rewrites redirects and restrictive headers so the response
//! stays usable from the proxy's own origin.
//!
//! ```text
//! inbound request
//!     → proxy::target    (recover the embedded target URL)
//!     → proxy::allowlist (substring admission)
//!     → proxy::classify  (ordered first-match-wins categorizer)
//!     → proxy::transform (outbound request / mirror redirect)
//!     → proxy::executor  (bounded redirect-chasing fetch)
//!     → proxy::rewrite   (CORS injection, header scrub)
//!     → response to caller
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::Pipeline;
