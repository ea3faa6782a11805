//! HTTP surface of the relay.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum catch-all routes, middleware layers)
//!     → request.rs (request ID injection)
//!     → proxy::Pipeline (classification, fetch, rewrite)
//!     → response.rs (terminal/error/preflight response shaping)
//!     → client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
