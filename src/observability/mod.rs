//! Cross-cutting observability: structured logs live with the code that
//! emits them; this module owns the metrics exporter.

pub mod metrics;
