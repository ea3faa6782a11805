//! Allow-list admission gate.
//!
//! Runs before classification so disallowed targets never reach upstream
//! regardless of category. An empty list admits everything; otherwise the
//! target must contain at least one configured substring (unanchored).

use crate::proxy::error::ProxyError;

/// Check the target against the configured allow-list.
pub fn check(target: &str, allow_list: &[String]) -> Result<(), ProxyError> {
    if allow_list.is_empty() {
        return Ok(());
    }
    if allow_list.iter().any(|needle| target.contains(needle.as_str())) {
        return Ok(());
    }
    tracing::warn!(url = %target, "target rejected by allow list");
    Err(ProxyError::AccessDenied)
}
