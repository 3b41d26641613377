//! User ID for identity tagging.
//!
//! Read from the request attribute bag (populated by an upstream auth
//! step), never from headers. Identity providers fall back to a fixed
//! default and never synthesize a random identity.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;

use crate::context::provider::ContextProvider;
use crate::http::ContextBag;

pub const DEFAULT_USER: &str = "anonymous";

pub struct UserIdContext {
    default: String,
}

impl UserIdContext {
    pub fn new() -> Self {
        Self::with_default(DEFAULT_USER)
    }

    pub fn with_default(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
        }
    }
}

impl Default for UserIdContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for UserIdContext {
    fn name(&self) -> &str {
        "user_id"
    }

    fn default_value(&self) -> &str {
        &self.default
    }

    /// `user_id` attribute set by an upstream step, or the fixed default.
    fn extract(&self, request: &Request<Body>) -> String {
        request
            .extensions()
            .get::<ContextBag>()
            .and_then(|bag| bag.get("user_id"))
            .unwrap_or(&self.default)
            .to_string()
    }
}

pub(crate) fn provider() -> Arc<dyn ContextProvider> {
    Arc::new(UserIdContext::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_reads_upstream_attribute() {
        let provider = UserIdContext::new();
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let mut bag = ContextBag::new();
        bag.set("user_id", "u-77");
        request.extensions_mut().insert(bag);
        assert_eq!(provider.extract(&request), "u-77");
    }

    #[test]
    fn test_extract_falls_back_to_fixed_default() {
        let provider = UserIdContext::new();
        let request = Request::builder()
            .uri("/")
            // identity is never read from headers
            .header("user_id", "spoofed")
            .body(Body::empty())
            .unwrap();
        assert_eq!(provider.extract(&request), DEFAULT_USER);
    }
}
