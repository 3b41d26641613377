//! Request ID for tracking a single request.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request};

use crate::context::builtins::header_or_token;
use crate::context::provider::ContextProvider;

pub struct RequestIdContext;

impl RequestIdContext {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RequestIdContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for RequestIdContext {
    fn name(&self) -> &str {
        "request_id"
    }

    fn default_value(&self) -> &str {
        "-"
    }

    /// `x-request-id` header, or a fresh token.
    fn extract(&self, request: &Request<Body>) -> String {
        header_or_token(request, "x-request-id")
    }

    fn decorate_response(&self, headers: &mut HeaderMap, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert("x-request-id", value);
        }
    }
}

pub(crate) fn provider() -> Arc<dyn ContextProvider> {
    Arc::new(RequestIdContext::new())
}
