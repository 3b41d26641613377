//! Correlation ID for tracking related requests across services.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request};

use crate::context::builtins::header_or_token;
use crate::context::provider::ContextProvider;

pub struct CorrelationIdContext;

impl CorrelationIdContext {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CorrelationIdContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for CorrelationIdContext {
    fn name(&self) -> &str {
        "correlation_id"
    }

    fn default_value(&self) -> &str {
        "-"
    }

    /// `x-correlation-id` header, or a fresh token.
    fn extract(&self, request: &Request<Body>) -> String {
        header_or_token(request, "x-correlation-id")
    }

    fn decorate_response(&self, headers: &mut HeaderMap, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert("x-correlation-id", value);
        }
    }
}

pub(crate) fn provider() -> Arc<dyn ContextProvider> {
    Arc::new(CorrelationIdContext::new())
}
