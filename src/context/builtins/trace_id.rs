//! Trace ID for distributed tracing, with a configurable header name.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};

use crate::context::builtins::header_or_token;
use crate::context::provider::ContextProvider;

pub const DEFAULT_TRACE_HEADER: &str = "X-Trace-Id";

pub struct TraceIdContext {
    header_name: String,
}

impl TraceIdContext {
    pub fn new() -> Self {
        Self::with_header(DEFAULT_TRACE_HEADER)
    }

    /// Use a non-default trace header (e.g. `X-B3-TraceId`). The same name
    /// is echoed back on the response.
    pub fn with_header(header_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
        }
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }
}

impl Default for TraceIdContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for TraceIdContext {
    fn name(&self) -> &str {
        "trace_id"
    }

    fn default_value(&self) -> &str {
        "-"
    }

    /// Configured header, or a fresh token.
    fn extract(&self, request: &Request<Body>) -> String {
        header_or_token(request, &self.header_name)
    }

    fn decorate_response(&self, headers: &mut HeaderMap, value: &str) {
        let name = match HeaderName::try_from(self.header_name.as_str()) {
            Ok(name) => name,
            Err(_) => return,
        };
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    }
}

pub(crate) fn provider() -> Arc<dyn ContextProvider> {
    Arc::new(TraceIdContext::new())
}
