//! Response time in whole milliseconds.
//!
//! Unlike the identifier providers there is nothing to extract from the
//! inbound request; the generated middleware re-binds the measured duration
//! once downstream handling completes and emits the access-log event while
//! the measured value is live, before the end-of-request reset. When this
//! provider is registered the access format additionally carries a
//! `response_time_ms` tag.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;

use crate::context::provider::ContextProvider;

pub struct ResponseTimeContext;

impl ResponseTimeContext {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResponseTimeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for ResponseTimeContext {
    fn name(&self) -> &str {
        "response_time"
    }

    fn default_value(&self) -> &str {
        "-"
    }

    /// Nothing is known at extraction time.
    fn extract(&self, _request: &Request<Body>) -> String {
        self.default_value().to_string()
    }

    fn observe_elapsed(&self, elapsed: Duration) -> Option<String> {
        Some(elapsed.as_millis().to_string())
    }
}

pub(crate) fn provider() -> Arc<dyn ContextProvider> {
    Arc::new(ResponseTimeContext::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_yields_default() {
        let provider = ResponseTimeContext::new();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(provider.extract(&request), "-");
    }

    #[test]
    fn test_observe_elapsed_reports_whole_millis() {
        let provider = ResponseTimeContext::new();
        let measured = provider.observe_elapsed(Duration::from_micros(2_500));
        assert_eq!(measured.as_deref(), Some("2"));
    }
}
