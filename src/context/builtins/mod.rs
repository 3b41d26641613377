//! Builtin context providers, resolvable by name without explicit
//! registration. The name → constructor table lives in
//! [`crate::context::registry`].

pub mod correlation_id;
pub mod request_id;
pub mod response_time;
pub mod trace_id;
pub mod user_id;

pub use correlation_id::CorrelationIdContext;
pub use request_id::RequestIdContext;
pub use response_time::ResponseTimeContext;
pub use trace_id::TraceIdContext;
pub use user_id::UserIdContext;

use axum::body::Body;
use axum::http::Request;
use uuid::Uuid;

/// Header value if present (lookup is case-insensitive), otherwise a fresh
/// globally-unique random token.
fn header_or_token(request: &Request<Body>, header: &str) -> String {
    request
        .headers()
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
