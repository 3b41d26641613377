//! Context provider trait.
//!
//! A provider is a named rule for extracting (or defaulting) one piece of
//! per-request metadata. Providers are immutable after construction and are
//! shared behind `Arc` between the registry, the generated middlewares and
//! the generated log filters.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request};

use crate::context::slot::ContextSlot;

/// One source of per-request contextual metadata.
///
/// Extraction must not fail: absence of data is a valid input. Identifier
/// providers (correlation, request, trace) synthesize a fresh random token
/// when nothing matches; identity providers (user) fall back to a fixed
/// default string and never invent a random identity.
pub trait ContextProvider: Send + Sync {
    /// Unique provider name; doubles as the log-record field name.
    fn name(&self) -> &str;

    /// Value reported whenever the slot is unbound.
    fn default_value(&self) -> &str;

    /// Pull the value out of the inbound request. Infallible by contract.
    fn extract(&self, request: &Request<Body>) -> String;

    /// Optionally stamp the value onto the outbound response. Default no-op.
    fn decorate_response(&self, _headers: &mut HeaderMap, _value: &str) {}

    /// Optionally produce an updated value once downstream handling took
    /// `elapsed` time. Used by timing providers; `None` keeps the bound
    /// value as is.
    fn observe_elapsed(&self, _elapsed: Duration) -> Option<String> {
        None
    }

    /// Handle to this provider's task-scoped cell.
    fn slot(&self) -> ContextSlot {
        ContextSlot::new(self.name(), self.default_value())
    }

    /// The value bound in the current task, or the default outside any
    /// request scope.
    fn current(&self) -> String {
        self.slot().current()
    }
}
