//! HTTP-facing side of the context subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → middleware.rs (one generated layer per provider, registry order)
//!         extract value → ContextBag + task-local slot
//!     → downstream handlers (log events auto-tagged by the filters)
//!     → middleware.rs (decorate response headers, reset slots)
//! outbound response
//! ```

pub mod middleware;

use std::collections::HashMap;

pub use middleware::{ContextLayer, ContextService};

/// Mutable per-request attribute bag, carried in the request extensions.
///
/// Each context middleware records its extracted value here so downstream
/// code with access to the request can read it without touching task-local
/// storage. Upstream steps (e.g. auth middleware) may also pre-populate
/// entries such as `user_id` for identity providers to pick up.
#[derive(Debug, Clone, Default)]
pub struct ContextBag {
    values: HashMap<String, String>,
}

impl ContextBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
