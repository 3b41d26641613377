//! Request-scoped log context propagation and logging-config synthesis.
//!
//! Every log line and response emitted while handling one request is tagged
//! with a set of identifiers (correlation id, request id, trace id, user
//! id, timing) computed fresh per request. The logging configuration is
//! assembled dynamically from whichever providers are registered, merged
//! with operator overrides.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!  inbound request │  context middlewares (one per provider,          │
//!  ────────────────┼─▶ registry order: extract → bag + slot bind)     │
//!                  │        │                                         │
//!                  │        ▼                                         │
//!                  │  downstream handlers                             │
//!                  │   (log events auto-tagged by generated filters)  │
//!                  │        │                                         │
//!  response        │        ▼                                         │
//!  ◀───────────────┼── decorate headers, reset slots                  │
//!                  └──────────────────────────────────────────────────┘
//!
//!  startup: registry ─▶ synthesizer ─▶ baseline ⊕ file ⊕ extra
//!                                     ─▶ auto-filter pass ─▶ activate
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod http;

pub use config::{Document, LogConfigurator, LogSettings};
pub use context::{ContextProvider, LogContextRegistry};
pub use error::Error;
pub use http::{ContextBag, ContextLayer};
