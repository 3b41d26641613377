//! Logging configuration subsystem.
//!
//! # Data Flow
//! ```text
//! registry contents
//!     → synthesizer.rs (baseline document: formatters, filters, handlers)
//!     ⊕ override file (YAML, merge.rs)
//!     ⊕ programmatic extra (merge.rs)
//!     → synthesizer.rs (auto-filter attachment pass)
//!     → backend.rs (optional activation: tracing subscriber + warning capture)
//! ```
//!
//! # Design Decisions
//! - The document is plain data (`serde_json::Value`); filter instances are
//!   resolved from the registry at activation, never serialized
//! - Later merge layers strictly win; lists are replaced, never concatenated
//! - `configure` without `apply` has zero side effects on the backend

pub mod backend;
pub mod merge;
pub mod settings;
pub mod synthesizer;

/// Synthesized logging configuration document.
pub type Document = serde_json::Value;

pub use backend::{ContextFormatLayer, LoggingBackend, RecordingBackend, TracingBackend};
pub use merge::deep_merge;
pub use settings::LogSettings;
pub use synthesizer::{FormatKind, LogConfigurator};
