//! Error taxonomy for startup-time discovery and configuration.
//!
//! All variants are raised synchronously during startup and are fatal: a
//! failed builtin lookup or override-file load never degrades to a partial
//! registry or a silent baseline-only configuration. Per-request extraction
//! never produces an error; absence of data is handled by each provider's
//! default/synthesis policy.

use thiserror::Error;

/// Errors produced while building the context registry or synthesizing the
/// logging configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// No builtin provider exists under the requested name.
    #[error("builtin log context '{0}' not found")]
    BuiltinNotFound(String),

    /// The requested name resolves to more than one eligible provider.
    #[error("builtin log context '{0}' resolves to more than one provider")]
    BuiltinAmbiguous(String),

    /// The override file exists but does not parse to a mapping.
    #[error("file '{0}' is not a valid logging config")]
    ConfigFileInvalid(String),

    /// The override file could not be read.
    #[error("failed to read logging config: {0}")]
    Io(#[from] std::io::Error),
}
