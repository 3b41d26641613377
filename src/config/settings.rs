//! Settings view consumed by the synthesizer.
//!
//! The crate only consumes an already-parsed settings object; loading and
//! layering settings files is the host application's concern.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Logging subsystem settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    /// Level written into the generated baseline (handlers, loggers, root).
    pub log_level: String,

    /// Ordered provider names to register at startup. Order is meaningful:
    /// it becomes registry order and therefore format-tag and middleware
    /// installation order.
    pub log_contexts: Vec<String>,

    /// Path of the operator override document. A missing file is not an
    /// error; it simply contributes nothing.
    pub log_config_path: PathBuf,

    /// Non-default trace header name for the `trace_id` builtin.
    pub trace_header: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            log_contexts: vec![
                "correlation_id".to_string(),
                "request_id".to_string(),
                "trace_id".to_string(),
                "user_id".to_string(),
            ],
            log_config_path: PathBuf::from("logging.yaml"),
            trace_header: None,
        }
    }
}
