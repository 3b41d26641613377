//! Generated log-record filters.
//!
//! One filter is generated per registered provider. A filter stamps the
//! provider's current value onto an emitted record and never suppresses it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::context::provider::ContextProvider;

/// A log record as seen by the context filters: an ordered bag of named
/// string fields, consumed by the activation layer when rendering the
/// configured format templates.
#[derive(Debug, Default, Clone)]
pub struct LogRecord {
    fields: BTreeMap<String, String>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Filter stamping one provider's current value onto log records.
#[derive(Clone)]
pub struct ContextFilter {
    provider: Arc<dyn ContextProvider>,
}

impl ContextFilter {
    pub fn new(provider: Arc<dyn ContextProvider>) -> Self {
        Self { provider }
    }

    /// Field name this filter writes.
    pub fn field(&self) -> &str {
        self.provider.name()
    }

    /// Set `record[name] = provider.current()`. Always returns true; the
    /// filter annotates, it never drops a record. Safe with no active
    /// request scope (stamps the provider default).
    pub fn apply(&self, record: &mut LogRecord) -> bool {
        record.set(self.provider.name(), self.provider.current());
        true
    }
}
