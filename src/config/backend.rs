//! Logging backend activation seam.
//!
//! The synthesizer produces a configuration document; this module owns the
//! "apply configuration" and "capture warnings" entry points that install
//! it into the process. The default backend derives a tracing subscriber
//! from the document: an `EnvFilter` built from the configured levels plus
//! a formatting layer that renders the `%(field)s` templates after running
//! the generated context filters over each event.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::Document;
use crate::context::filter::{ContextFilter, LogRecord};
use crate::context::registry::LogContextRegistry;
use crate::error::Error;

/// Entry points of the process's logging backend.
pub trait LoggingBackend: Send + Sync {
    /// Install the merged configuration document.
    fn apply(&self, document: &Document, registry: &LogContextRegistry) -> Result<(), Error>;

    /// Route stray runtime diagnostics (panics) into the log stream.
    fn capture_warnings(&self, enabled: bool);
}

/// Default backend: installs a `tracing` subscriber derived from the
/// document. A global subscriber can only be installed once per process;
/// later activations keep the first one.
pub struct TracingBackend;

impl LoggingBackend for TracingBackend {
    fn apply(&self, document: &Document, registry: &LogContextRegistry) -> Result<(), Error> {
        let filter = env_filter_from(document);
        let layer = ContextFormatLayer::from_document(document, registry);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init();
        Ok(())
    }

    fn capture_warnings(&self, enabled: bool) {
        if enabled {
            std::panic::set_hook(Box::new(|info| {
                tracing::error!(target: "panic", "{info}");
            }));
        } else {
            let _ = std::panic::take_hook();
        }
    }
}

/// Backend that records `apply` calls instead of installing anything.
/// Intended for tests asserting activation side effects.
#[derive(Default)]
pub struct RecordingBackend {
    applied: Mutex<Vec<Document>>,
    warnings: Mutex<Option<bool>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn applied(&self) -> Vec<Document> {
        self.applied.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn warnings_captured(&self) -> Option<bool> {
        *self.warnings.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LoggingBackend for RecordingBackend {
    fn apply(&self, document: &Document, _registry: &LogContextRegistry) -> Result<(), Error> {
        self.applied
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(document.clone());
        Ok(())
    }

    fn capture_warnings(&self, enabled: bool) {
        *self.warnings.lock().unwrap_or_else(|e| e.into_inner()) = Some(enabled);
    }
}

/// Build an env filter from the document's root and per-logger levels.
fn env_filter_from(document: &Document) -> EnvFilter {
    let root = document
        .get("root")
        .and_then(|root| root.get("level"))
        .and_then(Value::as_str)
        .unwrap_or("INFO");

    let mut directives = vec![level_directive(root).to_string()];
    if let Some(loggers) = document.get("loggers").and_then(Value::as_object) {
        for (name, logger) in loggers {
            if let Some(level) = logger.get("level").and_then(Value::as_str) {
                directives.push(format!("{name}={}", level_directive(level)));
            }
        }
    }

    EnvFilter::try_new(directives.join(","))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Map document level names (`WARNING`, `CRITICAL`, ...) onto tracing
/// directive levels.
fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        _ => "info",
    }
}

/// Formatting layer rendering events through the synthesized templates.
pub struct ContextFormatLayer {
    standard: String,
    access: String,
    access_targets: Vec<String>,
    filters: Vec<ContextFilter>,
    sink: LineSink,
}

/// Where rendered lines go. Tests swap stdout for a shared buffer.
enum LineSink {
    Stdout,
    Buffer(Arc<Mutex<Vec<String>>>),
}

impl ContextFormatLayer {
    pub fn from_document(document: &Document, registry: &LogContextRegistry) -> Self {
        let template = |name: &str| {
            document
                .get("formatters")
                .and_then(|f| f.get(name))
                .and_then(|f| f.get("format"))
                .and_then(Value::as_str)
                .unwrap_or("[%(asctime)s][%(levelname)s][%(name)s]: %(message)s")
                .to_string()
        };

        Self {
            standard: template("standard"),
            access: template("access"),
            access_targets: access_targets_from(document),
            filters: registry
                .filter_factories()
                .into_iter()
                .map(|(_, factory)| factory())
                .collect(),
            sink: LineSink::Stdout,
        }
    }

    /// Capture rendered lines into `buffer` instead of writing to stdout.
    pub fn with_buffer(mut self, buffer: Arc<Mutex<Vec<String>>>) -> Self {
        self.sink = LineSink::Buffer(buffer);
        self
    }

    fn is_access(&self, target: &str) -> bool {
        self.access_targets
            .iter()
            .any(|logger| target == logger || target.starts_with(&format!("{logger}::")))
    }

    fn render(&self, event: &Event<'_>) -> String {
        let mut record = LogRecord::new();
        event.record(&mut FieldVisitor {
            record: &mut record,
        });

        // metadata fields override same-named event fields
        record.set(
            "asctime",
            chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S%.3f")
                .to_string(),
        );
        record.set("levelname", event.metadata().level().to_string());
        record.set("name", event.metadata().target());

        // provider tags win last
        for filter in &self.filters {
            filter.apply(&mut record);
        }

        let template = if self.is_access(event.metadata().target()) {
            &self.access
        } else {
            &self.standard
        };
        render_template(template, &record)
    }
}

impl<S: Subscriber> Layer<S> for ContextFormatLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let line = self.render(event);
        match &self.sink {
            LineSink::Stdout => {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out, "{line}");
            }
            LineSink::Buffer(buffer) => {
                buffer.lock().unwrap_or_else(|e| e.into_inner()).push(line);
            }
        }
    }
}

struct FieldVisitor<'a> {
    record: &'a mut LogRecord,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record.set(field.name(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record.set(field.name(), format!("{value:?}"));
    }
}

/// Loggers bound to a handler whose formatter is `access`.
fn access_targets_from(document: &Document) -> Vec<String> {
    let handlers = document.get("handlers").and_then(Value::as_object);
    let access_handlers: Vec<&str> = handlers
        .map(|handlers| {
            handlers
                .iter()
                .filter(|(_, handler)| {
                    handler.get("formatter").and_then(Value::as_str) == Some("access")
                })
                .map(|(name, _)| name.as_str())
                .collect()
        })
        .unwrap_or_default();

    let mut targets = Vec::new();
    if let Some(loggers) = document.get("loggers").and_then(Value::as_object) {
        for (name, logger) in loggers {
            let uses_access = logger
                .get("handlers")
                .and_then(Value::as_array)
                .map(|bound| {
                    bound
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|handler| access_handlers.contains(&handler))
                })
                .unwrap_or(false);
            if uses_access {
                targets.push(name.clone());
            }
        }
    }
    targets
}

/// Substitute `%(key)s` placeholders from the record; unknown keys render
/// as `-`.
fn render_template(template: &str, record: &LogRecord) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    while let Some(start) = rest.find("%(") {
        out.push_str(&rest[..start]);
        match rest[start..].find(")s") {
            Some(end) => {
                let key = &rest[start + 2..start + end];
                out.push_str(record.get(key).unwrap_or("-"));
                rest = &rest[start + end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
