//! Logging configuration synthesizer.
//!
//! Builds a baseline document from the registry contents, deep-merges it
//! with the operator override file and a programmatic extra layer,
//! normalizes per-handler filter lists, and optionally activates the result
//! on the logging backend.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::config::backend::{LoggingBackend, TracingBackend};
use crate::config::merge::deep_merge;
use crate::config::settings::LogSettings;
use crate::config::Document;
use crate::context::builtins::TraceIdContext;
use crate::context::registry::LogContextRegistry;
use crate::error::Error;
use crate::http::middleware::ContextLayer;

/// Which format template to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Standard,
    Access,
}

/// Synthesizes and activates the logging configuration.
///
/// Constructed once at bootstrap and passed by reference to consumers;
/// tests build their own instance (optionally with a recording backend)
/// instead of mutating process-wide state.
pub struct LogConfigurator {
    settings: LogSettings,
    registry: Arc<LogContextRegistry>,
    backend: Arc<dyn LoggingBackend>,
}

impl std::fmt::Debug for LogConfigurator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogConfigurator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl LogConfigurator {
    pub fn new(settings: LogSettings, registry: Arc<LogContextRegistry>) -> Self {
        Self {
            settings,
            registry,
            backend: Arc::new(TracingBackend),
        }
    }

    /// Build the registry from `settings.log_contexts` (builtin lookup,
    /// fatal on the first failure) and wrap it into a configurator.
    pub fn bootstrap(settings: LogSettings) -> Result<Self, Error> {
        let mut registry = LogContextRegistry::new();
        for name in &settings.log_contexts {
            if name == "trace_id" {
                if let Some(header) = &settings.trace_header {
                    registry.register(
                        name.clone(),
                        Arc::new(TraceIdContext::with_header(header.clone())),
                    );
                    continue;
                }
            }
            registry.register_builtin(name)?;
        }
        Ok(Self::new(settings, Arc::new(registry)))
    }

    /// Swap the activation backend (used by tests to observe `apply`).
    pub fn with_backend(mut self, backend: Arc<dyn LoggingBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn registry(&self) -> &Arc<LogContextRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    /// Generated middlewares, registration order. See
    /// [`LogContextRegistry::all_middlewares`] for the ordering contract.
    pub fn all_middlewares(&self) -> Vec<(String, ContextLayer)> {
        self.registry.all_middlewares()
    }

    /// Baseline document generated from the current registry contents.
    pub fn baseline(&self) -> Document {
        let level = self.settings.log_level.as_str();

        let mut filters = Map::new();
        for (name, _provider) in self.registry.iter() {
            filters.insert(format!("{name}_filter"), json!({ "provider": name }));
        }

        json!({
            "version": 1,
            "disable_existing_loggers": false,
            "formatters": {
                "standard": { "format": self.build_format(FormatKind::Standard) },
                "access": { "format": self.build_format(FormatKind::Access) },
            },
            "filters": filters,
            "handlers": {
                "console": {
                    "class": "console",
                    "formatter": "standard",
                    "level": level,
                },
                "access_console": {
                    "class": "console",
                    "formatter": "access",
                    "level": level,
                },
            },
            "loggers": {
                "hyper": {
                    "level": level,
                    "handlers": ["console"],
                    "propagate": false,
                },
                "tower_http": {
                    "level": level,
                    "handlers": ["console"],
                    "propagate": false,
                },
                "tower_http::trace": {
                    "level": level,
                    "handlers": ["access_console"],
                    "propagate": false,
                },
            },
            "root": { "level": level, "handlers": ["console"] },
        })
    }

    /// Build the standard or access format template with all registered
    /// providers, in registry order. Placeholders use the backend's
    /// `%(field)s` vocabulary.
    pub fn build_format(&self, kind: FormatKind) -> String {
        let mut format = String::from("[%(asctime)s][%(levelname)s]");
        if kind == FormatKind::Access {
            format.push_str("[ACCESS]");
        }

        for (name, _provider) in self.registry.iter() {
            format.push_str(&format!("[{name}: %({name})s]"));
        }

        if kind == FormatKind::Access && self.registry.contains("response_time") {
            format.push_str("[response_time_ms: %(response_time_ms)s]");
        }

        format.push_str("[%(name)s]: %(message)s");
        format
    }

    /// Compute the merged, filter-attached configuration document.
    ///
    /// Merge order: baseline ⊕ override file ⊕ `extra`, each layer strictly
    /// overriding the previous on conflicting leaves. With `apply` the
    /// result is installed on the logging backend and runtime-warning
    /// capture is enabled; without it the call has zero side effects.
    pub fn configure(&self, extra: Option<&Document>, apply: bool) -> Result<Document, Error> {
        let custom = self.load_custom_config_file()?;
        let mut merged = deep_merge(&self.baseline(), &custom);

        if let Some(extra) = extra {
            merged = deep_merge(&merged, extra);
        }

        let merged = self.auto_apply_filters(merged);

        if apply {
            self.backend.apply(&merged, &self.registry)?;
            self.backend.capture_warnings(true);
        }

        Ok(merged)
    }

    /// Load the operator override document from `settings.log_config_path`.
    ///
    /// A missing file yields an empty document. A file that parses to a
    /// non-empty, non-mapping value fails with [`Error::ConfigFileInvalid`]
    /// naming the path; an empty or blank file yields an empty mapping.
    fn load_custom_config_file(&self) -> Result<Document, Error> {
        let path = &self.settings.log_config_path;
        let abs: PathBuf = if path.is_absolute() {
            path.clone()
        } else {
            std::env::current_dir()?.join(path)
        };

        if !abs.exists() {
            return Ok(json!({}));
        }

        let display = abs.display().to_string();
        let raw = fs::read_to_string(&abs)?;
        let parsed: serde_yaml::Value = serde_yaml::from_str(&raw)
            .map_err(|_| Error::ConfigFileInvalid(display.clone()))?;

        match parsed {
            serde_yaml::Value::Null => Ok(json!({})),
            serde_yaml::Value::Mapping(_) => {
                serde_json::to_value(parsed).map_err(|_| Error::ConfigFileInvalid(display))
            }
            _ => Err(Error::ConfigFileInvalid(display)),
        }
    }

    /// Attach the registered filters to every handler that does not opt
    /// out, run once on the merged document before activation.
    ///
    /// Handlers opt out with `auto_filters: false` (list left exactly as
    /// merged) or exclude individual names with `exclude_filters`. Already
    /// declared filters keep their order; new ones are appended sorted
    /// ascending. A handler that declared no filters and gains no
    /// candidates keeps no `filters` key at all.
    fn auto_apply_filters(&self, mut config: Document) -> Document {
        let filter_names: BTreeSet<String> = match config.get("filters").and_then(Value::as_object)
        {
            Some(filters) => filters.keys().cloned().collect(),
            None => return config,
        };
        let handlers = match config.get_mut("handlers").and_then(Value::as_object_mut) {
            Some(handlers) => handlers,
            None => return config,
        };

        for (_, handler) in handlers.iter_mut() {
            let handler = match handler.as_object_mut() {
                Some(handler) => handler,
                None => continue,
            };

            let auto_filters = handler
                .remove("auto_filters")
                .and_then(|v| v.as_bool())
                .unwrap_or(true);
            if !auto_filters {
                continue;
            }

            let excluded: BTreeSet<String> = handler
                .remove("exclude_filters")
                .and_then(|v| {
                    v.as_array().map(|list| {
                        list.iter()
                            .filter_map(|name| name.as_str().map(str::to_owned))
                            .collect()
                    })
                })
                .unwrap_or_default();

            let existing: Vec<String> = match handler.get("filters") {
                Some(Value::Array(list)) => list
                    .iter()
                    .filter_map(|name| name.as_str().map(str::to_owned))
                    .collect(),
                Some(_) => {
                    handler.insert("filters".to_string(), json!([]));
                    Vec::new()
                }
                None => Vec::new(),
            };
            let declared: BTreeSet<&String> = existing.iter().collect();

            // BTreeSet iteration keeps the additions sorted ascending.
            let additions: Vec<&String> = filter_names
                .iter()
                .filter(|name| !excluded.contains(*name) && !declared.contains(name))
                .collect();

            if !additions.is_empty() || !existing.is_empty() {
                let final_list: Vec<Value> = existing
                    .iter()
                    .map(|name| Value::String(name.clone()))
                    .chain(additions.iter().map(|name| Value::String((*name).clone())))
                    .collect();
                handler.insert("filters".to_string(), Value::Array(final_list));
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::provider::ContextProvider;
    use axum::body::Body;
    use axum::http::Request;

    struct Named(&'static str);

    impl ContextProvider for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn default_value(&self) -> &str {
            "-"
        }
        fn extract(&self, _request: &Request<Body>) -> String {
            "-".into()
        }
    }

    fn configurator_with(names: &[&'static str]) -> LogConfigurator {
        let mut registry = LogContextRegistry::new();
        for name in names {
            registry.register(*name, Arc::new(Named(name)));
        }
        LogConfigurator::new(LogSettings::default(), Arc::new(registry))
    }

    fn temp_settings(file_name: &str) -> LogSettings {
        LogSettings {
            log_config_path: std::env::temp_dir().join(file_name),
            ..LogSettings::default()
        }
    }

    #[test]
    fn test_access_format_carries_response_time_tag_only_when_registered() {
        let cfg = configurator_with(&["request_id", "response_time"]);
        let access = cfg.build_format(FormatKind::Access);
        assert!(access.contains("[ACCESS]"));
        assert!(access.contains("[request_id: %(request_id)s]"));
        assert!(access.contains("[response_time_ms: %(response_time_ms)s]"));

        let cfg = configurator_with(&["request_id"]);
        let access = cfg.build_format(FormatKind::Access);
        assert!(!access.contains("response_time_ms"));
    }

    #[test]
    fn test_standard_format_lists_providers_in_registry_order() {
        let cfg = configurator_with(&["correlation_id", "request_id"]);
        let standard = cfg.build_format(FormatKind::Standard);
        assert_eq!(
            standard,
            "[%(asctime)s][%(levelname)s][correlation_id: %(correlation_id)s]\
             [request_id: %(request_id)s][%(name)s]: %(message)s"
        );
    }

    #[test]
    fn test_baseline_structure() {
        let cfg = configurator_with(&["request_id"]);
        let base = cfg.baseline();
        assert_eq!(base["version"], 1);
        assert_eq!(base["disable_existing_loggers"], false);
        assert!(base["filters"]["request_id_filter"].is_object());
        assert_eq!(base["handlers"]["console"]["formatter"], "standard");
        assert_eq!(base["handlers"]["access_console"]["formatter"], "access");
        assert_eq!(base["root"]["handlers"], json!(["console"]));
        // no filters pre-attached; attachment happens in the auto pass
        assert!(base["handlers"]["console"].get("filters").is_none());
    }

    #[test]
    fn test_auto_filters_exclude_list() {
        let cfg = configurator_with(&["x"]);
        let doc = json!({
            "filters": {"a": {}, "b": {}, "c": {}},
            "handlers": {
                "h1": {"class": "console", "exclude_filters": ["b"]},
            },
        });
        let result = cfg.auto_apply_filters(doc);
        assert_eq!(result["handlers"]["h1"]["filters"], json!(["a", "c"]));
        assert!(result["handlers"]["h1"].get("exclude_filters").is_none());
    }

    #[test]
    fn test_auto_filters_keeps_declared_order_appends_sorted() {
        let cfg = configurator_with(&["x"]);
        let doc = json!({
            "filters": {"a": {}, "b": {}, "c": {}},
            "handlers": {
                "h2": {"class": "console", "filters": ["a"]},
            },
        });
        let result = cfg.auto_apply_filters(doc);
        assert_eq!(result["handlers"]["h2"]["filters"], json!(["a", "b", "c"]));
    }

    #[test]
    fn test_auto_filters_opt_out_leaves_handler_untouched() {
        let cfg = configurator_with(&["x"]);
        let doc = json!({
            "filters": {"a": {}},
            "handlers": {
                "h3": {"class": "console", "auto_filters": false},
            },
        });
        let result = cfg.auto_apply_filters(doc);
        assert!(result["handlers"]["h3"].get("filters").is_none());
        assert!(result["handlers"]["h3"].get("auto_filters").is_none());
    }

    #[test]
    fn test_auto_filters_noop_without_filters_or_handlers() {
        let cfg = configurator_with(&["x"]);
        let doc = json!({"handlers": {"h": {"class": "console"}}});
        assert_eq!(cfg.auto_apply_filters(doc.clone()), doc);

        let doc = json!({"filters": {"a": {}}});
        assert_eq!(cfg.auto_apply_filters(doc.clone()), doc);
    }

    #[test]
    fn test_auto_filters_non_list_filters_treated_as_empty() {
        let cfg = configurator_with(&["x"]);
        let doc = json!({
            "filters": {"a": {}},
            "handlers": {
                "h": {"class": "console", "filters": "oops"},
            },
        });
        let result = cfg.auto_apply_filters(doc);
        assert_eq!(result["handlers"]["h"]["filters"], json!(["a"]));
    }

    #[test]
    fn test_configure_is_idempotent_without_apply() {
        let cfg = configurator_with(&["correlation_id", "request_id"]);
        let first = cfg.configure(None, false).unwrap();
        let second = cfg.configure(None, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_configure_attaches_generated_filters_to_baseline_handlers() {
        let cfg = configurator_with(&["request_id", "correlation_id"]);
        let doc = cfg.configure(None, false).unwrap();
        // sorted ascending regardless of registration order
        assert_eq!(
            doc["handlers"]["console"]["filters"],
            json!(["correlation_id_filter", "request_id_filter"])
        );
    }

    #[test]
    fn test_configure_extra_layer_wins() {
        let cfg = configurator_with(&["request_id"]);
        let extra = json!({"root": {"level": "DEBUG"}});
        let doc = cfg.configure(Some(&extra), false).unwrap();
        assert_eq!(doc["root"]["level"], "DEBUG");
        assert_eq!(doc["root"]["handlers"], json!(["console"]));
    }

    #[test]
    fn test_missing_override_file_is_empty_layer() {
        let settings = temp_settings("log-context-test-definitely-missing.yaml");
        let registry = Arc::new(LogContextRegistry::new());
        let cfg = LogConfigurator::new(settings, registry);
        assert_eq!(cfg.load_custom_config_file().unwrap(), json!({}));
    }

    #[test]
    fn test_blank_override_file_is_empty_mapping() {
        let settings = temp_settings("log-context-test-blank.yaml");
        std::fs::write(&settings.log_config_path, "\n").unwrap();
        let cfg = LogConfigurator::new(settings.clone(), Arc::new(LogContextRegistry::new()));
        assert_eq!(cfg.load_custom_config_file().unwrap(), json!({}));
        std::fs::remove_file(&settings.log_config_path).unwrap();
    }

    #[test]
    fn test_non_mapping_override_file_is_invalid() {
        let settings = temp_settings("log-context-test-scalar.yaml");
        std::fs::write(&settings.log_config_path, "- just\n- a\n- list\n").unwrap();
        let cfg = LogConfigurator::new(settings.clone(), Arc::new(LogContextRegistry::new()));
        let err = cfg.load_custom_config_file().unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::ConfigFileInvalid(_)));
        assert!(message.contains("log-context-test-scalar.yaml"));
        std::fs::remove_file(&settings.log_config_path).unwrap();
    }

    #[test]
    fn test_override_file_layer_beats_baseline() {
        let settings = temp_settings("log-context-test-override.yaml");
        std::fs::write(
            &settings.log_config_path,
            "root:\n  level: WARNING\nhandlers:\n  console:\n    level: WARNING\n",
        )
        .unwrap();
        let cfg = configurator_with(&["request_id"]);
        let cfg = LogConfigurator::new(settings.clone(), cfg.registry.clone());
        let doc = cfg.configure(None, false).unwrap();
        assert_eq!(doc["root"]["level"], "WARNING");
        assert_eq!(doc["handlers"]["console"]["level"], "WARNING");
        // untouched baseline leaves survive
        assert_eq!(doc["handlers"]["console"]["formatter"], "standard");
        std::fs::remove_file(&settings.log_config_path).unwrap();
    }

    #[test]
    fn test_bootstrap_registers_builtins_in_settings_order() {
        let cfg = LogConfigurator::bootstrap(LogSettings::default()).unwrap();
        assert_eq!(
            cfg.registry().names(),
            vec!["correlation_id", "request_id", "trace_id", "user_id"]
        );
    }

    #[test]
    fn test_bootstrap_fails_fast_on_unknown_builtin() {
        let settings = LogSettings {
            log_contexts: vec!["request_id".to_string(), "nope".to_string()],
            ..LogSettings::default()
        };
        let err = LogConfigurator::bootstrap(settings).unwrap_err();
        assert!(matches!(err, Error::BuiltinNotFound(name) if name == "nope"));
    }

    #[test]
    fn test_bootstrap_honors_trace_header_override() {
        let settings = LogSettings {
            log_contexts: vec!["trace_id".to_string()],
            trace_header: Some("X-B3-TraceId".to_string()),
            ..LogSettings::default()
        };
        let cfg = LogConfigurator::bootstrap(settings).unwrap();
        let provider = cfg.registry().get("trace_id").unwrap();
        let request = Request::builder()
            .uri("/")
            .header("x-b3-traceid", "t-1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(provider.extract(&request), "t-1");
    }
}
