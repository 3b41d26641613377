//! Central registry of context providers.
//!
//! The registry is built during a single-threaded startup phase and treated
//! as read-only afterward (shared behind `Arc`). Iteration order is
//! registration order and is significant: it drives the generated format
//! strings and, by contract, middleware installation order.

use std::sync::Arc;

use crate::context::builtins;
use crate::context::filter::ContextFilter;
use crate::context::provider::ContextProvider;
use crate::error::Error;
use crate::http::middleware::ContextLayer;

type ProviderCtor = fn() -> Arc<dyn ContextProvider>;

/// Fixed builtin namespace: name → constructor. Resolving a builtin is a
/// table lookup, not a runtime module scan.
static BUILTINS: &[(&str, ProviderCtor)] = &[
    ("correlation_id", builtins::correlation_id::provider),
    ("request_id", builtins::request_id::provider),
    ("trace_id", builtins::trace_id::provider),
    ("user_id", builtins::user_id::provider),
    ("response_time", builtins::response_time::provider),
];

/// Factory producing one filter instance; each factory closes over its own
/// provider.
pub type FilterFactory = Box<dyn Fn() -> ContextFilter + Send + Sync>;

/// Ordered catalog of context providers.
#[derive(Default)]
pub struct LogContextRegistry {
    contexts: Vec<(String, Arc<dyn ContextProvider>)>,
}

impl LogContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Re-registration replaces in place, keeping the
    /// name's original position in the iteration order.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn ContextProvider>) {
        let name = name.into();
        match self.contexts.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = provider,
            None => self.contexts.push((name, provider)),
        }
    }

    /// Resolve a provider from the builtin table and register it.
    ///
    /// Exactly one eligible constructor is the only success path: zero
    /// matches fail with [`Error::BuiltinNotFound`], more than one with
    /// [`Error::BuiltinAmbiguous`].
    pub fn register_builtin(&mut self, name: &str) -> Result<(), Error> {
        self.register_builtin_from(BUILTINS, name)
    }

    fn register_builtin_from(
        &mut self,
        table: &[(&str, ProviderCtor)],
        name: &str,
    ) -> Result<(), Error> {
        let mut matches = table.iter().filter(|(n, _)| *n == name);
        let ctor = match matches.next() {
            Some((_, ctor)) => ctor,
            None => return Err(Error::BuiltinNotFound(name.to_string())),
        };
        if matches.next().is_some() {
            return Err(Error::BuiltinAmbiguous(name.to_string()));
        }
        self.register(name, ctor());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ContextProvider>> {
        self.contexts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contexts.iter().any(|(n, _)| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Providers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ContextProvider>)> {
        self.contexts.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.contexts.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// One generated filter per provider, registration order.
    pub fn all_filters(&self) -> Vec<(String, ContextFilter)> {
        self.contexts
            .iter()
            .map(|(name, provider)| (name.clone(), ContextFilter::new(provider.clone())))
            .collect()
    }

    /// One filter factory per provider, keyed `"{name}_filter"`. Each
    /// factory captures its own provider, never a shared iteration
    /// variable, so instantiation after the loop still yields per-provider
    /// filters.
    pub fn filter_factories(&self) -> Vec<(String, FilterFactory)> {
        self.contexts
            .iter()
            .map(|(name, provider)| {
                let provider = provider.clone();
                let factory: FilterFactory = Box::new(move || ContextFilter::new(provider.clone()));
                (format!("{name}_filter"), factory)
            })
            .collect()
    }

    /// One generated middleware per provider, registration order.
    ///
    /// Ordering contract: callers install these in the order returned.
    /// The first-installed layer is outermost on the inbound path and
    /// innermost on the outbound path. Providers are not guaranteed
    /// independent by the registry itself, so installation order is part
    /// of the interface, not an implementation detail.
    pub fn all_middlewares(&self) -> Vec<(String, ContextLayer)> {
        self.contexts
            .iter()
            .map(|(name, provider)| (name.clone(), ContextLayer::new(provider.clone())))
            .collect()
    }
}
