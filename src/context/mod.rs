//! Request-scoped context: providers, task-local slots, generated filters
//! and the provider registry.

pub mod builtins;
pub mod filter;
pub mod provider;
pub mod registry;
pub mod slot;

pub use filter::{ContextFilter, LogRecord};
pub use provider::ContextProvider;
pub use registry::LogContextRegistry;
pub use slot::ContextSlot;
