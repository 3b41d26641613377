//! Task-scoped storage for per-request context values.
//!
//! All providers of one request task share a single task-local map of
//! provider name → value. The outermost context middleware establishes the
//! scope; nested middlewares and any work awaited within the task see the
//! same map. Sibling tasks each get their own map, so two requests in
//! flight on the same worker never observe each other's values. When a
//! request task is cancelled the scope is dropped with it, so no stale
//! value survives into unrelated work.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;

tokio::task_local! {
    static REQUEST_CONTEXT: RefCell<HashMap<String, String>>;
}

/// Whether the current task already carries a context scope.
pub fn in_scope() -> bool {
    REQUEST_CONTEXT.try_with(|_| ()).is_ok()
}

/// Run `fut` inside a fresh context scope for the current task.
pub async fn scope<F: Future>(fut: F) -> F::Output {
    REQUEST_CONTEXT.scope(RefCell::new(HashMap::new()), fut).await
}

/// Handle to one provider's task-scoped cell.
///
/// The slot is always resolvable: outside any bound scope `current` yields
/// the provider's default rather than failing.
#[derive(Debug, Clone)]
pub struct ContextSlot {
    name: String,
    default: String,
}

impl ContextSlot {
    pub fn new(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
        }
    }

    /// Store a value for the current task. Outside a scope this is a no-op;
    /// there is no request task to scope the value to.
    pub fn bind(&self, value: impl Into<String>) {
        let value = value.into();
        let _ = REQUEST_CONTEXT.try_with(|map| {
            map.borrow_mut().insert(self.name.clone(), value);
        });
    }

    /// The bound value, or the provider default if unbound.
    pub fn current(&self) -> String {
        REQUEST_CONTEXT
            .try_with(|map| map.borrow().get(&self.name).cloned())
            .ok()
            .flatten()
            .unwrap_or_else(|| self.default.clone())
    }

    /// Rebind the default value. Mandatory end-of-request step even though
    /// the scope itself dies with the task: sequential work sharing one
    /// scope must never see a previous request's value.
    pub fn reset(&self) {
        self.bind(self.default.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_current_outside_scope_returns_default() {
        let slot = ContextSlot::new("request_id", "-");
        assert_eq!(slot.current(), "-");
        // bind without a scope is a no-op
        slot.bind("abc");
        assert_eq!(slot.current(), "-");
    }

    #[tokio::test]
    async fn test_bind_and_reset_within_scope() {
        let slot = ContextSlot::new("request_id", "-");
        scope(async {
            slot.bind("abc");
            assert_eq!(slot.current(), "abc");
            slot.reset();
            assert_eq!(slot.current(), "-");
        })
        .await;
    }

    #[tokio::test]
    async fn test_value_inherited_across_awaits() {
        let slot = ContextSlot::new("trace_id", "-");
        scope(async {
            slot.bind("t-1");
            tokio::task::yield_now().await;
            assert_eq!(slot.current(), "t-1");
        })
        .await;
    }

    #[tokio::test]
    async fn test_sibling_tasks_are_isolated() {
        let slot = ContextSlot::new("correlation_id", "-");

        let run = |value: &'static str| {
            let slot = slot.clone();
            tokio::spawn(scope(async move {
                slot.bind(value);
                tokio::task::yield_now().await;
                slot.current()
            }))
        };

        let (a, b) = tokio::join!(run("aaa"), run("bbb"));
        assert_eq!(a.unwrap(), "aaa");
        assert_eq!(b.unwrap(), "bbb");
        // nothing leaked to this task
        assert_eq!(slot.current(), "-");
    }

    #[tokio::test]
    async fn test_nested_scopes_share_one_map_per_task() {
        let outer = ContextSlot::new("a", "-");
        let inner = ContextSlot::new("b", "-");
        scope(async {
            outer.bind("1");
            // the middleware stack only opens one scope per task; a second
            // provider joining it sees the first one's binding
            inner.bind("2");
            assert_eq!(outer.current(), "1");
            assert_eq!(inner.current(), "2");
        })
        .await;
    }
}
