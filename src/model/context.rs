//! Transformation context: the (global, local) data-scope pair

use std::sync::Arc;

use serde_json::Value;

/// Immutable pair of data scopes that path lookups resolve against.
///
/// `global` is the full source document, fixed for an entire top-level
/// transformation. `local` is the subtree currently in scope; it changes only
/// via explicit rebinding (descending into an array element, a context
/// carrier node, or the `context` operator). Rebinding always produces a new
/// instance; the scopes are shared, never mutated.
#[derive(Debug, Clone)]
pub struct Context {
    global: Arc<Value>,
    local: Arc<Value>,
}

impl Context {
    /// Create a context from already-shared scopes.
    pub fn create(global: Arc<Value>, local: Arc<Value>) -> Self {
        Self { global, local }
    }

    /// Create a context from owned scopes.
    pub fn new(global: Value, local: Value) -> Self {
        Self::create(Arc::new(global), Arc::new(local))
    }

    /// Create a context whose local scope is the whole source document.
    pub fn from_root(root: Value) -> Self {
        let root = Arc::new(root);
        Self::create(Arc::clone(&root), root)
    }

    /// The full source document.
    pub fn global(&self) -> &Value {
        &self.global
    }

    /// The data subtree currently in scope.
    pub fn local(&self) -> &Value {
        &self.local
    }

    /// Rebind the local scope, keeping the global document shared.
    pub fn with_local(&self, local: Value) -> Self {
        Self {
            global: Arc::clone(&self.global),
            local: Arc::new(local),
        }
    }
}
