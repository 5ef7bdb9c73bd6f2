//! External code evaluator seam
//!
//! The engine itself implements no scripting language. Free-form code
//! fragments — `@(...)`/`@{...}` segments in text templates and the condition
//! of the `ifelse` expression — are delegated to a [`ScriptEngine`] supplied
//! by the caller. Compilation, sandboxing, and execution strategy are the
//! implementor's concern.

mod parser;
mod template;

pub use parser::{Segment, parse_segments};
pub use template::TextTemplateEngine;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure of the external code evaluator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// The code fragment did not compile
    #[error("Script compilation failed: {message}")]
    Compile {
        /// Compiler diagnostic
        message: String,
    },

    /// The code fragment compiled but failed at runtime
    #[error("Script execution failed: {message}")]
    Runtime {
        /// Runtime diagnostic
        message: String,
    },
}

/// Evaluates an arbitrary code fragment against a model value.
///
/// The fragment's meaning is entirely up to the implementation; the engine
/// only requires that a value (a boolean, for `ifelse` conditions) comes
/// back, or a [`ScriptError`].
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    /// Evaluate `code` with `model` in scope and return the produced value.
    async fn evaluate(&self, code: &str, model: &Value) -> std::result::Result<Value, ScriptError>;

    /// Evaluate a `@{ ... }` statement block with `model` in scope.
    ///
    /// Engines whose block execution differs from expression evaluation
    /// override this; the default treats the block as an expression.
    async fn evaluate_block(
        &self,
        code: &str,
        model: &Value,
    ) -> std::result::Result<Value, ScriptError> {
        self.evaluate(code, model).await
    }
}

/// Default engine that rejects every fragment.
///
/// Wired into [`crate::TemplateEngine::new`]; templates that never reach a
/// script evaluation work unchanged, ones that do fail loudly instead of
/// silently producing nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScriptEngine;

#[async_trait]
impl ScriptEngine for NoScriptEngine {
    async fn evaluate(
        &self,
        code: &str,
        _model: &Value,
    ) -> std::result::Result<Value, ScriptError> {
        Err(ScriptError::Runtime {
            message: format!("no script engine is configured to evaluate '{code}'"),
        })
    }
}
