//! JSON template transformation engine
//!
//! Transforms a JSON template document into a rendered JSON/text document by
//! resolving an embedded micro-language of path lookups, formatting
//! functions, and structural operators against a source JSON document.
//! Typical use: projecting an API response into a shaped LLM prompt payload
//! without a general-purpose scripting layer.
//!
//! Two surfaces drive the transformation:
//!
//! - **Expressions**: `@name(args)` calls embedded in string leaves, e.g.
//!   `"@value($.customer.name)"` or
//!   `"@formatdate(@value(date),dd-MM-yyyy,dd/MM/yyyy)"`.
//! - **Operators**: objects carrying an `@operator` key (`each`, `sum`,
//!   `float`, `objectpatch`, `context`, `element`) that reshape structure
//!   and rebind the data scope.
//!
//! ```
//! use json_to_llm::{Context, TemplateEngine};
//! use serde_json::json;
//!
//! let source = json!({ "name": "Ada" });
//! let template = json!({ "greeting": "Hello @value(name)" });
//!
//! let engine = TemplateEngine::new();
//! let context = Context::from_root(source);
//! let result = futures::executor::block_on(engine.transform(&template, &context)).unwrap();
//! assert_eq!(result, json!({ "greeting": "Hello Ada" }));
//! ```

pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod operators;
pub mod parser;
pub mod script;

// Re-export main types
pub use engine::TemplateEngine;
pub use error::{Result, TemplateError};
pub use evaluator::ExpressionEngine;
pub use model::Context;
pub use operators::{Operator, OperatorResult};
pub use script::{NoScriptEngine, ScriptEngine, ScriptError, TextTemplateEngine};
