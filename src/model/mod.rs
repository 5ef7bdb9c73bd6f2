//! Data-scope model and JSONPath selection facade

pub mod context;
pub mod path;

pub use context::Context;

use serde_json::Value;

/// Human-readable JSON type tag, used in error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
