//! Expression evaluators
//!
//! One type per built-in function, each with a validating constructor and an
//! `evaluate` returning a JSON value. [`IfElseExpression`] is the only
//! asynchronous evaluator: its condition crosses into the external
//! [`ScriptEngine`].

use serde_json::{Map, Value};

use super::datetime;
use crate::error::{Result, TemplateError};
use crate::model::{Context, json_type_name, path};
use crate::script::ScriptEngine;

/// Looks up a path in the local context, falling back to a default value.
#[derive(Debug)]
pub struct ValueExpression<'a> {
    context: &'a Context,
    path: String,
    default: Value,
}

impl<'a> ValueExpression<'a> {
    /// Fails with `InvalidArgument` when the path is blank.
    pub fn new(context: &'a Context, path: &str, default: Value) -> Result<Self> {
        if path.trim().is_empty() {
            return Err(TemplateError::invalid_argument(
                "'value' requires a non-empty path",
            ));
        }
        Ok(Self {
            context,
            path: path.to_string(),
            default,
        })
    }

    /// The value at the path, or the default when the path resolves to
    /// nothing.
    pub fn evaluate(&self) -> Result<Value> {
        Ok(path::select_one(self.context.local(), &self.path)?
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

/// Reformats a date string from one .NET-style format to another.
#[derive(Debug)]
pub struct FormatDateExpression {
    date: String,
    original_format: String,
    output_format: String,
}

impl FormatDateExpression {
    /// Fails with `InvalidArgument` when either format is blank.
    pub fn new(date: &str, original_format: &str, output_format: &str) -> Result<Self> {
        if original_format.trim().is_empty() || output_format.trim().is_empty() {
            return Err(TemplateError::invalid_argument(
                "'formatdate' requires non-empty original and output formats",
            ));
        }
        Ok(Self {
            date: date.to_string(),
            original_format: original_format.to_string(),
            output_format: output_format.to_string(),
        })
    }

    /// Fails with `FormatError` when the date does not match the original
    /// format.
    pub fn evaluate(&self) -> Result<Value> {
        datetime::reformat(&self.date, &self.original_format, &self.output_format)
            .map(Value::String)
    }
}

/// Maps an input string to a predefined output value through an ordered
/// mapping, with a textual default for unmapped inputs.
pub struct SwitchExpression {
    input: String,
    mapping: Map<String, Value>,
    default: String,
}

impl SwitchExpression {
    pub fn new(input: String, mapping: Map<String, Value>, default: String) -> Self {
        Self {
            input,
            mapping,
            default,
        }
    }

    pub fn evaluate(&self) -> Value {
        self.mapping
            .get(&self.input)
            .cloned()
            .unwrap_or_else(|| Value::String(self.default.clone()))
    }
}

/// Chooses between two values based on a condition evaluated by the external
/// script engine against the local context.
pub struct IfElseExpression<'a> {
    context: &'a Context,
    condition: String,
    if_value: String,
    else_value: String,
}

impl<'a> IfElseExpression<'a> {
    /// Fails with `InvalidArgument` when the condition is blank.
    pub fn new(
        context: &'a Context,
        condition: &str,
        if_value: &str,
        else_value: &str,
    ) -> Result<Self> {
        if condition.trim().is_empty() {
            return Err(TemplateError::invalid_argument(
                "'ifelse' requires a non-empty condition",
            ));
        }
        Ok(Self {
            context,
            condition: condition.to_string(),
            if_value: if_value.to_string(),
            else_value: else_value.to_string(),
        })
    }

    /// Fails with `UnsupportedType` when the condition does not evaluate to
    /// a boolean; script failures propagate as `Script`.
    pub async fn evaluate(&self, scripts: &dyn ScriptEngine) -> Result<Value> {
        let result = scripts
            .evaluate(&self.condition, self.context.local())
            .await?;
        match result {
            Value::Bool(true) => Ok(Value::String(self.if_value.clone())),
            Value::Bool(false) => Ok(Value::String(self.else_value.clone())),
            other => Err(TemplateError::unsupported_type(format!(
                "'ifelse' condition must evaluate to a boolean, got {}",
                json_type_name(&other)
            ))),
        }
    }
}
