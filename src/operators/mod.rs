//! Structural operator algebra
//!
//! Operator nodes are JSON objects carrying an `@operator` discriminator.
//! The set is closed: dispatch is an exhaustive match over a tagged enum, so
//! adding an operator is compile-time-checked into every switch site. Each
//! operator evaluates to an [`OperatorResult`]: a new template fragment plus
//! an optional replacement context the transformer must continue under.

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, TemplateError};
use crate::model::{Context, json_type_name, path};

/// Discriminator key of an operator node.
pub const OPERATOR_KEY: &str = "@operator";

/// Type key of a context-carrier node.
pub const CARRIER_TYPE_KEY: &str = "@type";
/// Type value of a context-carrier node.
pub const CARRIER_TYPE_VALUE: &str = "context";
/// Data-item key of a context-carrier node.
pub const CARRIER_CONTEXT_KEY: &str = "@context";
/// Sub-template key of a context-carrier node.
pub const CARRIER_ELEMENT_KEY: &str = "@element";

/// Result of evaluating an operator.
///
/// When `new_context` is present the transformer continues transforming
/// `value` under it instead of the caller's context — the one mechanism by
/// which an operator both produces a fragment and rebinds its scope.
#[derive(Debug, Clone)]
pub struct OperatorResult {
    /// The produced template fragment, still subject to transformation
    pub value: Value,
    /// Replacement context for transforming `value`, if any
    pub new_context: Option<Context>,
}

impl OperatorResult {
    fn value(value: Value) -> Self {
        Self {
            value,
            new_context: None,
        }
    }
}

fn root_path() -> String {
    "$".to_string()
}

/// Projects every element matched by a path (with optional filter) through a
/// sub-template, each under its own element-local scope.
#[derive(Debug, Clone, Deserialize)]
pub struct EachOperator {
    #[serde(rename = "@path")]
    pub path: String,
    #[serde(rename = "@filter", default)]
    pub filter: Option<String>,
    #[serde(rename = "@element")]
    pub element: Value,
}

/// Sums a numeric key across the elements of an array.
#[derive(Debug, Clone, Deserialize)]
pub struct SumOperator {
    #[serde(rename = "@path")]
    pub path: String,
    #[serde(rename = "@key")]
    pub key: String,
}

/// Parses the string at a path as a floating-point number.
#[derive(Debug, Clone, Deserialize)]
pub struct FloatOperator {
    #[serde(rename = "@path")]
    pub path: String,
    #[serde(rename = "@default", default)]
    pub default: Option<f64>,
}

/// Clones the object at a path and patches its keys.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectPatchOperator {
    #[serde(rename = "@path", default = "root_path")]
    pub path: String,
    #[serde(rename = "@addIfNull", default)]
    pub add_if_null: Option<Map<String, Value>>,
    #[serde(rename = "@addOrUpdate", default)]
    pub add_or_update: Option<Map<String, Value>>,
    #[serde(rename = "@removeKeys", default)]
    pub remove_keys: Option<Vec<String>>,
}

/// Rebinds the local scope for a sub-template.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextOperator {
    #[serde(rename = "@context")]
    pub context: Value,
    #[serde(rename = "@element")]
    pub element: Value,
}

/// Extracts the value at a path, with an optional default.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementOperator {
    #[serde(rename = "@path", default = "root_path")]
    pub path: String,
    #[serde(rename = "@default", default)]
    pub default: Option<Value>,
}

/// The closed set of structural operators.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "@operator", rename_all = "lowercase")]
pub enum Operator {
    Each(EachOperator),
    Sum(SumOperator),
    Float(FloatOperator),
    ObjectPatch(ObjectPatchOperator),
    Context(ContextOperator),
    Element(ElementOperator),
}

const OPERATOR_NAMES: [&str; 6] = ["each", "sum", "float", "objectpatch", "context", "element"];

/// Deserialize an operator node, failing with `UnsupportedOperator` for an
/// unknown discriminator and `InvalidArgument` for a malformed node.
pub fn parse_operator(node: &Value) -> Result<Operator> {
    let Value::Object(map) = node else {
        return Err(TemplateError::invalid_argument(format!(
            "operator node must be an object, got {}",
            json_type_name(node)
        )));
    };
    let name = match map.get(OPERATOR_KEY) {
        Some(Value::String(name)) => name.as_str(),
        Some(other) => {
            return Err(TemplateError::invalid_argument(format!(
                "'{OPERATOR_KEY}' must be a string, got {}",
                json_type_name(other)
            )));
        }
        None => {
            return Err(TemplateError::invalid_argument(format!(
                "operator node is missing its '{OPERATOR_KEY}' discriminator"
            )));
        }
    };
    if !OPERATOR_NAMES.contains(&name) {
        return Err(TemplateError::UnsupportedOperator {
            name: name.to_string(),
        });
    }
    serde_json::from_value(node.clone()).map_err(|e| {
        TemplateError::invalid_argument(format!("invalid '{name}' operator: {e}"))
    })
}

impl Operator {
    /// Evaluate the operator against a context.
    pub fn evaluate(&self, context: &Context) -> Result<OperatorResult> {
        match self {
            Operator::Each(op) => op.evaluate(context),
            Operator::Sum(op) => op.evaluate(context),
            Operator::Float(op) => op.evaluate(context),
            Operator::ObjectPatch(op) => op.evaluate(context),
            Operator::Context(op) => op.evaluate(context),
            Operator::Element(op) => op.evaluate(context),
        }
    }
}

/// Build a context-carrier node pairing a data item with a sub-template.
fn carrier(item: Value, element: Value) -> Value {
    let mut map = Map::with_capacity(3);
    map.insert(
        CARRIER_TYPE_KEY.to_string(),
        Value::String(CARRIER_TYPE_VALUE.to_string()),
    );
    map.insert(CARRIER_CONTEXT_KEY.to_string(), item);
    map.insert(CARRIER_ELEMENT_KEY.to_string(), element);
    Value::Object(map)
}

/// True iff a map has the context-carrier shape.
pub fn is_carrier(map: &Map<String, Value>) -> bool {
    matches!(map.get(CARRIER_TYPE_KEY), Some(Value::String(t)) if t == CARRIER_TYPE_VALUE)
}

impl EachOperator {
    fn evaluate(&self, context: &Context) -> Result<OperatorResult> {
        let query = path::with_filter(&self.path, self.filter.as_deref());
        let items = path::select_all(context.local(), &query)?;
        debug!("each over '{query}' matched {} items", items.len());

        let elements = items
            .into_iter()
            .map(|item| carrier(item.clone(), self.element.clone()))
            .collect();
        Ok(OperatorResult::value(Value::Array(elements)))
    }
}

impl SumOperator {
    fn evaluate(&self, context: &Context) -> Result<OperatorResult> {
        let Some(node) = path::select_one(context.local(), &self.path)? else {
            return Ok(OperatorResult::value(Value::from(0.0)));
        };
        let Value::Array(items) = node else {
            return Err(TemplateError::unsupported_type(format!(
                "'sum' requires an array at '{}', got {}",
                self.path,
                json_type_name(node)
            )));
        };

        let mut sum = 0f64;
        for item in items {
            match path::select_one(item, &self.key)? {
                // absent keys contribute nothing; explicit nulls do not
                None => {}
                Some(Value::Number(n)) => {
                    sum += n.as_f64().ok_or_else(|| {
                        TemplateError::unsupported_type(format!(
                            "'sum' cannot represent the value at key '{}' as a float",
                            self.key
                        ))
                    })?;
                }
                Some(other) => {
                    return Err(TemplateError::unsupported_type(format!(
                        "'sum' cannot add {} at key '{}'",
                        json_type_name(other),
                        self.key
                    )));
                }
            }
        }
        Ok(OperatorResult::value(Value::from(sum)))
    }
}

impl FloatOperator {
    fn evaluate(&self, context: &Context) -> Result<OperatorResult> {
        if let Some(Value::String(text)) = path::select_one(context.local(), &self.path)? {
            if let Ok(parsed) = text.trim().parse::<f64>() {
                return Ok(OperatorResult::value(Value::from(parsed)));
            }
        }
        match self.default {
            Some(default) => Ok(OperatorResult::value(Value::from(default))),
            None => Err(TemplateError::invalid_argument(format!(
                "field at path '{}' is not a parsable number and no default was provided",
                self.path
            ))),
        }
    }
}

impl ObjectPatchOperator {
    fn evaluate(&self, context: &Context) -> Result<OperatorResult> {
        let Some(node) = path::select_one(context.local(), &self.path)? else {
            return Ok(OperatorResult::value(Value::Null));
        };
        let Value::Object(original) = node else {
            // non-objects pass through unchanged
            return Ok(OperatorResult::value(node.clone()));
        };

        let mut patched = original.clone();
        if let Some(additions) = &self.add_if_null {
            for (key, value) in additions {
                match patched.get(key) {
                    None | Some(Value::Null) => {
                        patched.insert(key.clone(), value.clone());
                    }
                    Some(_) => {}
                }
            }
        }
        if let Some(updates) = &self.add_or_update {
            for (key, value) in updates {
                patched.insert(key.clone(), value.clone());
            }
        }
        if let Some(keys) = &self.remove_keys {
            for key in keys {
                patched.shift_remove(key);
            }
        }
        Ok(OperatorResult::value(Value::Object(patched)))
    }
}

impl ContextOperator {
    fn evaluate(&self, context: &Context) -> Result<OperatorResult> {
        Ok(OperatorResult {
            value: self.element.clone(),
            new_context: Some(context.with_local(self.context.clone())),
        })
    }
}

impl ElementOperator {
    fn evaluate(&self, context: &Context) -> Result<OperatorResult> {
        let value = path::select_one(context.local(), &self.path)?
            .cloned()
            .unwrap_or_else(|| self.default.clone().unwrap_or(Value::Null));
        Ok(OperatorResult::value(value))
    }
}
