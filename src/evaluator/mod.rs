//! Expression resolution engine
//!
//! Resolves the `@name(args)` micro-language embedded in string leaves.
//! Resolution is a fixpoint loop: the first matching call span is replaced
//! with its computed value, and the result is re-scanned until no call
//! remains. Nested calls resolve innermost-out because the matcher never
//! matches a span containing an inner `@`.

pub mod datetime;
mod expressions;

pub use expressions::{
    FormatDateExpression, IfElseExpression, SwitchExpression, ValueExpression,
};

use std::sync::Arc;

use log::{debug, trace};
use serde_json::{Map, Value};

use crate::error::{Result, TemplateError};
use crate::model::Context;
use crate::parser;
use crate::script::ScriptEngine;

/// Cap on the fixpoint loop, so source data that keeps re-introducing call
/// text fails instead of spinning.
const MAX_RESOLUTION_STEPS: usize = 256;

/// Resolves expression strings to their final textual value.
pub struct ExpressionEngine {
    scripts: Arc<dyn ScriptEngine>,
}

impl ExpressionEngine {
    pub fn new(scripts: Arc<dyn ScriptEngine>) -> Self {
        Self { scripts }
    }

    /// True iff the text contains a call.
    pub fn is_expression(&self, text: &str) -> bool {
        parser::is_call(text)
    }

    /// Resolve every call in `text` to fixpoint and return the final string
    /// as a JSON value. Literal text around the calls is preserved.
    pub async fn evaluate(&self, text: &str, context: &Context) -> Result<Value> {
        let mut current = text.to_string();
        let mut steps = 0usize;

        loop {
            let Some(call) = parser::try_parse_call(&current) else {
                break;
            };
            let name = call.name.to_string();
            let args = call.args.to_string();
            let (start, end) = (call.start, call.end);

            let mut params = parser::split_arguments(&args, parser::ESCAPE_CHAR);
            for param in params.iter_mut() {
                if let Some(literal) = strip_literal(param) {
                    *param = literal;
                }
            }

            trace!("resolving @{name}({args})");
            let rendered = self.apply(&name, &params, context).await?;
            current.replace_range(start..end, &rendered);

            steps += 1;
            if steps >= MAX_RESOLUTION_STEPS {
                return Err(TemplateError::DepthExceeded {
                    max: MAX_RESOLUTION_STEPS,
                });
            }
        }

        Ok(Value::String(current))
    }

    async fn apply(&self, name: &str, params: &[String], context: &Context) -> Result<String> {
        match name {
            "value" => {
                if params.is_empty() || params.len() > 2 {
                    return Err(TemplateError::invalid_argument(format!(
                        "'value' takes a path and an optional default, got {} arguments",
                        params.len()
                    )));
                }
                let default = params
                    .get(1)
                    .map(|d| Value::String(d.clone()))
                    .unwrap_or_else(|| Value::String("null".to_string()));
                let expr = ValueExpression::new(context, &params[0], default)?;
                Ok(render_value(&expr.evaluate()?))
            }
            "formatdate" => {
                let [date, original, output] = require_arity::<3>(name, params)?;
                let expr = FormatDateExpression::new(date, original, output)?;
                Ok(render_value(&expr.evaluate()?))
            }
            "switch" => {
                let [input, mapping_json, default] = require_arity::<3>(name, params)?;
                let mapping: Map<String, Value> =
                    serde_json::from_str(mapping_json).map_err(|e| {
                        TemplateError::invalid_argument(format!(
                            "invalid 'switch' mapping '{mapping_json}': {e}"
                        ))
                    })?;
                let expr =
                    SwitchExpression::new(input.to_string(), mapping, default.to_string());
                Ok(render_value(&expr.evaluate()))
            }
            "ifelse" => {
                let [condition, if_value, else_value] = require_arity::<3>(name, params)?;
                let expr = IfElseExpression::new(context, condition, if_value, else_value)?;
                Ok(render_value(&expr.evaluate(self.scripts.as_ref()).await?))
            }
            other => {
                debug!("unknown function '{other}', rendering placeholder");
                if params.is_empty() {
                    Ok(format!("Function({other})"))
                } else {
                    Ok(format!("Function({other}, {})", params.join(", ")))
                }
            }
        }
    }
}

/// Render a JSON value as splice-back text. Null renders empty, strings
/// render without quotes, everything else as its JSON form.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Strip backtick delimiters off a literal argument; literals are never
/// re-resolved even if they look like calls.
fn strip_literal(param: &str) -> Option<String> {
    let stripped = param.strip_prefix('`')?.strip_suffix('`')?;
    Some(stripped.to_string())
}

fn require_arity<'a, const N: usize>(name: &str, params: &'a [String]) -> Result<[&'a str; N]> {
    let params: Vec<&str> = params.iter().map(String::as_str).collect();
    <[&str; N]>::try_from(params).map_err(|_| {
        TemplateError::invalid_argument(format!("'{name}' requires exactly {N} arguments"))
    })
}
