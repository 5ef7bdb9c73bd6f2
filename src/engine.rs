//! Template engine - the main entry point for template transformation

use std::sync::Arc;

use futures::future::BoxFuture;
use log::{debug, trace};
use serde_json::{Map, Value};

use crate::error::{Result, TemplateError};
use crate::evaluator::ExpressionEngine;
use crate::model::Context;
use crate::operators::{
    self, CARRIER_CONTEXT_KEY, CARRIER_ELEMENT_KEY, OPERATOR_KEY, parse_operator,
};
use crate::parser::{self, ESCAPE_CHAR};
use crate::script::{NoScriptEngine, ScriptEngine};

/// Default recursion budget; deep enough for real templates, shallow enough
/// to fail before the thread stack does.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Main engine for transforming JSON templates against a source document.
///
/// The transformer is a pure recursion with no shared mutable state;
/// independent top-level `transform` calls may run concurrently. The single
/// suspension point is the `ifelse` expression's call into the external
/// [`ScriptEngine`], which is why the whole pipeline is async.
pub struct TemplateEngine {
    expressions: ExpressionEngine,
    max_depth: usize,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// Create an engine with no script backend; templates using `ifelse`
    /// will fail until one is supplied via [`Self::with_script_engine`].
    pub fn new() -> Self {
        Self::with_script_engine(Arc::new(NoScriptEngine))
    }

    /// Create an engine backed by the given script engine.
    pub fn with_script_engine(scripts: Arc<dyn ScriptEngine>) -> Self {
        Self {
            expressions: ExpressionEngine::new(scripts),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the recursion budget.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Transform a template node against a context, producing the rendered
    /// document. Any evaluator or operator error aborts the whole call;
    /// there is no partial output.
    pub async fn transform(&self, template: &Value, context: &Context) -> Result<Value> {
        self.transform_node(template.clone(), context.clone(), 0)
            .await
    }

    fn transform_node(
        &self,
        node: Value,
        context: Context,
        depth: usize,
    ) -> BoxFuture<'_, Result<Value>> {
        Box::pin(async move {
            if depth > self.max_depth {
                return Err(TemplateError::DepthExceeded {
                    max: self.max_depth,
                });
            }

            match node {
                Value::String(text) => {
                    if parser::has_leading_escaped_marker(&text, ESCAPE_CHAR) {
                        return Ok(Value::String(parser::unescape_leading_marker(
                            &text,
                            ESCAPE_CHAR,
                        )));
                    }
                    if self.expressions.is_expression(&text) {
                        trace!("resolving expression leaf: {text}");
                        return self.expressions.evaluate(&text, &context).await;
                    }
                    Ok(Value::String(text))
                }
                Value::Object(map) if map.contains_key(OPERATOR_KEY) => {
                    let node = Value::Object(map);
                    let operator = parse_operator(&node)?;
                    debug!("dispatching operator node");
                    let result = operator.evaluate(&context)?;
                    let next = result.new_context.unwrap_or(context);
                    self.transform_node(result.value, next, depth + 1).await
                }
                Value::Object(mut map) if operators::is_carrier(&map) => {
                    let item = map.shift_remove(CARRIER_CONTEXT_KEY).ok_or_else(|| {
                        TemplateError::invalid_argument(format!(
                            "context node requires an '{CARRIER_CONTEXT_KEY}' value"
                        ))
                    })?;
                    let element = map.shift_remove(CARRIER_ELEMENT_KEY).ok_or_else(|| {
                        TemplateError::invalid_argument(format!(
                            "context node requires an '{CARRIER_ELEMENT_KEY}' value"
                        ))
                    })?;
                    let rebound = context.with_local(item);
                    self.transform_node(element, rebound, depth + 1).await
                }
                Value::Object(map) => {
                    let mut out = Map::with_capacity(map.len());
                    for (key, value) in map {
                        let transformed = self
                            .transform_node(value, context.clone(), depth + 1)
                            .await?;
                        out.insert(key, transformed);
                    }
                    Ok(Value::Object(out))
                }
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        // each element is transformed under its own scope;
                        // siblings never see each other's rebinding
                        let element_context = context.with_local(item.clone());
                        out.push(
                            self.transform_node(item, element_context, depth + 1)
                                .await?,
                        );
                    }
                    Ok(Value::Array(out))
                }
                other => Ok(other),
            }
        })
    }
}
