//! Free-text template renderer
//!
//! Renders a text template by splicing each code segment's result between
//! the literal spans. The heavy lifting happens in the caller-supplied
//! [`ScriptEngine`]; this type only owns the splice loop.

use std::sync::Arc;

use serde_json::Value;

use super::{ScriptEngine, ScriptError, parse_segments};

/// Renders text templates containing `@(...)`/`@{...}` code segments.
pub struct TextTemplateEngine {
    scripts: Arc<dyn ScriptEngine>,
}

impl TextTemplateEngine {
    /// Create a renderer backed by the given script engine.
    pub fn new(scripts: Arc<dyn ScriptEngine>) -> Self {
        Self { scripts }
    }

    /// Render `template` against `model`, replacing every code segment with
    /// its evaluated value. Null results render as the empty string; all
    /// text outside segments is preserved byte for byte.
    pub async fn render(
        &self,
        template: &str,
        model: &Value,
    ) -> std::result::Result<String, ScriptError> {
        let segments = parse_segments(template)?;
        let mut out = String::with_capacity(template.len());
        let mut cursor = 0;

        for segment in &segments {
            out.push_str(&template[cursor..segment.start]);
            if !segment.code.trim().is_empty() {
                let value = if segment.is_block {
                    self.scripts.evaluate_block(&segment.code, model).await?
                } else {
                    self.scripts.evaluate(&segment.code, model).await?
                };
                match value {
                    Value::Null => {}
                    Value::String(s) => out.push_str(&s),
                    other => out.push_str(&other.to_string()),
                }
            }
            cursor = segment.end;
        }
        out.push_str(&template[cursor..]);

        Ok(out)
    }
}
