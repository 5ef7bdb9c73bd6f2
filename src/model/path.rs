//! JSONPath selection facade
//!
//! Thin wrapper over the RFC 9535 query engine so the rest of the crate
//! never touches the query crate directly. Paths on the template surface may
//! be relative (`prop.sub`); they are normalized to rooted form here.

use serde_json::Value;
use serde_json_path::JsonPath;

use crate::error::{Result, TemplateError};

/// Normalize a template-surface path to a rooted JSONPath.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('$') {
        trimmed.to_string()
    } else {
        format!("$.{trimmed}")
    }
}

/// Compose a path with an optional filter predicate into a query that
/// selects the elements under `path`.
pub fn with_filter(path: &str, filter: Option<&str>) -> String {
    let rooted = normalize(path);
    match filter {
        Some(filter) if !filter.is_empty() => format!("{rooted}[?({filter})]"),
        _ => format!("{rooted}[*]"),
    }
}

/// Select the single node addressed by `path`, or `None` when the path
/// resolves to nothing.
pub fn select_one<'a>(root: &'a Value, path: &str) -> Result<Option<&'a Value>> {
    let compiled = compile(path)?;
    Ok(compiled.query(root).all().into_iter().next())
}

/// Select every node matching `path` (which may carry a filter predicate).
pub fn select_all<'a>(root: &'a Value, path: &str) -> Result<Vec<&'a Value>> {
    let compiled = compile(path)?;
    Ok(compiled.query(root).all())
}

fn compile(path: &str) -> Result<JsonPath> {
    let rooted = normalize(path);
    JsonPath::parse(&rooted).map_err(|e| {
        TemplateError::invalid_argument(format!("invalid JSONPath '{path}': {e}"))
    })
}
