//! Function-call expression grammar
//!
//! Recognizes the `@name(args)` micro-language embedded in JSON string
//! leaves. The matcher is intentionally non-nested: the argument span may not
//! contain an unescaped `(`, `)`, or `@`, so a nested call is found *inside*
//! the outer text first and resolved innermost-out by the fixpoint loop in
//! [`crate::evaluator::ExpressionEngine`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Escape character accepted in front of `(`, `)`, `,`, the escape character
/// itself, and the leading `@` marker.
pub const ESCAPE_CHAR: char = '\\';

static CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(\w+)\s*\(([^()@]*)\)").expect("call grammar regex"));

/// The first `@name(args)` span found in an input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMatch<'a> {
    /// Function name without the `@` marker
    pub name: &'a str,
    /// Raw argument text between the parentheses, not yet split
    pub args: &'a str,
    /// Byte offset of the `@` marker
    pub start: usize,
    /// Byte offset one past the closing `)`
    pub end: usize,
}

/// Find the first substring matching the call grammar.
///
/// Returns `None` for malformed or absent calls; an unterminated `@value(` is
/// not a match and the surrounding string passes through unchanged.
pub fn try_parse_call(input: &str) -> Option<CallMatch<'_>> {
    let caps = CALL_RE.captures(input)?;
    let full = caps.get(0)?;
    Some(CallMatch {
        name: caps.get(1)?.as_str(),
        args: caps.get(2)?.as_str(),
        start: full.start(),
        end: full.end(),
    })
}

/// True iff the call grammar matches anywhere in the input.
pub fn is_call(input: &str) -> bool {
    CALL_RE.is_match(input)
}

/// Split an argument string on top-level commas.
///
/// Commas inside balanced unescaped parentheses are not split points. Each
/// resulting argument is unescaped unless it still matches the call grammar,
/// in which case unescaping is deferred to its own resolution. Empty input
/// yields zero arguments.
pub fn split_arguments(text: &str, escape_char: char) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut raw = Vec::new();
    let mut current = String::new();
    let mut depth = 0u32;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            // keep the pair; unescaping happens once the argument is complete
            current.push(escape_char);
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            c if c == escape_char => escaped = true,
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => raw.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if escaped {
        current.push(escape_char);
    }
    raw.push(current);

    raw.iter().map(|arg| unescape(arg, escape_char)).collect()
}

/// Remove escape characters in front of `(`, `)`, `,`, or the escape
/// character itself, unless the string is itself a call.
pub fn unescape(text: &str, escape_char: char) -> String {
    if is_call(text.trim()) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == escape_char {
            match chars.peek() {
                Some(&next) if next == '(' || next == ')' || next == ',' || next == escape_char => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// True iff the first non-whitespace characters are the escape character
/// followed by the `@` marker.
pub fn has_leading_escaped_marker(text: &str, escape_char: char) -> bool {
    let rest = text.trim_start();
    let mut chars = rest.chars();
    chars.next() == Some(escape_char) && chars.next() == Some('@')
}

/// Strip one escape character in front of a leading `@` marker, preserving
/// leading whitespace. Lets a literal `@name(...)` appear in output without
/// being treated as a call.
pub fn unescape_leading_marker(text: &str, escape_char: char) -> String {
    let ws_len = text.len() - text.trim_start().len();
    let (ws, rest) = text.split_at(ws_len);
    if let Some(stripped) = rest.strip_prefix(escape_char) {
        if stripped.starts_with('@') {
            return format!("{ws}{stripped}");
        }
    }
    text.to_string()
}
