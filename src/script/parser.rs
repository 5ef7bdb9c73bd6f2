//! Free-text segment scanner
//!
//! Finds `@(expr)` inline and `@{ block }` segments in a text template.
//! Nesting depth is tracked so parentheses/braces inside the code are fine,
//! and `"`/`'` string literals are honored so delimiters inside strings do
//! not close a segment.

use super::ScriptError;

/// One code segment found in a text template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// True for `@{ ... }` blocks, false for `@( ... )` inline expressions
    pub is_block: bool,
    /// The code between the delimiters
    pub code: String,
    /// Byte offset of the `@` marker
    pub start: usize,
    /// Byte offset one past the closing delimiter
    pub end: usize,
}

/// Scan a template for code segments, in order of appearance.
///
/// Fails with [`ScriptError::Compile`] when a segment is opened but never
/// closed.
pub fn parse_segments(template: &str) -> std::result::Result<Vec<Segment>, ScriptError> {
    let chars: Vec<(usize, char)> = template.char_indices().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i + 1 < chars.len() {
        let (at_pos, ch) = chars[i];
        let next = chars[i + 1].1;
        if ch != '@' || (next != '(' && next != '{') {
            i += 1;
            continue;
        }

        let is_block = next == '{';
        let (open, close) = if is_block { ('{', '}') } else { ('(', ')') };
        let mut j = i + 2;
        let mut depth = 1u32;
        let mut in_string = false;
        let mut delimiter = '\0';

        while j < chars.len() && depth > 0 {
            let c = chars[j].1;
            if in_string {
                if c == '\\' {
                    j += 2;
                    continue;
                }
                if c == delimiter {
                    in_string = false;
                }
            } else if c == '"' || c == '\'' {
                in_string = true;
                delimiter = c;
            } else if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
            }
            j += 1;
        }

        if depth != 0 {
            return Err(ScriptError::Compile {
                message: format!("unterminated expression starting at position {at_pos}"),
            });
        }

        let code_start = chars[i + 2].0;
        let (close_pos, close_char) = chars[j - 1];
        let end = close_pos + close_char.len_utf8();
        segments.push(Segment {
            is_block,
            code: template[code_start..close_pos].to_string(),
            start: at_pos,
            end,
        });
        i = j;
    }

    Ok(segments)
}
