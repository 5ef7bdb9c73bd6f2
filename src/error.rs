//! Error types for template transformation
//!
//! This module defines the error taxonomy used throughout the engine.

use thiserror::Error;

use crate::script::ScriptError;

/// Result type alias for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors that can occur while transforming a template
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// A required parameter was blank, of the wrong type, or had the wrong arity
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable description of the offending argument
        message: String,
    },

    /// A function call was expected but the call grammar was violated
    ///
    /// The shipped engine passes malformed call text through unchanged;
    /// like [`Self::UnsupportedFunction`], this variant exists for callers
    /// that validate templates up front.
    #[error("Malformed expression: {expression}")]
    MalformedExpression {
        /// The text that failed to parse as a call
        expression: String,
    },

    /// A function name outside the built-in set, reported by strict callers
    ///
    /// The shipped engine renders unknown functions as a textual placeholder
    /// instead of failing; this variant exists for callers that validate
    /// templates up front.
    #[error("Unsupported function '{name}'")]
    UnsupportedFunction {
        /// Name of the unknown function
        name: String,
    },

    /// An `@operator` discriminator outside the built-in set
    #[error("Unsupported operator '{name}'")]
    UnsupportedOperator {
        /// Value of the offending `@operator` key
        name: String,
    },

    /// An operand type that is not valid for the operation
    #[error("Unsupported type: {message}")]
    UnsupportedType {
        /// Human-readable description of the type mismatch
        message: String,
    },

    /// A date string did not match its declared format
    #[error("Format error: '{value}' does not match format '{format}'")]
    FormatError {
        /// The input text that failed to parse
        value: String,
        /// The format it was parsed against
        format: String,
    },

    /// Template nesting or expression resolution exceeded the recursion budget
    #[error("Template nesting exceeds the maximum depth of {max}")]
    DepthExceeded {
        /// The configured budget that was exhausted
        max: usize,
    },

    /// External code evaluator failure, propagated opaquely
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
}

impl TemplateError {
    /// Create an `InvalidArgument` error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an `UnsupportedType` error
    pub fn unsupported_type(message: impl Into<String>) -> Self {
        Self::UnsupportedType {
            message: message.into(),
        }
    }

    /// Create a `FormatError`
    pub fn format_error(value: impl Into<String>, format: impl Into<String>) -> Self {
        Self::FormatError {
            value: value.into(),
            format: format.into(),
        }
    }
}
