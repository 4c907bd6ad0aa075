//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula lexing, parsing or evaluation.
///
/// Lex and parse errors are detected before any evaluation is attempted.
/// The runtime family (`Type`, `Runtime`, `Timeout`) terminates an
/// evaluation with a single structured error naming the failing function;
/// partial results are never surfaced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    // === Lex errors ===
    /// Character the lexer does not recognize
    #[error("invalid character '{ch}' at position {position}")]
    Lex { position: usize, ch: char },

    /// String literal with no closing quote
    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString { position: usize },

    // === Parse errors ===
    /// Opening and closing parenthesis counts do not match
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    /// Input does not have the shape of a function call
    #[error("formula must be a function call, e.g. SUM(price, tax)")]
    InvalidFormat,

    /// Token other than the one the grammar requires
    #[error("expected {expected}, got {got} at position {position}")]
    UnexpectedToken {
        expected: &'static str,
        got: String,
        position: usize,
    },

    /// Input ended in the middle of an expression
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// Call nesting beyond the implementation limit
    #[error("formula nesting exceeds {limit} levels")]
    TooDeeplyNested { limit: usize },

    /// Call to a function not present in the registry
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Argument count outside the declared range
    #[error(
        "wrong number of arguments for {function}: expected {}, got {got}",
        expected_arity(*.min, *.max)
    )]
    Arity {
        function: String,
        min: usize,
        max: Option<usize>,
        got: usize,
    },

    // === Runtime errors ===
    /// Argument value incompatible with the declared parameter type
    #[error("{function}: argument {} must be {expected}, got {actual}", .arg + 1)]
    Type {
        function: String,
        /// Zero-based argument index
        arg: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// Function-specific failure during execution
    #[error("{function}: {message}")]
    Runtime {
        function: String,
        /// Zero-based argument index, when the failure is tied to one
        arg: Option<usize>,
        message: String,
    },

    /// Evaluation exceeded the caller-supplied bound
    #[error("{function} timed out after {limit_ms} ms")]
    Timeout { function: String, limit_ms: u64 },
}

fn expected_arity(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("{}", min),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    }
}

impl FormulaError {
    /// Construct a runtime error for a function, without an argument index
    pub fn runtime<S: Into<String>>(function: &str, message: S) -> Self {
        FormulaError::Runtime {
            function: function.to_string(),
            arg: None,
            message: message.into(),
        }
    }

    /// True for errors detected before evaluation starts
    pub fn is_parse_error(&self) -> bool {
        !self.is_runtime_error()
    }

    /// True for errors raised while evaluating
    pub fn is_runtime_error(&self) -> bool {
        matches!(
            self,
            FormulaError::Type { .. }
                | FormulaError::Runtime { .. }
                | FormulaError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_arity_message() {
        let err = FormulaError::Arity {
            function: "ROUND".into(),
            min: 1,
            max: Some(2),
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "wrong number of arguments for ROUND: expected 1 to 2, got 3"
        );

        let err = FormulaError::Arity {
            function: "SUM".into(),
            min: 1,
            max: None,
            got: 0,
        };
        assert_eq!(
            err.to_string(),
            "wrong number of arguments for SUM: expected at least 1, got 0"
        );
    }

    #[test]
    fn test_type_message_is_one_based() {
        let err = FormulaError::Type {
            function: "ROUND".into(),
            arg: 0,
            expected: "number",
            actual: "text",
        };
        assert_eq!(err.to_string(), "ROUND: argument 1 must be number, got text");
    }

    #[test]
    fn test_error_classification() {
        assert!(FormulaError::UnbalancedParentheses.is_parse_error());
        assert!(FormulaError::UnknownFunction("FOO".into()).is_parse_error());
        assert!(FormulaError::runtime("GET", "boom").is_runtime_error());
        assert!(FormulaError::Timeout {
            function: "WEATHER".into(),
            limit_ms: 100
        }
        .is_runtime_error());
    }
}
