//! Error types for the s-expression reader

use std::sync::Arc;
use thiserror::Error;

/// Reader errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The input source could not be read any further
    ///
    /// **Triggered by:** an I/O failure from the underlying reader, or input that is not UTF-8.
    /// Once recorded, the tokenizer reports no more tokens.
    #[error("Read error at line {line}: {source}")]
    Io {
        /// Line the tokenizer was about to read
        line: usize,
        /// Underlying I/O failure
        source: Arc<std::io::Error>,
    },

    /// End of input where a token was required
    ///
    /// **Example:** `(a b` (missing closing parenthesis), `'` (quote with no operand)
    #[error("Unexpected end of input: {context}")]
    UnexpectedEof {
        /// What the parser was looking for
        context: &'static str,
    },

    /// Syntax error encountered during parsing
    ///
    /// **Example:** `(a . b c)` (dotted tail not followed by `)`)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Token that cannot appear at this position
    #[error("Unexpected token at line {line}, column {col}: expected {expected}, got {got}")]
    UnexpectedToken {
        /// Line number of the offending token
        line: usize,
        /// Column number of the offending token
        col: usize,
        /// Expected token description
        expected: &'static str,
        /// Actual token received
        got: String,
    },

    /// Forms nested deeper than the parser allows
    #[error("Nesting depth limit exceeded (max: {limit})")]
    DepthLimitExceeded {
        /// Configured maximum depth
        limit: usize,
    },
}

impl Error {
    /// Wraps an I/O failure observed while reading `line`
    pub fn io(line: usize, err: std::io::Error) -> Self {
        Error::Io {
            line,
            source: Arc::new(err),
        }
    }

    /// True when the input could not be read, as opposed to being malformed
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }

    /// True when the input was read fine but does not match the grammar
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedEof { .. }
                | Error::SyntaxError { .. }
                | Error::UnexpectedToken { .. }
                | Error::DepthLimitExceeded { .. }
        )
    }
}

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, Error>;
