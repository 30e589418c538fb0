//! # sexpr-reader - an s-expression reader
//!
//! Reads Lisp-style symbolic expressions from text and builds an in-memory tree.
//!
//! ## Quick Start
//!
//! ```rust
//! use sexpr_reader::{parse_str, Expression};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let expr = parse_str("(define (square x) (* x x))")?;
//!
//! assert_eq!(expr.car(), Some(&Expression::atom("define")));
//! assert_eq!(expr.list_len(), Some(3));
//! assert_eq!(expr.to_string(), "(define (square x) (* x x))");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source Text → Tokenizer → Tokens → Parser → Expression
//! ```
//!
//! - [`Tokenizer`] - Pull-based token stream with one token of lookahead
//! - [`Parser`] - Recursive-descent parser, one expression per call
//! - [`Expression`] - Atoms, strings, cons cells and `Nil`
//!
//! ### Reading a stream
//!
//! The tokenizer reads its source one line at a time, so any `Read` works:
//!
//! ```rust
//! use sexpr_reader::{Parser, Tokenizer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = std::io::Cursor::new("'a\n(b . c) ; trailing comment\n");
//! let mut parser = Parser::new(Tokenizer::from_reader(source));
//!
//! let mut rendered = Vec::new();
//! while let Some(expr) = parser.parse_next()? {
//!     rendered.push(expr.to_string());
//! }
//! assert_eq!(rendered, vec!["(QUOTE a)", "(b . c)"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! A read failure from the source and malformed input are both reported as
//! [`Error`]; [`Error::is_io`] tells them apart.
//!
//! ```rust
//! use sexpr_reader::{parse_str, Error};
//!
//! match parse_str("(a . b c)") {
//!     Err(Error::SyntaxError { col, .. }) => assert_eq!(col, 8),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

pub mod error;
pub mod lexer;
pub mod parser;

// Re-export main types
pub use error::{Error, Result};
pub use lexer::{SExprTokenizer, Token, TokenKind};
pub use parser::{Expression, ListIter, ParserConfig, SExprParser};

/// Type alias for the s-expression tokenizer.
/// Converts raw source text into tokens for the parser.
pub type Tokenizer<R> = SExprTokenizer<R>;

/// Type alias for the s-expression parser.
/// Converts tokens into expression trees.
pub type Parser<R> = SExprParser<R>;

/// Parses exactly one expression from `source`
///
/// Anything other than whitespace and comments after the expression is an error.
pub fn parse_str(source: &str) -> Result<Expression> {
    let mut parser = SExprParser::new(SExprTokenizer::new(source));
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parses every top-level expression in `source`
pub fn parse_all_str(source: &str) -> Result<Vec<Expression>> {
    SExprParser::new(SExprTokenizer::new(source)).parse_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_str_rejects_trailing_tokens() {
        assert!(parse_str("a ; fine\n").is_ok());
        assert!(matches!(
            parse_str("a b"),
            Err(Error::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_parse_all_str() {
        let exprs = parse_all_str("a 'b (c . d)").unwrap();
        let rendered: Vec<String> = exprs.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a", "(QUOTE b)", "(c . d)"]);
        assert!(parse_all_str("  ; nothing\n").unwrap().is_empty());
    }
}
