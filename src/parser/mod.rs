//! S-expression parser
//!
//! Builds [`Expression`] trees from the token stream of an
//! [`SExprTokenizer`](crate::lexer::SExprTokenizer).

mod ast;
mod config;
mod sexpr_parser;

pub use ast::{Expression, ListIter};
pub use config::{ParserConfig, DEFAULT_MAX_DEPTH};
pub use sexpr_parser::SExprParser;
