//! Lexical analysis
//!
//! Converts source text into a pull-based stream of s-expression tokens.

mod sexpr_tokenizer;
mod token;

pub use sexpr_tokenizer::SExprTokenizer;
pub use token::{Token, TokenKind};
