use std::io::BufRead;

use super::ast::Expression;
use super::config::ParserConfig;
use crate::error::{Error, Result};
use crate::lexer::{SExprTokenizer, Token, TokenKind};

/// Recursive-descent parser for s-expressions
///
/// Owns its tokenizer and reads one top-level expression per call to
/// [`parse_expr`](Self::parse_expr), using a single token of lookahead.
#[derive(Debug)]
pub struct SExprParser<R> {
    tokenizer: SExprTokenizer<R>,
    config: ParserConfig,
    /// Nesting level of the form being parsed
    depth: usize,
    /// Set once the iterator has yielded an error
    failed: bool,
}

impl<R: BufRead> SExprParser<R> {
    /// Creates a parser with the default configuration
    pub fn new(tokenizer: SExprTokenizer<R>) -> Self {
        Self::with_config(tokenizer, ParserConfig::default())
    }

    /// Creates a parser with the given configuration
    pub fn with_config(tokenizer: SExprTokenizer<R>, config: ParserConfig) -> Self {
        SExprParser {
            tokenizer,
            config,
            depth: 0,
            failed: false,
        }
    }

    /// Parses the next expression
    ///
    /// End of input before the first token is an [`Error::UnexpectedEof`]; use
    /// [`parse_next`](Self::parse_next) to treat it as a clean stop instead.
    pub fn parse_expr(&mut self) -> Result<Expression> {
        self.depth = 0;
        let result = self.parse_top_level();
        match &result {
            Ok(_) => tracing::trace!(line = self.tokenizer.line(), "parsed expression"),
            Err(err) => tracing::debug!(error = %err, "failed to parse expression"),
        }
        result
    }

    /// Parses the next expression, or returns `None` at clean end of input
    pub fn parse_next(&mut self) -> Result<Option<Expression>> {
        if self.tokenizer.try_peek()?.is_none() {
            return Ok(None);
        }
        self.parse_expr().map(Some)
    }

    /// Parses every remaining top-level expression
    pub fn parse_all(&mut self) -> Result<Vec<Expression>> {
        let mut exprs = Vec::new();
        while let Some(expr) = self.parse_next()? {
            exprs.push(expr);
        }
        Ok(exprs)
    }

    /// Fails unless the input is exhausted
    pub fn expect_end(&mut self) -> Result<()> {
        match self.tokenizer.try_peek()? {
            None => Ok(()),
            Some(token) => Err(unexpected(token, "end of input")),
        }
    }

    /// True if another top-level expression may follow
    pub fn has_more(&mut self) -> bool {
        self.tokenizer.has_more()
    }

    /// Settings this parser was built with
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Underlying tokenizer, e.g. to inspect [`SExprTokenizer::last_error`]
    pub fn tokenizer(&self) -> &SExprTokenizer<R> {
        &self.tokenizer
    }

    /// Underlying tokenizer, for peeking at the next token between expressions
    pub fn tokenizer_mut(&mut self) -> &mut SExprTokenizer<R> {
        &mut self.tokenizer
    }

    /// Gives back the tokenizer with any unread input
    pub fn into_tokenizer(self) -> SExprTokenizer<R> {
        self.tokenizer
    }

    fn parse_top_level(&mut self) -> Result<Expression> {
        let token = self.next_token("expected an expression")?;
        self.parse_token(token)
    }

    /// Parses the expression that starts with `token`
    fn parse_token(&mut self, token: Token) -> Result<Expression> {
        match token.kind {
            TokenKind::OpenParen => self.nested(|parser| parser.parse_list()),
            TokenKind::StringLiteral => Ok(Expression::StringAtom(token.text)),
            TokenKind::Quote => self.parse_quoted("QUOTE"),
            TokenKind::Quasiquote => self.parse_quoted("QUASIQUOTE"),
            TokenKind::Unquote => self.parse_quoted("UNQUOTE"),
            TokenKind::Word if token.text.eq_ignore_ascii_case("NIL") => Ok(Expression::Nil),
            TokenKind::Word => Ok(Expression::Atom(token.text)),
            TokenKind::CloseParen => Err(unexpected(&token, "an expression")),
            TokenKind::EndOfInput => Err(Error::UnexpectedEof {
                context: "expected an expression",
            }),
        }
    }

    /// Parses a list body after its `(`
    ///
    /// Elements are collected in order and folded into cons cells once the closing `)` or
    /// dotted tail is seen.
    fn parse_list(&mut self) -> Result<Expression> {
        let mut items = Vec::new();

        loop {
            let (kind, is_dot) = {
                let token = self.peek_token("expected `)` to close list")?;
                (token.kind, token.is_dot())
            };

            if kind == TokenKind::CloseParen {
                self.tokenizer.try_next()?;
                return Ok(Expression::list(items));
            }

            if is_dot {
                self.tokenizer.try_next()?;
                let tail = self.parse_dotted_tail()?;
                return Ok(Expression::list_with_tail(items, tail));
            }

            let token = self.next_token("expected `)` to close list")?;
            items.push(self.parse_token(token)?);
        }
    }

    /// Parses `Expr ')'` after a list-body `.`
    fn parse_dotted_tail(&mut self) -> Result<Expression> {
        let token = self.next_token("expected an expression after `.`")?;
        let tail = self.parse_token(token)?;

        match self.tokenizer.try_next()? {
            Some(token) if token.kind == TokenKind::CloseParen => Ok(tail),
            Some(token) => Err(Error::SyntaxError {
                line: token.line,
                col: token.column,
                message: format!("expected `)` after dotted tail, got `{}`", token),
            }),
            None => Err(Error::UnexpectedEof {
                context: "expected `)` after dotted tail",
            }),
        }
    }

    /// Parses the operand of a quote-like prefix into `(NAME operand)`
    fn parse_quoted(&mut self, name: &'static str) -> Result<Expression> {
        self.nested(|parser| {
            let token = parser.next_token("expected an expression after quote marker")?;
            let operand = parser.parse_token(token)?;
            Ok(Expression::quoted(name, operand))
        })
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.config.max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn next_token(&mut self, context: &'static str) -> Result<Token> {
        self.tokenizer
            .try_next()?
            .ok_or(Error::UnexpectedEof { context })
    }

    fn peek_token(&mut self, context: &'static str) -> Result<&Token> {
        self.tokenizer
            .try_peek()?
            .ok_or(Error::UnexpectedEof { context })
    }
}

impl<R: BufRead> Iterator for SExprParser<R> {
    type Item = Result<Expression>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.parse_next().transpose();
        if matches!(result, Some(Err(_))) {
            self.failed = true;
        }
        result
    }
}

fn unexpected(token: &Token, expected: &'static str) -> Error {
    Error::UnexpectedToken {
        line: token.line,
        col: token.column,
        expected,
        got: token.to_string(),
    }
}
