use serde::{Deserialize, Serialize};

/// A single token from the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Decoded text for string literals and words, empty otherwise
    pub text: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, text: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            text,
            line,
            column,
        }
    }

    /// Creates a punctuation or end-of-input token, which carries no text
    pub fn punct(kind: TokenKind, line: usize, column: usize) -> Self {
        Token::new(kind, String::new(), line, column)
    }

    /// True for a bare `.` word, the dotted-pair marker inside a list
    pub fn is_dot(&self) -> bool {
        self.kind == TokenKind::Word && self.text == "."
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.kind {
            TokenKind::Word => write!(f, "{}", self.text),
            TokenKind::StringLiteral => write!(f, "{:?}", self.text),
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// All token types of the s-expression syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Left parenthesis (
    OpenParen,
    /// Right parenthesis )
    CloseParen,
    /// Quote (')
    Quote,
    /// Backtick for quasi-quote (`)
    Quasiquote,
    /// Comma for unquote (,)
    Unquote,
    /// Double-quoted string literal
    StringLiteral,
    /// Any other run of non-delimiter characters: symbols, numbers, the lone dot
    Word,
    /// End of input marker
    EndOfInput,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::OpenParen => write!(f, "("),
            TokenKind::CloseParen => write!(f, ")"),
            TokenKind::Quote => write!(f, "'"),
            TokenKind::Quasiquote => write!(f, "`"),
            TokenKind::Unquote => write!(f, ","),
            TokenKind::StringLiteral => write!(f, "string literal"),
            TokenKind::Word => write!(f, "word"),
            TokenKind::EndOfInput => write!(f, "end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Token::punct(TokenKind::CloseParen, 1, 1).to_string(), ")");
        assert_eq!(
            Token::new(TokenKind::Word, "bee".to_string(), 1, 1).to_string(),
            "bee"
        );
        assert_eq!(
            Token::new(TokenKind::StringLiteral, "a\"b".to_string(), 1, 1).to_string(),
            r#""a\"b""#
        );
        assert_eq!(TokenKind::EndOfInput.to_string(), "end of input");
    }

    #[test]
    fn test_is_dot() {
        assert!(Token::new(TokenKind::Word, ".".to_string(), 1, 1).is_dot());
        assert!(!Token::new(TokenKind::Word, "..".to_string(), 1, 1).is_dot());
        assert!(!Token::new(TokenKind::StringLiteral, ".".to_string(), 1, 1).is_dot());
    }
}
