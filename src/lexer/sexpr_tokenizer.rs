use std::io::{BufRead, BufReader, Read};
use std::iter::FusedIterator;

use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Pull-based tokenizer for s-expression text
///
/// Reads its source one line at a time and hands out tokens on demand, keeping at most
/// one token of lookahead. A read failure is remembered: from then on the tokenizer
/// reports no more tokens and never touches the source again.
#[derive(Debug)]
pub struct SExprTokenizer<R> {
    /// Buffered input source
    reader: R,
    /// Current line as characters, including its terminator
    buffer: Vec<char>,
    /// Position of the next unread character in `buffer`
    cursor: usize,
    /// Number of lines read so far (1-indexed line of `buffer`)
    line: usize,
    /// Token returned by the last peek, not yet consumed
    peeked: Option<Token>,
    /// First read failure, if any
    error: Option<Error>,
}

impl<'a> SExprTokenizer<&'a [u8]> {
    /// Creates a tokenizer over in-memory source text
    pub fn new(source: &'a str) -> Self {
        Self::with_buf_reader(source.as_bytes())
    }
}

impl<R: Read> SExprTokenizer<BufReader<R>> {
    /// Creates a tokenizer over an unbuffered character source such as a file
    pub fn from_reader(reader: R) -> Self {
        Self::with_buf_reader(BufReader::new(reader))
    }
}

impl<R: BufRead> SExprTokenizer<R> {
    /// Creates a tokenizer over an already buffered source
    pub fn with_buf_reader(reader: R) -> Self {
        SExprTokenizer {
            reader,
            buffer: Vec::new(),
            cursor: 0,
            line: 0,
            peeked: None,
            error: None,
        }
    }

    /// Returns the next token without consuming it
    ///
    /// `Ok(None)` means clean end of input. A read failure is returned as `Err` on this
    /// and every later call.
    pub fn try_peek(&mut self) -> Result<Option<&Token>> {
        if self.peeked.is_none() {
            if let Some(err) = &self.error {
                return Err(err.clone());
            }
            let token = self.scan_token()?;
            tracing::trace!(kind = ?token.kind, line = token.line, column = token.column, "token");
            self.peeked = Some(token);
        }

        Ok(self
            .peeked
            .as_ref()
            .filter(|token| token.kind != TokenKind::EndOfInput))
    }

    /// Consumes and returns the next token
    pub fn try_next(&mut self) -> Result<Option<Token>> {
        if self.try_peek()?.is_none() {
            // Keep the end-of-input marker cached so the source is never polled again
            return Ok(None);
        }
        Ok(self.peeked.take())
    }

    /// Returns the next token without consuming it, or `None` at end of input or after a
    /// read failure
    pub fn peek(&mut self) -> Option<&Token> {
        self.try_peek().ok().flatten()
    }

    /// True if a following `peek` or `next` would yield a token
    pub fn has_more(&mut self) -> bool {
        self.peek().is_some()
    }

    /// The read failure that stopped this tokenizer, if any
    pub fn last_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Number of the line most recently read (0 before any input is read)
    pub fn line(&self) -> usize {
        self.line
    }

    fn scan_token(&mut self) -> Result<Token> {
        loop {
            let Some(c) = self.peek_char()? else {
                return Ok(Token::punct(
                    TokenKind::EndOfInput,
                    self.line,
                    self.cursor + 1,
                ));
            };
            let (line, column) = (self.line, self.cursor + 1);

            let kind = match c {
                c if is_whitespace(c) => {
                    self.advance();
                    continue;
                }

                // Comments run to end of line
                ';' => {
                    self.cursor = self.buffer.len();
                    continue;
                }

                '(' => TokenKind::OpenParen,
                ')' => TokenKind::CloseParen,
                '\'' => TokenKind::Quote,
                '`' => TokenKind::Quasiquote,
                ',' => TokenKind::Unquote,

                '"' => {
                    self.advance();
                    let text = self.scan_string(line, column)?;
                    return Ok(Token::new(TokenKind::StringLiteral, text, line, column));
                }

                _ => {
                    let text = self.scan_word()?;
                    return Ok(Token::new(TokenKind::Word, text, line, column));
                }
            };

            self.advance();
            return Ok(Token::punct(kind, line, column));
        }
    }

    fn scan_word(&mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(c) = self.peek_char()? {
            if !is_word_char(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        Ok(text)
    }

    /// Scans string contents after the opening quote
    ///
    /// An unescaped line break or end of input also closes the literal.
    fn scan_string(&mut self, line: usize, column: usize) -> Result<String> {
        let mut value = String::new();

        while let Some(c) = self.peek_char()? {
            match c {
                '"' => {
                    self.advance();
                    return Ok(value);
                }
                '\n' | '\r' => break,
                '\\' => {
                    self.advance();
                    match self.peek_char()? {
                        Some(first @ '0'..='7') => value.push(self.scan_octal(first)?),
                        Some(escaped) => {
                            self.advance();
                            value.push(unescape(escaped));
                        }
                        None => break,
                    }
                }
                c => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        tracing::debug!(line, column, "unterminated string literal");
        Ok(value)
    }

    /// Up to three octal digits, three only when the first is 0-3
    fn scan_octal(&mut self, first: char) -> Result<char> {
        self.advance();
        let max_digits = if first <= '3' { 3 } else { 2 };
        let mut code = octal_value(first);
        let mut digits = 1;

        while digits < max_digits {
            match self.peek_char()? {
                Some(c @ '0'..='7') => {
                    code = code * 8 + octal_value(c);
                    digits += 1;
                    self.advance();
                }
                _ => break,
            }
        }

        Ok(char::from(code))
    }

    fn peek_char(&mut self) -> Result<Option<char>> {
        if self.cursor >= self.buffer.len() && !self.read_line()? {
            return Ok(None);
        }
        Ok(Some(self.buffer[self.cursor]))
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn read_line(&mut self) -> Result<bool> {
        let mut text = String::new();
        match self.reader.read_line(&mut text) {
            Ok(0) => Ok(false),
            Ok(_) => {
                self.buffer = text.chars().collect();
                self.cursor = 0;
                self.line += 1;
                Ok(true)
            }
            Err(err) => {
                let err = Error::io(self.line + 1, err);
                tracing::warn!("tokenizer stopped: {}", err);
                self.buffer.clear();
                self.cursor = 0;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }
}

impl<R: BufRead> Iterator for SExprTokenizer<R> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.try_next().ok().flatten()
    }
}

impl<R: BufRead> FusedIterator for SExprTokenizer<R> {}

/// Control characters through space
fn is_whitespace(c: char) -> bool {
    c <= ' '
}

fn is_word_char(c: char) -> bool {
    !is_whitespace(c) && !matches!(c, '(' | ')' | '\'' | '`' | ',' | ';' | '"')
}

fn unescape(c: char) -> char {
    match c {
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{b}',
        other => other,
    }
}

fn octal_value(c: char) -> u8 {
    c as u8 - b'0'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn kinds_and_text(source: &str) -> Vec<(TokenKind, String)> {
        SExprTokenizer::new(source)
            .map(|token| (token.kind, token.text))
            .collect()
    }

    fn word(text: &str) -> (TokenKind, String) {
        (TokenKind::Word, text.to_string())
    }

    fn string(text: &str) -> (TokenKind, String) {
        (TokenKind::StringLiteral, text.to_string())
    }

    fn punct(kind: TokenKind) -> (TokenKind, String) {
        (kind, String::new())
    }

    /// Serves `data` on the first read and fails on every read after that
    struct FailingReader {
        data: &'static [u8],
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::Other, "device unplugged"));
            }
            self.served = true;
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            Ok(n)
        }
    }

    #[test]
    fn test_every_token_kind() {
        let tokens = kinds_and_text("( ) ' ` , \"a\" bee");
        assert_eq!(
            tokens,
            vec![
                punct(TokenKind::OpenParen),
                punct(TokenKind::CloseParen),
                punct(TokenKind::Quote),
                punct(TokenKind::Quasiquote),
                punct(TokenKind::Unquote),
                string("a"),
                word("bee"),
            ]
        );
    }

    #[test]
    fn test_only_whitespace_and_comments() {
        for source in ["", "   ", "\t\n\r\n", "; just a comment", "  ;; one\n ; two\n\n"] {
            let mut tokenizer = SExprTokenizer::new(source);
            assert!(!tokenizer.has_more(), "source {:?}", source);
            assert!(tokenizer.peek().is_none());
            assert!(tokenizer.next().is_none());
            assert!(tokenizer.last_error().is_none());
        }
    }

    #[test]
    fn test_peek_is_idempotent() {
        let mut tokenizer = SExprTokenizer::new("foo bar");
        let first = tokenizer.peek().cloned();
        let second = tokenizer.peek().cloned();
        assert_eq!(first, second);
        assert_eq!(first.map(|t| t.text), Some("foo".to_string()));

        assert_eq!(tokenizer.next().map(|t| t.text), Some("foo".to_string()));
        assert_eq!(tokenizer.peek().map(|t| t.text.clone()), Some("bar".to_string()));
        assert_eq!(tokenizer.next().map(|t| t.text), Some("bar".to_string()));
        assert!(tokenizer.next().is_none());
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn test_delimiters_split_words() {
        let tokens = kinds_and_text("(a'b`c,d)e;f\ng\"h\"i");
        assert_eq!(
            tokens,
            vec![
                punct(TokenKind::OpenParen),
                word("a"),
                punct(TokenKind::Quote),
                word("b"),
                punct(TokenKind::Quasiquote),
                word("c"),
                punct(TokenKind::Unquote),
                word("d"),
                punct(TokenKind::CloseParen),
                word("e"),
                word("g"),
                string("h"),
                word("i"),
            ]
        );
    }

    #[test]
    fn test_words_keep_everything_else() {
        let tokens = kinds_and_text("(a . b) 1.5e3 -42 set! λx #t [x]");
        assert_eq!(
            tokens,
            vec![
                punct(TokenKind::OpenParen),
                word("a"),
                word("."),
                word("b"),
                punct(TokenKind::CloseParen),
                word("1.5e3"),
                word("-42"),
                word("set!"),
                word("λx"),
                word("#t"),
                word("[x]"),
            ]
        );
    }

    #[test]
    fn test_control_characters_are_whitespace() {
        let tokens = kinds_and_text("a\u{0}b\u{1f}c\u{7f}d");
        assert_eq!(tokens, vec![word("a"), word("b"), word("c\u{7f}d")]);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = kinds_and_text(r#""tab\there" "q\"uote" "back\\slash" "\q" "\a\b\f\v\r\n""#);
        assert_eq!(
            tokens,
            vec![
                string("tab\there"),
                string("q\"uote"),
                string("back\\slash"),
                string("q"),
                string("\u{7}\u{8}\u{c}\u{b}\r\n"),
            ]
        );
    }

    #[test]
    fn test_octal_escapes() {
        let tokens = kinds_and_text(r#""\101\102" "\0" "\477" "\1234""#);
        assert_eq!(
            tokens,
            vec![
                string("AB"),
                string("\0"),
                string("'7"),
                string("S4"),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_ends_at_line_break() {
        let tokens = kinds_and_text("\"abc\ndef\"");
        assert_eq!(tokens, vec![string("abc"), word("def"), string("")]);

        let tokens = kinds_and_text("(\"open");
        assert_eq!(tokens, vec![punct(TokenKind::OpenParen), string("open")]);
    }

    #[test]
    fn test_escaped_line_break_continues_string() {
        let tokens = kinds_and_text("\"one\\\ntwo\" three");
        assert_eq!(tokens, vec![string("one\ntwo"), word("three")]);
    }

    #[test]
    fn test_positions() {
        let tokens: Vec<Token> = SExprTokenizer::new("(foo\n  \"bar\")").collect();
        let positions: Vec<(usize, usize)> = tokens.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(positions, vec![(1, 1), (1, 2), (2, 3), (2, 8)]);
    }

    #[test]
    fn test_reader_matches_in_memory() {
        let source = "; header\n(define (f x) `(a ,x \"s\"))\n'quoted . tail";
        let from_str: Vec<Token> = SExprTokenizer::new(source).collect();
        let from_reader: Vec<Token> = SExprTokenizer::from_reader(io::Cursor::new(source)).collect();
        assert_eq!(from_str, from_reader);
        assert!(!from_str.is_empty());
    }

    #[test]
    fn test_read_failure_is_remembered() {
        let mut tokenizer = SExprTokenizer::from_reader(FailingReader {
            data: b"(a b)\n(c",
            served: false,
        });

        let before: Vec<TokenKind> = tokenizer.by_ref().map(|t| t.kind).collect();
        assert_eq!(
            before,
            vec![
                TokenKind::OpenParen,
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::CloseParen,
            ]
        );

        assert!(!tokenizer.has_more());
        assert!(tokenizer.peek().is_none());
        let err = tokenizer.last_error().cloned().expect("read failure recorded");
        assert!(err.is_io());
        assert!(err.to_string().contains("device unplugged"));
        assert!(tokenizer.try_peek().is_err());
        assert!(tokenizer.try_next().is_err());
    }

    #[test]
    fn test_invalid_utf8_is_a_read_failure() {
        let mut tokenizer = SExprTokenizer::with_buf_reader(&b"ok\n\xff\xfe\n"[..]);
        assert_eq!(tokenizer.next().map(|t| t.text), Some("ok".to_string()));
        assert!(tokenizer.next().is_none());
        assert!(matches!(tokenizer.last_error(), Some(Error::Io { line: 2, .. })));
    }

    #[test]
    fn test_clean_end_is_not_an_error() {
        let mut tokenizer = SExprTokenizer::new("x");
        assert!(tokenizer.next().is_some());
        assert!(matches!(tokenizer.try_next(), Ok(None)));
        assert!(tokenizer.last_error().is_none());
    }
}
