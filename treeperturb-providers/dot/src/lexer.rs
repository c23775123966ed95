//! Tokenizer for the DOT subset read by [`crate::parse_str`].

use std::{iter::Peekable, str::Chars};

use crate::errors::DotError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// Bare identifier or numeral; keywords are matched case-insensitively.
    Id(String),
    /// Double-quoted string with escapes resolved; never a keyword.
    Quoted(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Equals,
    Semicolon,
    Comma,
    Colon,
    /// `->`
    Arrow,
    /// `--`
    UndirectedEdge,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

pub(crate) struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole input.
    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, DotError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> DotError {
        DotError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), DotError> {
        loop {
            match self.chars.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('#') if self.column == 1 => self.skip_line(),
                Some('/') => {
                    let (line, column) = (self.line, self.column);
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.peek() {
                        Some('/') => self.skip_line(),
                        Some('*') => {
                            self.bump();
                            self.bump();
                            self.skip_block_comment(line, column)?;
                        }
                        _ => return Err(self.error(line, column, "unexpected `/`")),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self, line: usize, column: usize) -> Result<(), DotError> {
        let mut star = false;
        while let Some(ch) = self.bump() {
            if star && ch == '/' {
                return Ok(());
            }
            star = ch == '*';
        }
        Err(self.error(line, column, "unterminated block comment"))
    }

    fn next_token(&mut self) -> Result<Option<Token>, DotError> {
        self.skip_trivia()?;
        let (line, column) = (self.line, self.column);
        let Some(ch) = self.bump() else {
            return Ok(None);
        };
        let kind = match ch {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '=' => TokenKind::Equals,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '"' => TokenKind::Quoted(self.quoted(line, column)?),
            '-' => match self.chars.peek() {
                Some('>') => {
                    self.bump();
                    TokenKind::Arrow
                }
                Some('-') => {
                    self.bump();
                    TokenKind::UndirectedEdge
                }
                _ => TokenKind::Id(self.numeral(ch)),
            },
            '<' => return Err(self.error(line, column, "HTML strings are not supported")),
            ch if ch.is_ascii_digit() || ch == '.' => TokenKind::Id(self.numeral(ch)),
            ch if is_id_start(ch) => TokenKind::Id(self.bare(ch)),
            other => return Err(self.error(line, column, format!("unexpected character `{other}`"))),
        };
        Ok(Some(Token { kind, line, column }))
    }

    fn quoted(&mut self, line: usize, column: usize) -> Result<String, DotError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(line, column, "unterminated string")),
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    // Escaped newline continues the string on the next line.
                    Some('\n') => {}
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(self.error(line, column, "unterminated string")),
                },
                Some(other) => value.push(other),
            }
        }
    }

    fn numeral(&mut self, first: char) -> String {
        let mut value = String::from(first);
        while let Some(&ch) = self.chars.peek() {
            if !(ch.is_ascii_digit() || ch == '.') {
                break;
            }
            value.push(ch);
            self.bump();
        }
        value
    }

    fn bare(&mut self, first: char) -> String {
        let mut value = String::from(first);
        while let Some(&ch) = self.chars.peek() {
            if !(is_id_start(ch) || ch.is_ascii_digit()) {
                break;
            }
            value.push(ch);
            self.bump();
        }
        value
    }
}

fn is_id_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}
