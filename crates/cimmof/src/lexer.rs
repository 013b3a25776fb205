//! MOF Lexer
//!
//! Tokenizes MOF source text. Keywords are case-insensitive; words that
//! are only special in one position (`scope`, `flavor`, `pragma`, the
//! scope and flavor names) are returned as identifiers and recognized by
//! the parser.

use cim::CimType;

use crate::error::{MofError, Result};

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Class,
    Instance,
    Of,
    Qualifier,
    As,
    Ref,
    Null,
    True,
    False,
    DataType(CimType),

    // Identifiers and literals
    Ident(String),
    /// `$name`, without the dollar sign
    Alias(String),
    /// Integer literal text, sign included, in any radix
    Integer(String),
    Real(String),
    StringLiteral(String),
    CharLiteral(u16),

    // Punctuation
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Equals,    // =
    Dot,       // .
    Hash,      // #

    Eof,
}

impl Token {
    pub fn keyword(word: &str) -> Option<Token> {
        let token = match word.to_ascii_lowercase().as_str() {
            "class" => Token::Class,
            "instance" => Token::Instance,
            "of" => Token::Of,
            "qualifier" => Token::Qualifier,
            "as" => Token::As,
            "ref" => Token::Ref,
            "null" => Token::Null,
            "true" => Token::True,
            "false" => Token::False,
            "boolean" => Token::DataType(CimType::Boolean),
            "string" => Token::DataType(CimType::String),
            "datetime" => Token::DataType(CimType::DateTime),
            "char16" => Token::DataType(CimType::Char16),
            "uint8" => Token::DataType(CimType::Uint8),
            "sint8" => Token::DataType(CimType::Sint8),
            "uint16" => Token::DataType(CimType::Uint16),
            "sint16" => Token::DataType(CimType::Sint16),
            "uint32" => Token::DataType(CimType::Uint32),
            "sint32" => Token::DataType(CimType::Sint32),
            "uint64" => Token::DataType(CimType::Uint64),
            "sint64" => Token::DataType(CimType::Sint64),
            "real32" => Token::DataType(CimType::Real32),
            "real64" => Token::DataType(CimType::Real64),
            _ => return None,
        };
        Some(token)
    }
}

/// A token with the line it starts on and its source text
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub line: u32,
    pub text: String,
}

/// Lexer state
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.token == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<SpannedToken> {
        self.skip_whitespace_and_comments()?;

        let start = self.pos;
        let line = self.line;

        let Some(ch) = self.peek() else {
            return Ok(SpannedToken {
                token: Token::Eof,
                line,
                text: String::new(),
            });
        };

        let token = match ch {
            b'{' => { self.pos += 1; Token::LBrace }
            b'}' => { self.pos += 1; Token::RBrace }
            b'[' => { self.pos += 1; Token::LBracket }
            b']' => { self.pos += 1; Token::RBracket }
            b'(' => { self.pos += 1; Token::LParen }
            b')' => { self.pos += 1; Token::RParen }
            b',' => { self.pos += 1; Token::Comma }
            b';' => { self.pos += 1; Token::Semicolon }
            b':' => { self.pos += 1; Token::Colon }
            b'=' => { self.pos += 1; Token::Equals }
            b'#' => { self.pos += 1; Token::Hash }
            b'"' => self.lex_string()?,
            b'\'' => self.lex_char()?,
            b'$' => self.lex_alias()?,
            b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
            b'.' => { self.pos += 1; Token::Dot }
            b'+' | b'-' if self.starts_number(1) => self.lex_number()?,
            b'0'..=b'9' => self.lex_number()?,
            c if is_ident_start(c) => self.lex_ident(),
            _ => {
                let c = self.input[self.pos..].chars().next().unwrap_or('?');
                return Err(MofError::lexer(self.line, format!("unexpected character: {c}")));
            }
        };

        Ok(SpannedToken {
            token,
            line,
            text: self.input[start..self.pos].to_string(),
        })
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn starts_number(&self, offset: usize) -> bool {
        match self.peek_at(offset) {
            Some(c) if c.is_ascii_digit() => true,
            Some(b'.') => self.peek_at(offset + 1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                self.bump();
            }

            match (self.peek(), self.peek_at(1)) {
                (Some(b'/'), Some(b'/')) => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let line = self.line;
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(MofError::lexer(line, "unterminated comment"));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        let word = &self.input[start..self.pos];
        Token::keyword(word).unwrap_or_else(|| Token::Ident(word.to_string()))
    }

    fn lex_alias(&mut self) -> Result<Token> {
        self.pos += 1; // Skip '$'
        if !self.peek().is_some_and(is_ident_start) {
            return Err(MofError::lexer(self.line, "expected alias name after '$'"));
        }
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        Ok(Token::Alias(self.input[start..self.pos].to_string()))
    }

    fn lex_number(&mut self) -> Result<Token> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }

        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.pos += 2;
            let digits = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            if self.pos == digits {
                return Err(MofError::lexer(self.line, "invalid hex number"));
            }
            return self.finish_number(start, false);
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }

        let mut real = false;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            real = true;
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let exponent = match self.peek_at(1) {
                Some(b'+' | b'-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent {
                real = true;
                self.pos += 2;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
        if !real && matches!(self.peek(), Some(b'b' | b'B')) {
            // Binary literal
            self.pos += 1;
        }
        self.finish_number(start, real)
    }

    fn finish_number(&mut self, start: usize, real: bool) -> Result<Token> {
        if self.peek().is_some_and(is_ident_char) {
            let mut end = self.pos;
            while self.bytes.get(end).copied().is_some_and(is_ident_char) {
                end += 1;
            }
            return Err(MofError::lexer(
                self.line,
                format!("invalid number: {}", &self.input[start..end]),
            ));
        }
        let text = self.input[start..self.pos].to_string();
        Ok(if real { Token::Real(text) } else { Token::Integer(text) })
    }

    /// Escape sequence after the backslash, as UTF-16 code units
    fn lex_escape(&mut self) -> Result<char> {
        let line = self.line;
        let c = self
            .bump()
            .ok_or_else(|| MofError::lexer(line, "unterminated escape sequence"))?;
        let ch = match c {
            b'b' => '\u{8}',
            b't' => '\t',
            b'n' => '\n',
            b'f' => '\u{c}',
            b'r' => '\r',
            b'"' => '"',
            b'\'' => '\'',
            b'\\' => '\\',
            b'x' | b'X' => {
                let start = self.pos;
                while self.pos - start < 4 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.pos += 1;
                }
                let hex = &self.input[start..self.pos];
                u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| MofError::lexer(line, format!("invalid escape \\x{hex}")))?
            }
            other => {
                return Err(MofError::lexer(
                    line,
                    format!("invalid escape sequence \\{}", other as char),
                ))
            }
        };
        Ok(ch)
    }

    fn lex_string(&mut self) -> Result<Token> {
        let line = self.line;
        self.pos += 1; // Skip opening quote

        let mut s = String::new();
        loop {
            let rest = &self.input[self.pos..];
            let Some(c) = rest.chars().next() else {
                return Err(MofError::lexer(line, "unterminated string"));
            };
            match c {
                '"' => {
                    self.pos += 1;
                    break;
                }
                '\\' => {
                    self.pos += 1;
                    s.push(self.lex_escape()?);
                }
                '\n' => return Err(MofError::lexer(line, "newline in string constant")),
                c => {
                    self.pos += c.len_utf8();
                    s.push(c);
                }
            }
        }
        Ok(Token::StringLiteral(s))
    }

    fn lex_char(&mut self) -> Result<Token> {
        let line = self.line;
        self.pos += 1; // Skip opening quote
        let c = match self.input[self.pos..].chars().next() {
            Some('\\') => {
                self.pos += 1;
                self.lex_escape()?
            }
            Some(c) if c != '\'' && c != '\n' => {
                self.pos += c.len_utf8();
                c
            }
            _ => return Err(MofError::lexer(line, "empty character literal")),
        };
        if self.peek() != Some(b'\'') {
            return Err(MofError::lexer(line, "unterminated character literal"));
        }
        self.pos += 1;

        let mut units = [0u16; 2];
        match c.encode_utf16(&mut units) {
            [unit] => Ok(Token::CharLiteral(*unit)),
            _ => Err(MofError::lexer(line, "character literal outside the BMP")),
        }
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
}
