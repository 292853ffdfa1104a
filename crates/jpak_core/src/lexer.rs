//! Tokenizer for the flat-record input text.
//!
//! Reads bytes with a single byte of push-back. String contents are kept
//! verbatim (a backslash only protects the byte after it from ending the
//! string) and interned; integers are ASCII digits with an optional leading
//! minus; `true`/`false` are the only bare words.

use crate::consts::MAX_TOKEN;
use crate::errors::{JpakError, Result};
use crate::intern::{StringIntern, Symbol};
use crate::record::Value;
use std::fmt;
use std::io::{self, BufReader, Bytes, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Eof,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Str(Symbol),
    Num(i32),
    True,
    False,
}

/// Token kind without payload, used for grammar checks and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Str,
    Num,
    True,
    False,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Eof => TokenKind::Eof,
            Token::LeftBrace => TokenKind::LeftBrace,
            Token::RightBrace => TokenKind::RightBrace,
            Token::Comma => TokenKind::Comma,
            Token::Colon => TokenKind::Colon,
            Token::Str(_) => TokenKind::Str,
            Token::Num(_) => TokenKind::Num,
            Token::True => TokenKind::True,
            Token::False => TokenKind::False,
        }
    }

    /// The field value carried by a string, number or boolean token.
    pub fn as_value(&self) -> Option<Value<Symbol>> {
        match *self {
            Token::Str(s) => Some(Value::Text(s)),
            Token::Num(n) => Some(Value::Number(n)),
            Token::True => Some(Value::Bool(true)),
            Token::False => Some(Value::Bool(false)),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Eof => "end of input",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Str => "string",
            TokenKind::Num => "number",
            TokenKind::True => "true",
            TokenKind::False => "false",
        };
        f.write_str(s)
    }
}

// C isspace(): space, \t, \n, \v, \f, \r
#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

pub struct Lexer<R> {
    input: Bytes<BufReader<R>>,
    pending: Option<u8>,
    buf: Vec<u8>,
    max_token: usize,
    line: usize,
    strings: StringIntern,
}

impl<R: Read> Lexer<R> {
    pub fn new(input: R) -> Self {
        Self::with_max_token(input, MAX_TOKEN)
    }

    pub fn with_max_token(input: R, max_token: usize) -> Self {
        Self {
            input: BufReader::new(input).bytes(),
            pending: None,
            buf: Vec::with_capacity(64),
            max_token,
            line: 1,
            strings: StringIntern::new(),
        }
    }

    /// 1-based line of the last byte read.
    pub fn line(&self) -> usize { self.line }

    pub fn strings(&self) -> &StringIntern { &self.strings }

    pub fn resolve(&self, sym: Symbol) -> &[u8] { self.strings.resolve(sym) }

    fn getc(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pending.take() {
            return Ok(Some(b));
        }
        match self.input.next().transpose()? {
            Some(b) => {
                if b == b'\n' { self.line += 1; }
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }

    fn ungetc(&mut self, b: Option<u8>) {
        debug_assert!(self.pending.is_none());
        self.pending = b;
    }

    fn push(&mut self, b: u8) -> Result<()> {
        if self.buf.len() >= self.max_token {
            return Err(JpakError::TokenTooLarge { line: self.line, max: self.max_token });
        }
        self.buf.push(b);
        Ok(())
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.buf.clear();
        let mut c = self.getc()?;
        while c.is_some_and(is_space) {
            c = self.getc()?;
        }
        let Some(b) = c else { return Ok(Token::Eof) };
        match b {
            b'{' => Ok(Token::LeftBrace),
            b'}' => Ok(Token::RightBrace),
            b',' => Ok(Token::Comma),
            b':' => Ok(Token::Colon),
            b'"' => self.string(),
            b'-' | b'0'..=b'9' => self.number(b),
            b't' | b'f' => self.word(b),
            _ => Err(JpakError::UnexpectedChar { line: self.line, byte: b }),
        }
    }

    fn string(&mut self) -> Result<Token> {
        let mut escaped = false;
        loop {
            let Some(b) = self.getc()? else {
                return Err(JpakError::UnterminatedString { line: self.line });
            };
            if !escaped && b == b'"' {
                let sym = self.strings.intern(&self.buf);
                return Ok(Token::Str(sym));
            }
            escaped = !escaped && b == b'\\';
            self.push(b)?;
        }
    }

    fn number(&mut self, first: u8) -> Result<Token> {
        self.push(first)?;
        let mut c = self.getc()?;
        while let Some(b) = c.filter(u8::is_ascii_digit) {
            self.push(b)?;
            c = self.getc()?;
        }
        self.ungetc(c);
        // buf is ASCII by construction
        let text = String::from_utf8_lossy(&self.buf);
        text.parse::<i32>()
            .map(Token::Num)
            .map_err(|_| JpakError::InvalidNumber { line: self.line, text: text.into_owned() })
    }

    fn word(&mut self, first: u8) -> Result<Token> {
        self.push(first)?;
        let mut c = self.getc()?;
        while let Some(b) = c.filter(u8::is_ascii_alphabetic) {
            self.push(b)?;
            c = self.getc()?;
        }
        self.ungetc(c);
        match &self.buf[..] {
            b"true" => Ok(Token::True),
            b"false" => Ok(Token::False),
            other => Err(JpakError::BadLiteral {
                line: self.line,
                text: String::from_utf8_lossy(other).into_owned(),
            }),
        }
    }
}
