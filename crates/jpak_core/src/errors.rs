use crate::lexer::TokenKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JpakError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("couldn't open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Persist: {0}")]
    Persist(#[from] tempfile::PersistError),

    // lexing
    #[error("line {line}: unexpected char '{}'", .byte.escape_ascii())]
    UnexpectedChar { line: usize, byte: u8 },

    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: max token size of {max} bytes exceeded")]
    TokenTooLarge { line: usize, max: usize },

    #[error("line {line}: unexpected value {text}")]
    BadLiteral { line: usize, text: String },

    #[error("line {line}: invalid number {text}")]
    InvalidNumber { line: usize, text: String },

    // parsing
    #[error("line {line}: unexpected token {found}, expected {expected}")]
    UnexpectedToken {
        line: usize,
        expected: TokenKind,
        found: TokenKind,
    },

    #[error("line {line}: expected value, found {found}")]
    ExpectedValue { line: usize, found: TokenKind },

    // on-disk formats
    #[error("record of {0} bytes does not fit a 32-bit length")]
    RecordTooLarge(u64),

    #[error("malformed dictionary")]
    MalformedDictionary,

    #[error("malformed binary")]
    MalformedBinary,

    #[error("dictionary missing key {0}")]
    MissingKey(i32),
}

pub type Result<T> = std::result::Result<T, JpakError>;
