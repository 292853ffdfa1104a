//! Packing: flat JSON-like records → TLV record stream + key dictionary.

use crate::consts::{Tag, MAX_TOKEN};
use crate::dict::KeyDictionary;
use crate::errors::{JpakError, Result};
use crate::intern::Symbol;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::record::{write_field, Value};
use crate::utils::{write_i32, write_u8};
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackStats {
    pub records: u64,
    pub fields: u64,
    pub keys: usize,
    /// Bytes of the record stream.
    pub bytes: u64,
}

/// Output sink that tracks its write position and can patch a previously
/// reserved i32 in place.
pub struct RecordSink<W> {
    inner: W,
    pos: u64,
}

impl<W: Write + Seek> RecordSink<W> {
    pub fn new(mut inner: W) -> io::Result<Self> {
        let pos = inner.stream_position()?;
        Ok(Self { inner, pos })
    }

    pub fn position(&self) -> u64 { self.pos }

    /// Writes a placeholder i32 and returns its offset.
    pub fn reserve_i32(&mut self) -> io::Result<u64> {
        let at = self.pos;
        write_i32(self, 0)?;
        Ok(at)
    }

    /// Overwrites the i32 at `at`, then returns to the end of the written data.
    pub fn patch_i32(&mut self, at: u64, v: i32) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(at))?;
        write_i32(&mut self.inner, v)?;
        self.inner.seek(SeekFrom::Start(self.pos))?;
        Ok(())
    }

    pub fn into_inner(self) -> W { self.inner }
}

impl<W: Write> Write for RecordSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { self.inner.flush() }
}

/// Recursive-descent packer over the token stream:
///
///   stream := (record ","?)* EOF
///   record := "{" (STRING ":" value ("," | break))* "}"
///   value  := STRING | NUMBER | true | false
pub struct Packer<R, W> {
    lexer: Lexer<R>,
    cur: Token,
    out: RecordSink<W>,
    keys: KeyDictionary,
    stats: PackStats,
}

impl<R: Read, W: Write + Seek> Packer<R, W> {
    pub fn new(input: R, out: W) -> Result<Self> {
        Self::with_max_token(input, out, MAX_TOKEN)
    }

    pub fn with_max_token(input: R, out: W, max_token: usize) -> Result<Self> {
        Ok(Self {
            lexer: Lexer::with_max_token(input, max_token),
            cur: Token::Eof,
            out: RecordSink::new(out)?,
            keys: KeyDictionary::new(),
            stats: PackStats::default(),
        })
    }

    /// Packs the whole input. Returns the key dictionary, run statistics and
    /// the flushed output.
    pub fn run(mut self) -> Result<(KeyDictionary, PackStats, W)> {
        let start = self.out.position();
        self.advance()?;
        while !self.accept(TokenKind::Eof)? {
            self.record()?;
            self.accept(TokenKind::Comma)?;
        }
        self.out.flush()?;
        self.stats.keys = self.keys.len();
        self.stats.bytes = self.out.position() - start;
        debug!(
            records = self.stats.records,
            fields = self.stats.fields,
            keys = self.stats.keys,
            strings = self.lexer.strings().len(),
            bytes = self.stats.bytes,
            "pack complete"
        );
        Ok((self.keys, self.stats, self.out.into_inner()))
    }

    /// Consumes the current token and returns it.
    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.cur, next))
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.cur.kind() == kind
    }

    fn accept(&mut self, kind: TokenKind) -> Result<bool> {
        if !self.check(kind) {
            return Ok(false);
        }
        self.advance()?;
        Ok(true)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.accept(kind)? {
            return Ok(());
        }
        Err(JpakError::UnexpectedToken { line: self.lexer.line(), expected: kind, found: self.cur.kind() })
    }

    fn expect_key(&mut self) -> Result<Symbol> {
        match self.cur {
            Token::Str(sym) => {
                self.advance()?;
                Ok(sym)
            }
            other => Err(JpakError::UnexpectedToken {
                line: self.lexer.line(),
                expected: TokenKind::Str,
                found: other.kind(),
            }),
        }
    }

    fn expect_value(&mut self) -> Result<Value<Symbol>> {
        match self.cur.as_value() {
            Some(v) => {
                self.advance()?;
                Ok(v)
            }
            None => Err(JpakError::ExpectedValue { line: self.lexer.line(), found: self.cur.kind() }),
        }
    }

    fn record(&mut self) -> Result<()> {
        self.expect(TokenKind::LeftBrace)?;
        write_u8(&mut self.out, Tag::Record as u8)?;
        let len_at = self.out.reserve_i32()?;
        let start = self.out.position();

        while !self.check(TokenKind::RightBrace) {
            let key = self.expect_key()?;
            let key_id = self.keys.id_or_assign(self.lexer.resolve(key));
            self.expect(TokenKind::Colon)?;
            let value = self.expect_value()?;
            let value = value.map_text(|s| self.lexer.resolve(s));
            write_field(&mut self.out, key_id, &value)?;
            self.stats.fields += 1;
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;

        let len = self.out.position() - start;
        let len = i32::try_from(len).map_err(|_| JpakError::RecordTooLarge(len))?;
        self.out.patch_i32(len_at, len)?;
        self.stats.records += 1;
        Ok(())
    }
}

/// Packs `input` into `out`; see [`Packer`].
pub fn pack<R: Read, W: Write + Seek>(input: R, out: W) -> Result<(KeyDictionary, PackStats)> {
    let (keys, stats, _) = Packer::new(input, out)?.run()?;
    Ok((keys, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::read_i32;
    use std::io::Cursor;

    fn pack_str(src: &str) -> Result<(KeyDictionary, PackStats, Vec<u8>)> {
        let (keys, stats, out) = Packer::new(src.as_bytes(), Cursor::new(Vec::new()))?.run()?;
        Ok((keys, stats, out.into_inner()))
    }

    #[test]
    fn sample_record_layout() {
        let (keys, stats, bin) = pack_str(r#"{"name": "ada", "age": 36, "ok": true}"#).unwrap();
        assert_eq!(keys.id(b"name"), Some(0));
        assert_eq!(keys.id(b"age"), Some(1));
        assert_eq!(keys.id(b"ok"), Some(2));
        assert_eq!(stats, PackStats { records: 1, fields: 3, keys: 3, bytes: bin.len() as u64 });

        let mut expected = vec![Tag::Record as u8];
        expected.extend_from_slice(&(12i32 + 13 + 9).to_le_bytes());
        expected.extend_from_slice(&[Tag::Str as u8, 7, 0, 0, 0, 0, 0, 0, 0, b'a', b'd', b'a']);
        expected.extend_from_slice(&[Tag::Num as u8, 8, 0, 0, 0, 1, 0, 0, 0, 36, 0, 0, 0]);
        expected.extend_from_slice(&[Tag::True as u8, 4, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(bin, expected);
    }

    #[test]
    fn records_share_key_ids() {
        let (keys, stats, bin) = pack_str("{\"a\":1}\n{\"a\":2}").unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(stats.records, 2);
        let frame = [Tag::Record as u8, 13, 0, 0, 0, Tag::Num as u8, 8, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(&bin[..14], &frame);
        assert_eq!(read_i32(&mut &bin[14..]).unwrap(), 1);
        assert_eq!(&bin[18..32], &frame);
        assert_eq!(read_i32(&mut &bin[32..]).unwrap(), 2);
    }

    #[test]
    fn comma_between_records_is_accepted() {
        let (_, stats, _) = pack_str(r#"{"a":1},{"a":2}"#).unwrap();
        assert_eq!(stats.records, 2);
    }

    #[test]
    fn empty_and_trailing_comma_records() {
        let (keys, stats, bin) = pack_str(r#"{} {"x":"",}"#).unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(keys.id(b"x"), Some(0));
        assert_eq!(&bin[..5], &[Tag::Record as u8, 0, 0, 0, 0]);
        assert_eq!(read_i32(&mut &bin[6..]).unwrap(), 9);
    }

    #[test]
    fn empty_input_packs_nothing() {
        let (keys, stats, bin) = pack_str(" \n ").unwrap();
        assert!(keys.is_empty());
        assert_eq!(stats.records, 0);
        assert!(bin.is_empty());
    }

    #[test]
    fn record_length_is_patched_mid_stream() {
        // the sink starts at a non-zero offset
        let mut cur = Cursor::new(b"prefix".to_vec());
        cur.seek(SeekFrom::End(0)).unwrap();
        let (_, stats, cur) = Packer::new(&br#"{"k":"v"}"#[..], cur).unwrap().run().unwrap();
        let bin = cur.into_inner();
        assert_eq!(&bin[..6], b"prefix");
        assert_eq!(stats.bytes as usize, bin.len() - 6);
        assert_eq!(read_i32(&mut &bin[7..]).unwrap(), 10);
    }

    #[test]
    fn grammar_errors() {
        assert!(matches!(
            pack_str(r#""a":1"#),
            Err(JpakError::UnexpectedToken { expected: TokenKind::LeftBrace, found: TokenKind::Str, .. })
        ));
        assert!(matches!(
            pack_str(r#"{"a" 1}"#),
            Err(JpakError::UnexpectedToken { expected: TokenKind::Colon, found: TokenKind::Num, .. })
        ));
        assert!(matches!(
            pack_str(r#"{1:2}"#),
            Err(JpakError::UnexpectedToken { expected: TokenKind::Str, found: TokenKind::Num, .. })
        ));
        assert!(matches!(
            pack_str(r#"{"a":1 "b":2}"#),
            Err(JpakError::UnexpectedToken { expected: TokenKind::RightBrace, .. })
        ));
        assert!(matches!(pack_str(r#"{"a":{"b":1}}"#), Err(JpakError::ExpectedValue { found: TokenKind::LeftBrace, .. })));
        assert!(matches!(pack_str(r#"{"a":}"#), Err(JpakError::ExpectedValue { .. })));
        assert!(matches!(pack_str(r#"{"a":1"#), Err(JpakError::UnexpectedToken { found: TokenKind::Eof, .. })));
    }

    #[test]
    fn lexer_errors_propagate() {
        assert!(matches!(pack_str(r#"{"a":[1]}"#), Err(JpakError::UnexpectedChar { byte: b'[', .. })));
        assert!(matches!(pack_str(r#"{"a":1.5}"#), Err(JpakError::UnexpectedChar { byte: b'.', .. })));
        assert!(matches!(pack_str(r#"{"a":null}"#), Err(JpakError::UnexpectedChar { byte: b'n', .. })));
    }
}
