//! TLV record format (LE):
//!
//!   record = tag[1]=RECORD | len[4] | field*      (len = bytes of all fields)
//!   field  = tag[1] | len[4] | key_id[4] | payload (len = 4 + payload bytes)
//!
//! Payload is empty for TRUE/FALSE, an i32 for NUMBER and raw bytes for STRING.

use crate::consts::{Tag, KEY_ID_SIZE};
use crate::errors::{JpakError, Result};
use crate::utils::{read_i32, read_u8, write_i32, write_u8};
use std::io::{self, Write};

/// Field value. `T` is the text representation: a symbol while packing,
/// a byte slice on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<T> {
    Bool(bool),
    Number(i32),
    Text(T),
}

impl<T> Value<T> {
    pub fn map_text<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Value::Bool(b) => Value::Bool(b),
            Value::Number(n) => Value::Number(n),
            Value::Text(t) => Value::Text(f(t)),
        }
    }
}

impl Value<&[u8]> {
    pub fn tag(&self) -> Tag {
        match self {
            Value::Bool(true) => Tag::True,
            Value::Bool(false) => Tag::False,
            Value::Number(_) => Tag::Num,
            Value::Text(_) => Tag::Str,
        }
    }

    pub fn payload_len(&self) -> usize {
        match self {
            Value::Bool(_) => 0,
            Value::Number(_) => 4,
            Value::Text(t) => t.len(),
        }
    }
}

/// Writes one field; returns the bytes written including its header.
pub fn write_field<W: Write>(w: &mut W, key_id: i32, value: &Value<&[u8]>) -> Result<u64> {
    let payload = value.payload_len();
    let len = i32::try_from(payload)
        .ok()
        .and_then(|n| n.checked_add(KEY_ID_SIZE))
        .ok_or(JpakError::RecordTooLarge(payload as u64))?;
    write_u8(w, value.tag() as u8)?;
    write_i32(w, len)?;
    write_i32(w, key_id)?;
    match value {
        Value::Bool(_) => {}
        Value::Number(n) => write_i32(w, *n)?,
        Value::Text(t) => w.write_all(t)?,
    }
    Ok(1 + 4 + len as u64)
}

/// Splits the next record's field bytes off `data`.
pub fn read_record<'a>(data: &mut &'a [u8]) -> Result<&'a [u8]> {
    let tag = read_u8(data)?;
    if tag != Tag::Record as u8 {
        return Err(JpakError::MalformedBinary);
    }
    let len = read_i32(data).map_err(|_| JpakError::MalformedBinary)?;
    take(data, len).ok_or(JpakError::MalformedBinary)
}

/// Decodes the next field from a record's field bytes.
pub fn read_field<'a>(rec: &mut &'a [u8]) -> Result<(i32, Value<&'a [u8]>)> {
    decode_field(rec).ok_or(JpakError::MalformedBinary)
}

fn decode_field<'a>(rec: &mut &'a [u8]) -> Option<(i32, Value<&'a [u8]>)> {
    let tag = Tag::from_u8(read_u8(rec).ok()?)?;
    let len = read_i32(rec).ok()?;
    let key_id = read_i32(rec).ok()?;
    let payload = take(rec, len.checked_sub(KEY_ID_SIZE)?)?;
    let value = match tag {
        Tag::True if payload.is_empty() => Value::Bool(true),
        Tag::False if payload.is_empty() => Value::Bool(false),
        Tag::Num if payload.len() == 4 => Value::Number(read_i32(&mut &payload[..]).ok()?),
        Tag::Str => Value::Text(payload),
        _ => return None,
    };
    Some((key_id, value))
}

fn take<'a>(data: &mut &'a [u8], len: i32) -> Option<&'a [u8]> {
    let n = usize::try_from(len).ok()?;
    if data.len() < n {
        return None;
    }
    let (head, rest) = data.split_at(n);
    *data = rest;
    Some(head)
}

/// Renders `"name":value`. Text is written as-is between quotes; it was
/// JSON-escaped in the source and never decoded.
pub fn write_json_field<W: Write>(out: &mut W, name: &[u8], value: &Value<&[u8]>) -> io::Result<()> {
    out.write_all(b"\"")?;
    out.write_all(name)?;
    out.write_all(b"\":")?;
    match value {
        Value::Bool(true) => out.write_all(b"true"),
        Value::Bool(false) => out.write_all(b"false"),
        Value::Number(n) => write!(out, "{n}"),
        Value::Text(t) => {
            out.write_all(b"\"")?;
            out.write_all(t)?;
            out.write_all(b"\"")
        }
    }
}
