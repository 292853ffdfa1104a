//! Key dictionary: field name ↔ dense integer id.
//!
//! Dictionary file (LE), zero or more entries in no particular order:
//!   tag[1]  = STRING
//!   len[4]  = 4 + name length
//!   id[4]
//!   name[len - 4]

use crate::consts::{Tag, KEY_ID_SIZE};
use crate::errors::{JpakError, Result};
use crate::table::{HashTable, TableValue};
use crate::utils::{read_i32, read_u8, write_i32, write_u8};
use std::io::Write;
use tracing::warn;

/// Assigns ids to field names in first-seen order, starting at 0.
#[derive(Default)]
pub struct KeyDictionary {
    ids: HashTable,
    next_id: i32,
}

impl KeyDictionary {
    pub fn new() -> Self { Self::default() }

    /// Id of `name`, assigning the next one if the name is new.
    pub fn id_or_assign(&mut self, name: &[u8]) -> i32 {
        if let Some(id) = self.id(name) {
            return id;
        }
        let id = self.next_id;
        self.ids.put(name.into(), TableValue::Int(id));
        self.next_id += 1;
        id
    }

    pub fn id(&self, name: &[u8]) -> Option<i32> {
        self.ids.get(name).and_then(TableValue::as_int)
    }

    pub fn len(&self) -> usize { self.ids.len() }
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// (name, id) in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], i32)> + '_ {
        self.ids.iter().filter_map(|(k, v)| v.as_int().map(|id| (k, id)))
    }

    /// Writes every entry in table order; returns the bytes written.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<u64> {
        let mut written = 0u64;
        for (name, id) in self.iter() {
            let len = entry_len(name)?;
            write_u8(w, Tag::Str as u8)?;
            write_i32(w, len)?;
            write_i32(w, id)?;
            w.write_all(name)?;
            written += 1 + 4 + len as u64;
        }
        Ok(written)
    }
}

fn entry_len(name: &[u8]) -> Result<i32> {
    i32::try_from(name.len())
        .ok()
        .and_then(|n| n.checked_add(KEY_ID_SIZE))
        .ok_or(JpakError::RecordTooLarge(name.len() as u64))
}

/// Id → name map materialized from a dictionary file.
#[derive(Default)]
pub struct LoadedDictionary {
    // the table is keyed by bytes, so ids are stored as their decimal text
    names: HashTable,
}

impl LoadedDictionary {
    pub fn load(mut data: &[u8]) -> Result<Self> {
        let mut names = HashTable::new();
        while !data.is_empty() {
            let (id, name) = read_entry(&mut data).ok_or(JpakError::MalformedDictionary)?;
            let prev = names.put(id_key(id), TableValue::Text(name.into()));
            if prev.is_some() {
                warn!(id, "duplicate dictionary id, keeping the later name");
            }
        }
        Ok(Self { names })
    }

    pub fn name(&self, id: i32) -> Option<&[u8]> {
        self.names.get(&id_key(id)).and_then(TableValue::as_text)
    }

    pub fn len(&self) -> usize { self.names.len() }
    pub fn is_empty(&self) -> bool { self.names.is_empty() }

    /// (id, name) sorted by id.
    pub fn entries_by_id(&self) -> Vec<(i32, &[u8])> {
        let mut out: Vec<(i32, &[u8])> = self
            .names
            .iter()
            .filter_map(|(k, v)| {
                let id = std::str::from_utf8(k).ok()?.parse::<i32>().ok()?;
                Some((id, v.as_text()?))
            })
            .collect();
        out.sort_unstable_by_key(|(id, _)| *id);
        out
    }
}

fn id_key(id: i32) -> Box<[u8]> {
    id.to_string().into_bytes().into_boxed_slice()
}

fn read_entry<'a>(data: &mut &'a [u8]) -> Option<(i32, &'a [u8])> {
    let tag = read_u8(data).ok()?;
    let len = read_i32(data).ok()?;
    if tag != Tag::Str as u8 || len < KEY_ID_SIZE {
        return None;
    }
    let id = read_i32(data).ok()?;
    let n = (len - KEY_ID_SIZE) as usize;
    if data.len() < n {
        return None;
    }
    let (name, rest) = data.split_at(n);
    *data = rest;
    Some((id, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_first_occurrence() {
        let mut d = KeyDictionary::new();
        assert_eq!(d.id_or_assign(b"name"), 0);
        assert_eq!(d.id_or_assign(b"age"), 1);
        assert_eq!(d.id_or_assign(b"name"), 0);
        assert_eq!(d.id_or_assign(b"ok"), 2);
        assert_eq!(d.id_or_assign(b"age"), 1);
        assert_eq!(d.len(), 3);
        assert_eq!(d.id(b"ok"), Some(2));
        assert_eq!(d.id(b"missing"), None);
    }

    #[test]
    fn dictionary_file_loads_back() {
        let mut d = KeyDictionary::new();
        for k in ["name", "age", "ok", ""] {
            d.id_or_assign(k.as_bytes());
        }
        let mut buf = Vec::new();
        let n = d.write_to(&mut buf).unwrap();
        assert_eq!(n as usize, buf.len());
        // 4 headers of 9 bytes + name bytes
        assert_eq!(buf.len(), 4 * 9 + 4 + 3 + 2);

        let loaded = LoadedDictionary::load(&buf).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.name(0), Some(&b"name"[..]));
        assert_eq!(loaded.name(1), Some(&b"age"[..]));
        assert_eq!(loaded.name(2), Some(&b"ok"[..]));
        assert_eq!(loaded.name(3), Some(&b""[..]));
        assert_eq!(loaded.name(4), None);

        let ids: Vec<i32> = loaded.entries_by_id().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn entry_layout_is_tag_len_id_name() {
        let mut d = KeyDictionary::new();
        d.id_or_assign(b"a");
        let mut buf = Vec::new();
        d.write_to(&mut buf).unwrap();
        assert_eq!(buf, [Tag::Str as u8, 5, 0, 0, 0, 0, 0, 0, 0, b'a']);
    }

    #[test]
    fn empty_file_is_an_empty_dictionary() {
        assert!(LoadedDictionary::load(&[]).unwrap().is_empty());
    }

    #[test]
    fn truncated_entries_are_malformed() {
        let mut d = KeyDictionary::new();
        d.id_or_assign(b"field");
        let mut buf = Vec::new();
        d.write_to(&mut buf).unwrap();
        for cut in 1..buf.len() {
            assert!(
                matches!(LoadedDictionary::load(&buf[..cut]), Err(JpakError::MalformedDictionary)),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn wrong_tag_or_short_length_is_malformed() {
        let bad_tag = [Tag::Num as u8, 4, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(LoadedDictionary::load(&bad_tag), Err(JpakError::MalformedDictionary)));
        let short = [Tag::Str as u8, 3, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(LoadedDictionary::load(&short), Err(JpakError::MalformedDictionary)));
    }

    #[test]
    fn duplicate_id_keeps_later_name() {
        let mut buf = Vec::new();
        for name in [&b"x"[..], b"y"] {
            buf.push(Tag::Str as u8);
            buf.extend_from_slice(&5i32.to_le_bytes());
            buf.extend_from_slice(&7i32.to_le_bytes());
            buf.extend_from_slice(name);
        }
        let loaded = LoadedDictionary::load(&buf).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.name(7), Some(&b"y"[..]));
    }
}
