//! Unpacking: TLV record stream + loaded dictionary → one JSON object per line.

use crate::dict::LoadedDictionary;
use crate::errors::{JpakError, Result};
use crate::record::{read_field, read_record, write_json_field};
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnpackStats {
    pub records: u64,
    pub fields: u64,
}

/// Decodes every record in `data`. Stops cleanly at the end of the slice;
/// anything truncated or inconsistent after a record starts is an error.
pub fn unpack<W: Write>(mut data: &[u8], dict: &LoadedDictionary, out: &mut W) -> Result<UnpackStats> {
    let mut stats = UnpackStats::default();
    while !data.is_empty() {
        let mut fields = read_record(&mut data)?;
        out.write_all(b"{")?;
        let mut first = true;
        while !fields.is_empty() {
            let (key_id, value) = read_field(&mut fields)?;
            let name = dict.name(key_id).ok_or(JpakError::MissingKey(key_id))?;
            if !first {
                out.write_all(b",")?;
            }
            first = false;
            write_json_field(out, name, &value)?;
            stats.fields += 1;
        }
        out.write_all(b"}\n")?;
        stats.records += 1;
    }
    out.flush()?;
    debug!(records = stats.records, fields = stats.fields, "unpack complete");
    Ok(stats)
}
