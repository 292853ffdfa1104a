use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

// All on-disk integers are little-endian regardless of host order.
pub fn write_i32<W: Write>(w: &mut W, v: i32) -> io::Result<()> { w.write_i32::<LE>(v) }
pub fn read_i32<R: Read>(r: &mut R) -> io::Result<i32> { r.read_i32::<LE>() }
pub fn write_u8<W: Write>(w: &mut W, v: u8) -> io::Result<()> { w.write_u8(v) }
pub fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> { r.read_u8() }

/// DJB2 string hash (`h = h * 33 + byte`), wrapping at 32 bits.
#[inline]
pub fn strhash(key: &[u8]) -> u32 {
    key.iter()
        .fold(5381u32, |h, &b| h.wrapping_shl(5).wrapping_add(h).wrapping_add(b as u32))
}

/// Replaces the extension of `path` with `ext`, or appends it if there is none.
pub fn change_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}
