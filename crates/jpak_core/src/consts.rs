// crates/jpak_core/src/consts.rs

/// Maximum byte length of a single lexed token (string contents, digits or letters).
pub const MAX_TOKEN: usize = 4096;

/// Extension of the packed record file.
pub const BIN_EXT: &str = "bj";
/// Extension of the key dictionary file.
pub const DICT_EXT: &str = "dict";
/// Path stem used for outputs when packing from stdin.
pub const STDIN_STEM: &str = "records.json";

/// Tag byte in front of every TLV unit. The values are shared with the
/// lexer's token numbering and must not change.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Str = 6,
    Num = 7,
    True = 8,
    False = 9,
    Record = 10,
}

impl Tag {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            6 => Some(Tag::Str),
            7 => Some(Tag::Num),
            8 => Some(Tag::True),
            9 => Some(Tag::False),
            10 => Some(Tag::Record),
            _ => None,
        }
    }
}

/// Bytes of a field's `length` taken up by the key id.
pub const KEY_ID_SIZE: i32 = 4;
