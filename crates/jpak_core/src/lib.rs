//! jpak: packs flat JSON-like records into a compact TLV binary stream with
//! a side dictionary of field names, and unpacks them back to JSON lines.

pub mod consts;
pub mod errors;
pub mod utils;
pub mod table;
pub mod intern;
pub mod lexer;
pub mod record;
pub mod dict;
pub mod pack;
pub mod unpack;
pub mod files;

pub use dict::{KeyDictionary, LoadedDictionary};
pub use errors::{JpakError, Result};
pub use files::{load_dictionary, pack_file, pack_reader, unpack_file, PackPaths};
pub use pack::{pack, PackStats, Packer};
pub use table::{HashTable, TableValue};
pub use unpack::{unpack, UnpackStats};
