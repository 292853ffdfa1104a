//! File-level pack/unpack.
//!
//! Outputs are written to a temp file in the destination directory and only
//! persisted (renamed over the final path) once the whole run succeeded.
//! Inputs for unpacking are memory-mapped read-only.

use crate::consts::{BIN_EXT, DICT_EXT};
use crate::dict::LoadedDictionary;
use crate::errors::{JpakError, Result};
use crate::pack::{pack, PackStats};
use crate::unpack::{unpack, UnpackStats};
use crate::utils::change_extension;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, IntoInnerError, Read, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Output locations of a pack run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackPaths {
    pub binary: PathBuf,
    pub dict: PathBuf,
}

impl PackPaths {
    /// `<stem>.bj` and `<stem>.dict` next to `input`.
    pub fn beside(input: &Path) -> Self {
        Self {
            binary: change_extension(input, BIN_EXT),
            dict: change_extension(input, DICT_EXT),
        }
    }
}

fn stage(path: &Path) -> Result<BufWriter<NamedTempFile>> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".jpak_")
        .tempfile_in(dir)
        .map_err(|source| JpakError::Open { path: path.to_path_buf(), source })?;
    Ok(BufWriter::new(tmp))
}

fn publish(w: BufWriter<NamedTempFile>, path: &Path) -> Result<()> {
    let tmp = w.into_inner().map_err(IntoInnerError::into_error)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    debug!(path = %path.display(), "published");
    Ok(())
}

/// Packs `input` into the two files named by `paths`.
pub fn pack_reader<R: Read>(input: R, paths: &PackPaths) -> Result<PackStats> {
    let mut bin = stage(&paths.binary)?;
    let mut dict = stage(&paths.dict)?;
    let (keys, stats) = pack(input, &mut bin)?;
    keys.write_to(&mut dict)?;
    dict.flush()?;
    publish(bin, &paths.binary)?;
    publish(dict, &paths.dict)?;
    info!(
        records = stats.records,
        keys = stats.keys,
        binary = %paths.binary.display(),
        dict = %paths.dict.display(),
        "packed"
    );
    Ok(stats)
}

/// Packs the file at `input` into `<stem>.bj` / `<stem>.dict` beside it.
pub fn pack_file(input: &Path) -> Result<(PackPaths, PackStats)> {
    let f = File::open(input).map_err(|source| JpakError::Open { path: input.to_path_buf(), source })?;
    let paths = PackPaths::beside(input);
    let stats = pack_reader(f, &paths)?;
    Ok((paths, stats))
}

/// Read-only view of an input file.
pub enum MappedFile {
    Map(Mmap),
    Empty,
}

impl MappedFile {
    pub fn open(path: &Path) -> Result<Self> {
        let f = File::open(path).map_err(|source| JpakError::Open { path: path.to_path_buf(), source })?;
        if f.metadata()?.len() == 0 {
            return Ok(MappedFile::Empty);
        }
        // the file is only read, and not expected to change while mapped
        let mmap = unsafe { Mmap::map(&f)? };
        Ok(MappedFile::Map(mmap))
    }
}

impl Deref for MappedFile {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self {
            MappedFile::Map(m) => &m[..],
            MappedFile::Empty => &[],
        }
    }
}

pub fn load_dictionary(path: &Path) -> Result<LoadedDictionary> {
    let data = MappedFile::open(path)?;
    let dict = LoadedDictionary::load(&data)?;
    debug!(path = %path.display(), entries = dict.len(), "dictionary loaded");
    Ok(dict)
}

/// Unpacks the record file at `binary` into JSON lines at `output`.
pub fn unpack_file(binary: &Path, dict: &LoadedDictionary, output: &Path) -> Result<UnpackStats> {
    let data = MappedFile::open(binary)?;
    let mut out = stage(output)?;
    let stats = unpack(&data, dict, &mut out)?;
    publish(out, output)?;
    info!(records = stats.records, output = %output.display(), "unpacked");
    Ok(stats)
}
