//! The `.tmod` container
//!
//! ```text
//! magic        "CLTM"
//! version      u32
//! loader_ver   str
//! mod_name     str
//! mod_version  str
//! meta_len     u32
//! metadata     meta_len bytes
//! entry_count  u32
//! entries      { path str, visibility u8, raw_len u64, stored_len u64, compressed u8 }*
//! payloads     concatenated in entry order
//! ```
//!
//! Entries are sorted by path, so identical inputs give identical archives.

mod format;
mod reader;
mod writer;

pub use format::{FormatVersion, MAGIC};
pub use reader::{read_archive, ModArchive};
pub use writer::write_archive;

use crate::compress::CompressedData;
use crate::filter::Visibility;
use serde::Serialize;

/// Fixed fields at the start of every archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveHeader {
    #[serde(skip)]
    pub format: FormatVersion,
    /// Mod loader version the mod was built against
    pub loader_version: String,
    pub mod_name: String,
    pub mod_version: String,
}

impl ArchiveHeader {
    pub fn new(
        loader_version: impl Into<String>,
        mod_name: impl Into<String>,
        mod_version: impl Into<String>,
    ) -> Self {
        Self {
            format: FormatVersion::CURRENT,
            loader_version: loader_version.into(),
            mod_name: mod_name.into(),
            mod_version: mod_version.into(),
        }
    }
}

/// Entry table record for one packed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    /// `/`-separated path relative to the build output directory
    pub path: String,
    pub visibility: Visibility,
    pub raw_len: u64,
    pub stored_len: u64,
    pub compressed: bool,
}

/// An entry together with the bytes stored for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedEntry {
    pub entry: ArchiveEntry,
    pub payload: Vec<u8>,
}

impl PackedEntry {
    pub fn new(
        path: impl Into<String>,
        visibility: Visibility,
        raw_len: u64,
        data: CompressedData,
    ) -> Self {
        Self {
            entry: ArchiveEntry {
                path: path.into(),
                visibility,
                raw_len,
                stored_len: data.payload.len() as u64,
                compressed: data.compressed,
            },
            payload: data.payload,
        }
    }
}
