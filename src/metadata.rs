//! Metadata block: build properties and declared references
//!
//! Layout (little-endian, see [`crate::codec`] for primitives):
//!
//! ```text
//! u32 version
//! u32 count, (key: str, value: str)*                 properties, insertion order
//! u32 count, (name: str, version: str, weak: u8)*    mod references
//! u32 count, (name: str, path: str, public: u8)*     assembly references
//! u32 count, (id: str, version: str, public: u8)*    package references
//! ```
//!
//! Unset properties are simply not listed, so an empty value stays
//! distinguishable from an absent one.

use crate::codec::{Decoder, WriteExt};
use crate::properties::BuildProperties;
use crate::references::{AssemblyReference, ModReference, NuGetReference, Reference, References};
use crate::{Error, Result};
use serde::Serialize;
use std::io;

/// Current metadata block version
pub const METADATA_VERSION: u32 = 1;

/// Smallest possible encoding of a string (its length prefix)
const MIN_STR: usize = 4;

/// Everything the loader needs to know about a mod besides its files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModMetadata {
    pub properties: BuildProperties,
    pub references: References,
}

impl ModMetadata {
    /// Bundle validated properties with the mod's references
    ///
    /// Fails with [`Error::MissingProperty`] when a required property is unset.
    pub fn new(properties: BuildProperties, references: References) -> Result<Self> {
        properties.validate()?;
        Ok(Self {
            properties,
            references,
        })
    }

    /// Serialize into a metadata block
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        buf.write_u32(METADATA_VERSION)?;

        buf.write_len(self.properties.len())?;
        for (key, value) in self.properties.iter() {
            buf.write_str(key)?;
            buf.write_str(value)?;
        }

        let refs = &self.references;
        write_references(buf, &refs.mods)?;
        write_references(buf, &refs.assemblies)?;
        write_references(buf, &refs.packages)?;

        Ok(())
    }

    /// Parse a metadata block, dispatching on its version
    pub fn decode(block: &[u8]) -> Result<Self> {
        let mut d = Decoder::new(block, "metadata block");
        let metadata = match d.u32()? {
            1 => decode_v1(&mut d)?,
            other => {
                return Err(Error::InvalidArchive(format!(
                    "unsupported metadata version {}",
                    other
                )))
            }
        };
        d.finish()?;
        Ok(metadata)
    }
}

/// `identifier`, `detail`, flag per row, after a `u32` count
fn write_references<R: Reference>(buf: &mut Vec<u8>, refs: &[R]) -> io::Result<()> {
    buf.write_len(refs.len())?;
    for r in refs {
        buf.write_str(r.identifier())?;
        buf.write_str(r.detail())?;
        buf.write_bool(r.flag())?;
    }
    Ok(())
}

fn decode_v1(d: &mut Decoder<'_>) -> Result<ModMetadata> {
    let mut properties = BuildProperties::new();
    for _ in 0..d.count(2 * MIN_STR)? {
        let key = d.string()?;
        let value = d.string()?;
        if properties.contains_key(&key) {
            return Err(Error::InvalidArchive(format!(
                "duplicate property '{}'",
                key
            )));
        }
        properties.insert(key, value);
    }

    let mut references = References::new();
    for _ in 0..d.count(2 * MIN_STR + 1)? {
        let name = d.string()?;
        let version = d.string()?;
        references
            .mods
            .push(ModReference::new(name, version, d.bool()?));
    }
    for _ in 0..d.count(2 * MIN_STR + 1)? {
        let name = d.string()?;
        let path = d.string()?;
        references
            .assemblies
            .push(AssemblyReference::new(name, path, d.bool()?));
    }
    for _ in 0..d.count(2 * MIN_STR + 1)? {
        let id = d.string()?;
        let version = d.string()?;
        references
            .packages
            .push(NuGetReference::new(id, version, d.bool()?));
    }

    Ok(ModMetadata {
        properties,
        references,
    })
}
