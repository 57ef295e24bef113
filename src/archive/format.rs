use super::{ArchiveEntry, ArchiveHeader};
use crate::codec::{Decoder, WriteExt};
use crate::filter::Visibility;
use crate::{Error, Result};
use std::io::{self, Write};
use std::ops::Range;

/// Leading bytes of every archive
pub const MAGIC: [u8; 4] = *b"CLTM";

/// Container layouts this crate can read
///
/// New layouts get a new variant and decoder; existing decoders stay as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    V1,
}

impl FormatVersion {
    /// Version written by this crate
    pub const CURRENT: FormatVersion = FormatVersion::V1;

    pub fn token(self) -> u32 {
        match self {
            FormatVersion::V1 => 1,
        }
    }

    pub fn from_token(token: u32) -> Result<Self> {
        match token {
            1 => Ok(FormatVersion::V1),
            other => Err(Error::UnsupportedFormatVersion(other)),
        }
    }
}

/// Parsed archive layout, with payloads as ranges into the source buffer
pub(crate) struct Layout {
    pub header: ArchiveHeader,
    pub metadata: Range<usize>,
    pub entries: Vec<(ArchiveEntry, Range<usize>)>,
}

/// Everything before the payloads
pub(crate) fn write_prelude<W: Write>(
    out: &mut W,
    header: &ArchiveHeader,
    metadata: &[u8],
    entries: &[&ArchiveEntry],
) -> io::Result<()> {
    out.write_all(&MAGIC)?;
    out.write_u32(header.format.token())?;

    match header.format {
        FormatVersion::V1 => {
            out.write_str(&header.loader_version)?;
            out.write_str(&header.mod_name)?;
            out.write_str(&header.mod_version)?;

            out.write_len(metadata.len())?;
            out.write_all(metadata)?;

            out.write_len(entries.len())?;
            for entry in entries {
                out.write_str(&entry.path)?;
                out.write_u8(entry.visibility.to_byte())?;
                out.write_u64(entry.raw_len)?;
                out.write_u64(entry.stored_len)?;
                out.write_bool(entry.compressed)?;
            }
        }
    }

    Ok(())
}

/// Read the magic and version token, then hand off to that version's decoder
pub(crate) fn decode(data: &[u8]) -> Result<Layout> {
    let mut d = Decoder::new(data, "archive");

    if d.bytes(MAGIC.len())? != MAGIC {
        return Err(Error::InvalidArchive("not a mod archive (bad magic)".to_string()));
    }

    match FormatVersion::from_token(d.u32()?)? {
        FormatVersion::V1 => decode_v1(&mut d),
    }
}

/// path length prefix + visibility + two lengths + flag
const MIN_ENTRY_V1: usize = 4 + 1 + 8 + 8 + 1;

fn decode_v1(d: &mut Decoder<'_>) -> Result<Layout> {
    let header = ArchiveHeader {
        format: FormatVersion::V1,
        loader_version: d.string()?,
        mod_name: d.string()?,
        mod_version: d.string()?,
    };

    let meta_len = d.u32()? as usize;
    let meta_start = d.position();
    d.bytes(meta_len)?;
    let metadata = meta_start..meta_start + meta_len;

    let count = d.count(MIN_ENTRY_V1)?;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let path = d.string()?;
        let visibility_byte = d.u8()?;
        let visibility = Visibility::from_byte(visibility_byte).ok_or_else(|| {
            Error::InvalidArchive(format!(
                "entry '{}' has unknown visibility {}",
                path, visibility_byte
            ))
        })?;
        let raw_len = d.u64()?;
        let stored_len = d.u64()?;
        let compressed = d.bool()?;

        if !compressed && stored_len != raw_len {
            return Err(Error::InvalidArchive(format!(
                "stored entry '{}' has length {} but raw length {}",
                path, stored_len, raw_len
            )));
        }

        records.push(ArchiveEntry {
            path,
            visibility,
            raw_len,
            stored_len,
            compressed,
        });
    }

    let mut entries = Vec::with_capacity(records.len());
    for entry in records {
        let len = usize::try_from(entry.stored_len).map_err(|_| {
            Error::InvalidArchive(format!("entry '{}' is too large", entry.path))
        })?;
        let start = d.position();
        d.bytes(len)?;
        entries.push((entry, start..start + len));
    }
    d.finish()?;

    Ok(Layout {
        header,
        metadata,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_tokens() {
        assert_eq!(FormatVersion::from_token(1).unwrap(), FormatVersion::V1);
        assert_eq!(FormatVersion::CURRENT.token(), 1);
        assert!(matches!(
            FormatVersion::from_token(2),
            Err(Error::UnsupportedFormatVersion(2))
        ));
    }

    #[test]
    fn test_prelude_round_trip() {
        let header = ArchiveHeader::new("2024.5", "MyMod", "1.0");
        let entry = ArchiveEntry {
            path: "icon.png".to_string(),
            visibility: Visibility::HiddenResource,
            raw_len: 3,
            stored_len: 3,
            compressed: false,
        };

        let mut buf = Vec::new();
        write_prelude(&mut buf, &header, b"meta", &[&entry]).unwrap();
        buf.extend_from_slice(b"abc");

        let layout = decode(&buf).unwrap();
        assert_eq!(layout.header, header);
        assert_eq!(&buf[layout.metadata.clone()], b"meta");
        assert_eq!(layout.entries.len(), 1);
        assert_eq!(layout.entries[0].0, entry);
        assert_eq!(&buf[layout.entries[0].1.clone()], b"abc");
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(
            decode(b"PK\x03\x04rest"),
            Err(Error::InvalidArchive(_))
        ));
    }

    #[test]
    fn test_unknown_version() {
        let mut buf = MAGIC.to_vec();
        buf.extend_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            decode(&buf),
            Err(Error::UnsupportedFormatVersion(7))
        ));
    }

    #[test]
    fn test_missing_payload() {
        let header = ArchiveHeader::new("2024.5", "MyMod", "1.0");
        let entry = ArchiveEntry {
            path: "a.txt".to_string(),
            visibility: Visibility::Normal,
            raw_len: 10,
            stored_len: 10,
            compressed: false,
        };

        let mut buf = Vec::new();
        write_prelude(&mut buf, &header, b"", &[&entry]).unwrap();
        buf.extend_from_slice(b"short");
        assert!(decode(&buf).is_err());
    }
}
