use super::format::{self, Layout};
use super::{ArchiveEntry, ArchiveHeader};
use crate::compress::decompress;
use crate::metadata::ModMetadata;
use crate::{Error, Result};
use std::fs;
use std::ops::Range;
use std::path::Path;

/// Read and parse the archive at `path`
pub fn read_archive<P: AsRef<Path>>(path: P) -> Result<ModArchive> {
    ModArchive::open(path)
}

/// A parsed archive held in memory
///
/// # Examples
///
/// ```no_run
/// use collate::ModArchive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let archive = ModArchive::open("MyMod.tmod")?;
/// println!("{} {}", archive.header().mod_name, archive.header().mod_version);
///
/// for entry in archive.entries() {
///     println!("{} ({} bytes)", entry.path, entry.raw_len);
/// }
/// let icon = archive.extract("icon.png")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ModArchive {
    header: ArchiveHeader,
    metadata: ModMetadata,
    entries: Vec<ArchiveEntry>,
    payloads: Vec<Range<usize>>,
    data: Vec<u8>,
}

impl ModArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(fs::read(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let Layout {
            header,
            metadata,
            entries,
        } = format::decode(&data)?;

        let metadata = ModMetadata::decode(&data[metadata])?;

        let mut records = Vec::with_capacity(entries.len());
        let mut payloads = Vec::with_capacity(entries.len());
        for (entry, range) in entries {
            if records
                .last()
                .is_some_and(|prev: &ArchiveEntry| prev.path >= entry.path)
            {
                return Err(Error::InvalidArchive(format!(
                    "entry table is not sorted or has duplicates at '{}'",
                    entry.path
                )));
            }
            records.push(entry);
            payloads.push(range);
        }

        Ok(Self {
            header,
            metadata,
            entries: records,
            payloads,
            data,
        })
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn metadata(&self) -> &ModMetadata {
        &self.metadata
    }

    /// Entries in archive order (sorted by path)
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn entry(&self, path: &str) -> Option<&ArchiveEntry> {
        self.index_of(path).map(|idx| &self.entries[idx])
    }

    /// Bytes as stored, possibly deflated
    pub fn stored_bytes(&self, path: &str) -> Option<&[u8]> {
        self.index_of(path)
            .map(|idx| &self.data[self.payloads[idx].clone()])
    }

    /// Original bytes of an entry
    pub fn extract(&self, path: &str) -> Result<Vec<u8>> {
        let idx = self
            .index_of(path)
            .ok_or_else(|| Error::Other(format!("No such entry: {}", path)))?;
        let entry = &self.entries[idx];
        let stored = &self.data[self.payloads[idx].clone()];

        if entry.compressed {
            decompress(stored, entry.raw_len)
        } else {
            Ok(stored.to_vec())
        }
    }

    fn index_of(&self, path: &str) -> Option<usize> {
        self.entries
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{write_archive, PackedEntry};
    use crate::compress::CompressionPolicy;
    use crate::filter::Visibility;
    use crate::properties::BuildProperties;
    use crate::references::References;
    use tempfile::TempDir;

    fn metadata() -> ModMetadata {
        let props: BuildProperties = [
            ("displayName", "Reader Test"),
            ("author", "tests"),
            ("modVersion", "1.2.3"),
            ("side", "Both"),
        ]
        .into_iter()
        .collect();
        ModMetadata::new(props, References::new()).unwrap()
    }

    fn packed(path: &str, raw: Vec<u8>, visibility: Visibility) -> PackedEntry {
        let policy = CompressionPolicy {
            level: 6,
            min_size: 0,
        };
        let len = raw.len() as u64;
        PackedEntry::new(path, visibility, len, policy.compress(raw).unwrap())
    }

    fn written(entries: Vec<PackedEntry>) -> (TempDir, ModArchive) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ReaderTest.tmod");
        let header = ArchiveHeader::new("2024.5", "ReaderTest", "1.2.3");
        write_archive(&path, &header, &metadata().encode().unwrap(), entries).unwrap();
        let archive = ModArchive::open(&path).unwrap();
        (dir, archive)
    }

    #[test]
    fn test_open_and_extract() {
        let text = b"lorem ipsum ".repeat(100);
        let (_dir, archive) = written(vec![
            packed("Localization/en-US.hjson", text.clone(), Visibility::Normal),
            packed("ReaderTest.dll", vec![0x4D, 0x5A], Visibility::HiddenCode),
        ]);

        assert_eq!(archive.header().mod_name, "ReaderTest");
        assert_eq!(archive.header().loader_version, "2024.5");
        assert_eq!(archive.metadata(), &metadata());
        assert_eq!(archive.entries().len(), 2);

        let hjson = archive.entry("Localization/en-US.hjson").unwrap();
        assert!(hjson.compressed);
        assert_eq!(archive.extract("Localization/en-US.hjson").unwrap(), text);

        let dll = archive.entry("ReaderTest.dll").unwrap();
        assert!(!dll.compressed);
        assert_eq!(dll.visibility, Visibility::HiddenCode);
        assert_eq!(archive.stored_bytes("ReaderTest.dll").unwrap(), &[0x4Du8, 0x5A][..]);

        assert!(archive.extract("missing.png").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(ModArchive::from_bytes(b"definitely not an archive".to_vec()).is_err());
        assert!(ModArchive::from_bytes(Vec::new()).is_err());
    }

    #[test]
    fn test_rejects_truncated_file() {
        let (dir, _) = written(vec![packed("a.txt", b"abc".to_vec(), Visibility::Normal)]);
        let mut bytes = fs::read(dir.path().join("ReaderTest.tmod")).unwrap();
        bytes.pop();
        assert!(ModArchive::from_bytes(bytes).is_err());
    }

    #[test]
    fn test_extract_with_corrupt_raw_len() {
        let (dir, _) = written(vec![packed(
            "readme.txt",
            b"lorem ipsum ".repeat(200),
            Visibility::Normal,
        )]);
        let mut bytes = fs::read(dir.path().join("ReaderTest.tmod")).unwrap();

        // raw_len follows the path string and the visibility byte
        let name = b"readme.txt";
        let at = bytes
            .windows(name.len())
            .position(|w| w == name)
            .unwrap()
            + name.len()
            + 1;
        bytes[at..at + 8].copy_from_slice(&u64::MAX.to_le_bytes());

        let archive = ModArchive::from_bytes(bytes).unwrap();
        assert_eq!(archive.entry("readme.txt").unwrap().raw_len, u64::MAX);
        assert!(matches!(
            archive.extract("readme.txt"),
            Err(Error::InvalidArchive(_))
        ));
    }
}
