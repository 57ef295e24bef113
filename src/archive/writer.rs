use super::format::write_prelude;
use super::{ArchiveHeader, PackedEntry};
use crate::collector::{partial_archive_prefix, PARTIAL_ARCHIVE_SUFFIX};
use crate::{Error, Result};
use log::{debug, info};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write an archive to `path` atomically
///
/// The archive is staged in a temporary file next to `path` and renamed into
/// place once complete, so `path` never holds a partial archive. The staging
/// file is removed on every error path. If the process dies mid-write a
/// `.<name>.*.tmp` file may remain next to the output; removing it is up to
/// the caller.
///
/// Entries are written sorted by path. Returns the archive size in bytes.
pub fn write_archive(
    path: &Path,
    header: &ArchiveHeader,
    metadata: &[u8],
    mut entries: Vec<PackedEntry>,
) -> Result<u64> {
    entries.sort_by(|a, b| a.entry.path.cmp(&b.entry.path));
    if let Some(pair) = entries
        .windows(2)
        .find(|pair| pair[0].entry.path == pair[1].entry.path)
    {
        return Err(Error::Other(format!(
            "Duplicate archive entry: {}",
            pair[0].entry.path
        )));
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Other(format!("Invalid output path: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::write(path, e))?;

    let mut staged = tempfile::Builder::new()
        .prefix(&partial_archive_prefix(file_name))
        .suffix(PARTIAL_ARCHIVE_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| Error::write(path, e))?;
    debug!("Staging archive in {}", staged.path().display());

    {
        let mut out = BufWriter::new(staged.as_file_mut());
        write_contents(&mut out, path, header, metadata, &entries)?;
    }
    let file = staged.as_file();
    file.sync_all().map_err(|e| Error::write(path, e))?;
    let size = file.metadata().map_err(|e| Error::write(path, e))?.len();

    staged.persist(path).map_err(|e| Error::write(path, e.error))?;

    info!(
        "Wrote {} ({} entries, {} bytes)",
        path.display(),
        entries.len(),
        size
    );
    Ok(size)
}

/// Prelude then payloads; any failure is reported against `path`
fn write_contents<W: Write>(
    out: &mut W,
    path: &Path,
    header: &ArchiveHeader,
    metadata: &[u8],
    entries: &[PackedEntry],
) -> Result<()> {
    let records: Vec<_> = entries.iter().map(|e| &e.entry).collect();
    write_prelude(out, header, metadata, &records).map_err(|e| Error::write(path, e))?;
    for entry in entries {
        out.write_all(&entry.payload)
            .map_err(|e| Error::write(path, e))?;
    }
    out.flush().map_err(|e| Error::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::CompressedData;
    use crate::filter::Visibility;
    use tempfile::TempDir;

    fn stored(path: &str, bytes: &[u8]) -> PackedEntry {
        PackedEntry::new(
            path,
            Visibility::Normal,
            bytes.len() as u64,
            CompressedData {
                payload: bytes.to_vec(),
                compressed: false,
            },
        )
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(PARTIAL_ARCHIVE_SUFFIX))
            .collect()
    }

    #[test]
    fn test_writes_sorted_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("MyMod.tmod");
        let header = ArchiveHeader::new("2024.5", "MyMod", "1.0");

        let size = write_archive(
            &path,
            &header,
            b"",
            vec![stored("b.txt", b"bb"), stored("a.txt", b"a")],
        )
        .unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, size);
        assert!(bytes.ends_with(b"abb"));
        assert!(leftovers(path.parent().unwrap()).is_empty());
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("MyMod.tmod");
        let header = ArchiveHeader::new("2024.5", "MyMod", "1.0");

        let result = write_archive(
            &path,
            &header,
            b"",
            vec![stored("a.txt", b"1"), stored("a.txt", b"2")],
        );
        assert!(result.is_err());
        assert!(!path.exists());
    }

    /// Accepts `limit` bytes, then fails
    struct ShortWriter {
        limit: usize,
        written: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "disk full"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_prelude_failure_names_archive() {
        let path = Path::new("mods/MyMod.tmod");
        let header = ArchiveHeader::new("2024.5", "MyMod", "1.0");
        let entries = vec![stored("a.txt", b"payload")];

        for limit in [0, 6, 40] {
            let mut out = ShortWriter { limit, written: 0 };
            match write_contents(&mut out, path, &header, b"meta", &entries) {
                Err(Error::Write { path: p, .. }) => assert_eq!(p, path),
                other => panic!("expected Write error at limit {}, got {:?}", limit, other),
            }
        }
    }

    #[test]
    fn test_failed_rename_cleans_up() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the output path makes the rename fail.
        let path = dir.path().join("MyMod.tmod");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();
        let header = ArchiveHeader::new("2024.5", "MyMod", "1.0");

        match write_archive(&path, &header, b"", vec![stored("a.txt", b"1")]) {
            Err(Error::Write { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Write error, got {:?}", other),
        }
        assert!(leftovers(dir.path()).is_empty());
        assert!(path.join("keep").exists());
    }
}
