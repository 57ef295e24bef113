//! Enumerates the files a build produced

use crate::{Error, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Candidate files under a project's build output directory
#[derive(Debug, Clone)]
pub struct InputCollector {
    root: PathBuf,
    assembly_path: PathBuf,
    archive_path: Option<PathBuf>,
}

impl InputCollector {
    /// Prepare to collect `output_dir`, which must contain `<assembly_name>.dll`
    pub fn new(output_dir: &Path, assembly_name: &str) -> Result<Self> {
        let assembly_path = output_dir.join(format!("{}.dll", assembly_name));
        if !assembly_path.is_file() {
            return Err(Error::MissingOutput {
                path: assembly_path,
            });
        }

        let root = fs::canonicalize(output_dir)?;
        let assembly_path = root.join(format!("{}.dll", assembly_name));

        Ok(Self {
            root,
            assembly_path,
            archive_path: None,
        })
    }

    /// Never yield `archive` or its in-flight temporary files
    ///
    /// Needed when the archive is written into the directory being packed.
    pub fn skip_archive(mut self, archive: &Path) -> Self {
        let resolved = archive
            .parent()
            .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
            .and_then(|p| fs::canonicalize(p).ok())
            .zip(archive.file_name())
            .map(|(dir, name)| dir.join(name));

        self.archive_path = resolved.or_else(|| Some(archive.to_path_buf()));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assembly_path(&self) -> &Path {
        &self.assembly_path
    }

    /// Lazily walk the output directory, yielding absolute file paths
    pub fn files(&self) -> impl Iterator<Item = Result<PathBuf>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let path = entry.into_path();
                    if self.is_archive_output(&path) {
                        None
                    } else {
                        Some(Ok(path))
                    }
                }
                Ok(_) => None,
                Err(e) => Some(Err(Error::Io(e.into()))),
            })
    }

    fn is_archive_output(&self, path: &Path) -> bool {
        let Some(archive) = &self.archive_path else {
            return false;
        };
        if path == archive {
            return true;
        }

        match (archive.parent(), archive.file_name(), path.file_name()) {
            (Some(dir), Some(archive_name), Some(name)) => {
                path.parent() == Some(dir) && is_partial_archive(name, archive_name)
            }
            _ => false,
        }
    }
}

/// Name of the temporary file an archive is staged in, minus its random part
pub(crate) fn partial_archive_prefix(archive_name: &OsStr) -> String {
    format!(".{}.", archive_name.to_string_lossy())
}

pub(crate) const PARTIAL_ARCHIVE_SUFFIX: &str = ".tmp";

fn is_partial_archive(name: &OsStr, archive_name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with(&partial_archive_prefix(archive_name)) && name.ends_with(PARTIAL_ARCHIVE_SUFFIX)
}

/// Path of `path` relative to `root`, with `/` separators
pub fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        Error::Other(format!(
            "{} is not inside {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            Error::Other(format!("Path is not valid UTF-8: {}", path.display()))
        })?;
        parts.push(part);
    }

    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build_output(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, file.as_bytes()).unwrap();
        }
        dir
    }

    fn collect(collector: &InputCollector) -> Vec<String> {
        let mut files: Vec<String> = collector
            .files()
            .map(|p| relative_path(collector.root(), &p.unwrap()).unwrap())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_missing_assembly() {
        let dir = build_output(&["icon.png"]);
        match InputCollector::new(dir.path(), "MyMod") {
            Err(Error::MissingOutput { path }) => assert!(path.ends_with("MyMod.dll")),
            other => panic!("expected MissingOutput, got {:?}", other),
        }
    }

    #[test]
    fn test_collects_nested_files() {
        let dir = build_output(&["MyMod.dll", "icon.png", "Assets/Textures/sword.png"]);
        let collector = InputCollector::new(dir.path(), "MyMod").unwrap();

        assert_eq!(
            collect(&collector),
            vec!["Assets/Textures/sword.png", "MyMod.dll", "icon.png"]
        );
        assert!(collector.assembly_path().is_absolute());
    }

    #[test]
    fn test_skips_own_archive() {
        let dir = build_output(&[
            "MyMod.dll",
            "MyMod.tmod",
            ".MyMod.tmod.a1b2c3.tmp",
            "other.tmod",
        ]);
        let collector = InputCollector::new(dir.path(), "MyMod")
            .unwrap()
            .skip_archive(&dir.path().join("MyMod.tmod"));

        assert_eq!(collect(&collector), vec!["MyMod.dll", "other.tmod"]);
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/out");
        let path = Path::new("/out").join("a").join("b.txt");
        assert_eq!(relative_path(root, &path).unwrap(), "a/b.txt");
        assert!(relative_path(root, Path::new("/elsewhere/c")).is_err());
    }
}
