//! Declared dependencies of a mod
//!
//! The build tooling dumps three reference lists next to the project before
//! packaging. Each list is newline-separated with `;`-separated columns:
//!
//! | Kind     | Row                                      |
//! |----------|------------------------------------------|
//! | Mod      | `name;versionConstraint;weakFlag`        |
//! | Assembly | `filePath;publicFlag`                    |
//! | Package  | `packageId;versionOrHintPath;publicFlag` |
//!
//! Flags are `true`/`false` (any case) or empty for `false`.

use crate::properties::parse_bool;
use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Common view over the three reference kinds
pub trait Reference {
    /// Name the loader resolves this reference by
    fn identifier(&self) -> &str;

    /// Version constraint for mods, file path for assemblies, version or
    /// hint path for packages
    fn detail(&self) -> &str;

    /// Weak flag for mods, public flag for assemblies and packages
    fn flag(&self) -> bool;
}

/// Dependency on another mod
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModReference {
    pub name: String,
    pub version: String,
    /// Optional dependency that only affects load order
    pub weak: bool,
}

/// Dependency on a plain assembly shipped with the mod
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyReference {
    pub name: String,
    pub path: String,
    pub public: bool,
}

/// Dependency on an external NuGet package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NuGetReference {
    pub id: String,
    pub version: String,
    pub public: bool,
}

impl ModReference {
    pub fn new(name: impl Into<String>, version: impl Into<String>, weak: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            weak,
        }
    }
}

impl AssemblyReference {
    pub fn new(name: impl Into<String>, path: impl Into<String>, public: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            public,
        }
    }

    /// Build a reference from a file path, naming it after the file stem
    pub fn from_path(path: &str, public: bool) -> Self {
        // Paths come from Windows build hosts too, so split on both separators.
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let name = match file_name.rfind('.') {
            Some(idx) if idx > 0 => &file_name[..idx],
            _ => file_name,
        };
        Self::new(name, path, public)
    }
}

impl NuGetReference {
    pub fn new(id: impl Into<String>, version: impl Into<String>, public: bool) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            public,
        }
    }
}

impl Reference for ModReference {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn detail(&self) -> &str {
        &self.version
    }

    fn flag(&self) -> bool {
        self.weak
    }
}

impl Reference for AssemblyReference {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn detail(&self) -> &str {
        &self.path
    }

    fn flag(&self) -> bool {
        self.public
    }
}

impl Reference for NuGetReference {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn detail(&self) -> &str {
        &self.version
    }

    fn flag(&self) -> bool {
        self.public
    }
}

/// All references of a mod, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct References {
    pub mods: Vec<ModReference>,
    pub assemblies: Vec<AssemblyReference>,
    pub packages: Vec<NuGetReference>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load reference lists written by the build tooling
    ///
    /// A list whose path is `None` contributes no references.
    pub fn load(
        mod_refs: Option<&Path>,
        assembly_refs: Option<&Path>,
        package_refs: Option<&Path>,
    ) -> Result<Self> {
        Ok(Self {
            mods: read_list(mod_refs, parse_mod_references)?,
            assemblies: read_list(assembly_refs, parse_assembly_references)?,
            packages: read_list(package_refs, parse_package_references)?,
        })
    }

    pub fn len(&self) -> usize {
        self.mods.len() + self.assemblies.len() + self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read_list<T>(
    path: Option<&Path>,
    parse: fn(&str, &Path) -> Result<Vec<T>>,
) -> Result<Vec<T>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
            parse(&text, path)
        }
        None => Ok(Vec::new()),
    }
}

/// Parse `name;versionConstraint;weakFlag` rows
pub fn parse_mod_references(text: &str, file: &Path) -> Result<Vec<ModReference>> {
    parse_rows(text, file, 3, |cols, row| {
        Ok(ModReference::new(cols[0], cols[1], row.flag(cols[2])?))
    })
}

/// Parse `filePath;publicFlag` rows
pub fn parse_assembly_references(text: &str, file: &Path) -> Result<Vec<AssemblyReference>> {
    parse_rows(text, file, 2, |cols, row| {
        Ok(AssemblyReference::from_path(cols[0], row.flag(cols[1])?))
    })
}

/// Parse `packageId;versionOrHintPath;publicFlag` rows
pub fn parse_package_references(text: &str, file: &Path) -> Result<Vec<NuGetReference>> {
    parse_rows(text, file, 3, |cols, row| {
        Ok(NuGetReference::new(cols[0], cols[1], row.flag(cols[2])?))
    })
}

/// Position of a row, used to build errors
struct Row<'a> {
    file: &'a Path,
    line: usize,
}

impl Row<'_> {
    fn error(&self, reason: impl Into<String>) -> Error {
        Error::MalformedReferenceRow {
            file: PathBuf::from(self.file),
            line: self.line,
            reason: reason.into(),
        }
    }

    fn flag(&self, value: &str) -> Result<bool> {
        if value.trim().is_empty() {
            return Ok(false);
        }
        parse_bool(value).ok_or_else(|| self.error(format!("invalid boolean '{}'", value)))
    }
}

fn parse_rows<T>(
    text: &str,
    file: &Path,
    columns: usize,
    build: impl Fn(&[&str], &Row<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut refs = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let row = Row {
            file,
            line: idx + 1,
        };
        let cols: Vec<&str> = line.split(';').collect();
        if cols.len() != columns {
            return Err(row.error(format!(
                "expected {} columns, found {}",
                columns,
                cols.len()
            )));
        }

        refs.push(build(&cols, &row)?);
    }

    Ok(refs)
}
