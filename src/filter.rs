//! Decides which build output files end up in the archive
//!
//! Every candidate is checked against all rules before a decision is made:
//!
//! 1. The mod's own assembly is always packed (hidden-code if `hideCode`).
//! 2. Files matching a `buildIgnore` pattern are dropped, even with `includeSource`.
//! 3. Project sources are dropped unless `includeSource` is set.
//! 4. Anything else is a resource (hidden-resource if `hideResources`).

use crate::properties::{self, BuildProperties};
use crate::{Error, Result};
use log::{debug, warn};
use glob::{MatchOptions, Pattern};
use serde::Serialize;

/// Extensions of project source artifacts
const SOURCE_EXTENSIONS: &[&str] = &["cs", "csproj", "sln", "fx"];

/// Top-level directories holding intermediate build artifacts
const SOURCE_DIRECTORIES: &[&str] = &["bin/", "obj/"];

/// How the loader exposes an entry to tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Visibility {
    Normal,
    HiddenCode,
    HiddenResource,
}

impl Visibility {
    pub fn to_byte(self) -> u8 {
        match self {
            Visibility::Normal => 0,
            Visibility::HiddenCode => 1,
            Visibility::HiddenResource => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Visibility::Normal),
            1 => Some(Visibility::HiddenCode),
            2 => Some(Visibility::HiddenResource),
            _ => None,
        }
    }
}

/// Outcome of filtering one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Include(Visibility),
    /// Matched the given `buildIgnore` pattern
    Ignored(String),
    /// Project source without `includeSource`
    Source,
}

/// `*` and `?` never cross a `/`; `**` spans whole directories
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct IgnorePattern {
    source: String,
    glob: Pattern,
    /// Patterns without a `/` also match bare file names
    name_only: bool,
}

/// `buildIgnore` glob list
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<IgnorePattern>,
}

impl IgnorePatterns {
    /// Parse a `;`- or newline-separated pattern list
    pub fn parse(list: &str) -> Result<Self> {
        let mut patterns = Vec::new();

        for raw in list.split([';', '\n']) {
            let pattern = raw.trim().replace('\\', "/");
            let pattern = pattern.trim_start_matches('/');
            if pattern.is_empty() {
                continue;
            }

            let glob = Pattern::new(pattern).map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

            patterns.push(IgnorePattern {
                source: pattern.to_string(),
                glob,
                name_only: !pattern.contains('/'),
            });
        }

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// First pattern matching `relative_path`, if any
    pub fn matching(&self, relative_path: &str) -> Option<&str> {
        let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);

        self.patterns
            .iter()
            .find(|p| {
                p.glob.matches_with(relative_path, MATCH_OPTIONS)
                    || (p.name_only && p.glob.matches_with(file_name, MATCH_OPTIONS))
            })
            .map(|p| p.source.as_str())
    }
}

/// Filter flags resolved from the build properties
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    pub hide_code: bool,
    pub hide_resources: bool,
    pub include_source: bool,
    pub ignore: IgnorePatterns,
}

impl FilterRules {
    pub fn from_properties(props: &BuildProperties) -> Result<Self> {
        let ignore = match props.get(properties::BUILD_IGNORE) {
            Some(list) => IgnorePatterns::parse(list)?,
            None => IgnorePatterns::default(),
        };

        Ok(Self {
            hide_code: props.flag(properties::HIDE_CODE)?,
            hide_resources: props.flag(properties::HIDE_RESOURCES)?,
            include_source: props.flag(properties::INCLUDE_SOURCE)?,
            ignore,
        })
    }
}

/// Per-file include/exclude decisions for one mod
#[derive(Debug, Clone)]
pub struct FileFilter {
    rules: FilterRules,
    assembly: String,
}

impl FileFilter {
    /// `assembly` is the relative path of the mod's own assembly
    pub fn new(rules: FilterRules, assembly: impl Into<String>) -> Self {
        Self {
            rules,
            assembly: assembly.into(),
        }
    }

    pub fn decide(&self, relative_path: &str) -> Decision {
        let is_assembly = relative_path == self.assembly;
        let ignored_by = self.rules.ignore.matching(relative_path);
        let is_source = is_source_artifact(relative_path);

        let decision = if is_assembly {
            if let Some(pattern) = ignored_by {
                warn!(
                    "buildIgnore pattern '{}' matches the mod assembly {}; packing it anyway",
                    pattern, relative_path
                );
            }
            Decision::Include(if self.rules.hide_code {
                Visibility::HiddenCode
            } else {
                Visibility::Normal
            })
        } else if let Some(pattern) = ignored_by {
            Decision::Ignored(pattern.to_string())
        } else if is_source {
            if self.rules.include_source {
                Decision::Include(Visibility::Normal)
            } else {
                Decision::Source
            }
        } else if self.rules.hide_resources {
            Decision::Include(Visibility::HiddenResource)
        } else {
            Decision::Include(Visibility::Normal)
        };

        debug!("{} -> {:?}", relative_path, decision);
        decision
    }
}

/// Whether a file is part of the project's sources rather than its output
pub fn is_source_artifact(relative_path: &str) -> bool {
    if SOURCE_DIRECTORIES
        .iter()
        .any(|dir| relative_path.starts_with(dir))
    {
        return true;
    }

    let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => SOURCE_EXTENSIONS
            .iter()
            .any(|source| ext.eq_ignore_ascii_case(source)),
        _ => false,
    }
}
