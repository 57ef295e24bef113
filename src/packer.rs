//! Mod packaging: build output in, `.tmod` archive out
//!
//! # Examples
//!
//! ```no_run
//! use collate::{pack_mod, BuildProperties, PackingOptions, References};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let properties: BuildProperties = [
//!     ("displayName", "My Mod"),
//!     ("author", "me"),
//!     ("modVersion", "1.0.0"),
//!     ("side", "Both"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let options = PackingOptions::new("MyMod", "MyMod/bin/Release", "MyMod", "2024.5", "MyMod.tmod")
//!     .with_properties(properties)
//!     .with_references(References::new());
//!
//! let summary = pack_mod(&options)?;
//! println!("Packed {} files", summary.entries.len());
//! # Ok(())
//! # }
//! ```

use crate::archive::{write_archive, ArchiveEntry, ArchiveHeader, PackedEntry};
use crate::collector::{relative_path, InputCollector};
use crate::compress::CompressionPolicy;
use crate::config::PackingConfig;
use crate::filter::{Decision, FileFilter, FilterRules, Visibility};
use crate::metadata::ModMetadata;
use crate::properties::{BuildProperties, MOD_VERSION};
use crate::references::References;
use crate::{Error, Result};
use log::debug;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Progress callback for packaging
///
/// Called with:
/// - `message`: Description of current operation (e.g., the file just compressed)
/// - `current`: Files processed so far
/// - `total`: Files to process
pub type ProgressCallback = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

/// Inputs of one packaging run
#[derive(Debug, Clone)]
pub struct PackingOptions {
    /// Project directory (where the reference lists and sources live)
    pub project_dir: PathBuf,
    /// Build output directory holding the assembly and resources
    pub build_dir: PathBuf,
    /// Assembly name without extension; also the mod's internal name
    pub assembly_name: String,
    /// Mod loader version being targeted
    pub loader_version: String,
    /// Where the archive is written
    pub archive_path: PathBuf,
    pub properties: BuildProperties,
    pub references: References,
}

impl PackingOptions {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        assembly_name: impl Into<String>,
        loader_version: impl Into<String>,
        archive_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            build_dir: build_dir.into(),
            assembly_name: assembly_name.into(),
            loader_version: loader_version.into(),
            archive_path: archive_path.into(),
            properties: BuildProperties::new(),
            references: References::new(),
        }
    }

    pub fn with_properties(mut self, properties: BuildProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_references(mut self, references: References) -> Self {
        self.references = references;
        self
    }

    fn check(&self) -> Result<()> {
        if !self.project_dir.is_dir() {
            return Err(Error::Other(format!(
                "Project directory does not exist: {}",
                self.project_dir.display()
            )));
        }
        if self.assembly_name.trim().is_empty() {
            return Err(Error::Other("Assembly name must not be empty".to_string()));
        }
        if self.loader_version.trim().is_empty() {
            return Err(Error::Other(
                "Target mod loader version must not be empty".to_string(),
            ));
        }
        if self.archive_path.file_name().is_none() {
            return Err(Error::Other(format!(
                "Invalid output path: {}",
                self.archive_path.display()
            )));
        }
        self.properties.validate()
    }
}

/// What a packaging run produced
#[derive(Debug, Clone)]
pub struct PackSummary {
    pub archive_path: PathBuf,
    /// Entries in archive order
    pub entries: Vec<ArchiveEntry>,
    /// Files left out, with the reason
    pub excluded: Vec<(String, Decision)>,
    /// Archive size in bytes
    pub size: u64,
}

/// A file that passed the filter
struct Candidate {
    path: PathBuf,
    relative: String,
    visibility: Visibility,
}

/// Packs one mod
pub struct Packer {
    options: PackingOptions,
    policy: CompressionPolicy,
    worker_threads: usize,
    progress: Option<ProgressCallback>,
}

impl Packer {
    pub fn new(options: PackingOptions) -> Self {
        Self {
            options,
            policy: CompressionPolicy::default(),
            worker_threads: 0,
            progress: None,
        }
    }

    pub fn with_config(mut self, config: &PackingConfig) -> Self {
        self.policy = CompressionPolicy::from(config);
        self.worker_threads = config.worker_threads;
        self
    }

    pub fn with_policy(mut self, policy: CompressionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Collect, filter, compress and write the archive
    ///
    /// Either a complete archive ends up at the output path or nothing
    /// there changes.
    pub fn pack(&self) -> Result<PackSummary> {
        let options = &self.options;
        options.check()?;

        let rules = FilterRules::from_properties(&options.properties)?;
        let metadata = ModMetadata::new(options.properties.clone(), options.references.clone())?;
        let mod_version = metadata
            .properties
            .get(MOD_VERSION)
            .unwrap_or_default()
            .to_string();

        let collector = InputCollector::new(&options.build_dir, &options.assembly_name)?
            .skip_archive(&options.archive_path);
        let assembly = relative_path(collector.root(), collector.assembly_path())?;
        let filter = FileFilter::new(rules, assembly);

        let mut candidates = Vec::new();
        let mut excluded = Vec::new();
        for path in collector.files() {
            let path = path?;
            let relative = relative_path(collector.root(), &path)?;
            match filter.decide(&relative) {
                Decision::Include(visibility) => candidates.push(Candidate {
                    path,
                    relative,
                    visibility,
                }),
                decision => excluded.push((relative, decision)),
            }
        }
        debug!(
            "{} files to pack, {} excluded",
            candidates.len(),
            excluded.len()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_threads)
            .build()
            .map_err(|e| Error::Other(format!("Failed to start compression workers: {}", e)))?;

        let (block, packed) = pool.install(|| {
            rayon::join(|| metadata.encode(), || self.compress_all(&candidates))
        });
        let block = block?;
        let packed = packed?;

        let mut entries: Vec<ArchiveEntry> = packed.iter().map(|p| p.entry.clone()).collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let header = ArchiveHeader::new(
            options.loader_version.clone(),
            options.assembly_name.clone(),
            mod_version,
        );
        let size = write_archive(&options.archive_path, &header, &block, packed)?;

        Ok(PackSummary {
            archive_path: options.archive_path.clone(),
            entries,
            excluded,
            size,
        })
    }

    fn compress_all(&self, candidates: &[Candidate]) -> Result<Vec<PackedEntry>> {
        let total = candidates.len() as u64;
        let done = AtomicU64::new(0);

        candidates
            .par_iter()
            .map(|candidate| -> Result<PackedEntry> {
                let packed = self.compress_one(candidate)?;
                let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref cb) = self.progress {
                    cb(&candidate.relative, current, total);
                }
                Ok(packed)
            })
            .collect()
    }

    fn compress_one(&self, candidate: &Candidate) -> Result<PackedEntry> {
        let raw = read_input(&candidate.path)?;
        let raw_len = raw.len() as u64;
        let data = self.policy.compress(raw)?;
        Ok(PackedEntry::new(
            candidate.relative.clone(),
            candidate.visibility,
            raw_len,
            data,
        ))
    }
}

/// Pack a mod with default settings
pub fn pack_mod(options: &PackingOptions) -> Result<PackSummary> {
    Packer::new(options.clone()).pack()
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::read(path, e))
}
