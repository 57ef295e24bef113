//! Collate - packages compiled mod projects into `.tmod` archives
//!
//! Collate takes a mod's build output (the compiled assembly and its
//! resources) plus the metadata the build tooling collected, and produces a
//! single archive the mod loader can activate without seeing the project:
//!
//! - Build output collection with `buildIgnore` glob filtering
//! - Hidden code/resource flags and optional source inclusion
//! - Per-file deflate compression on a worker pool
//! - Order-preserving, byte-reproducible metadata and entry tables
//! - Atomic archive writes (no partial archive is ever visible)
//! - A versioned reader for inspecting and extracting archives
//!
//! # Examples
//!
//! ```no_run
//! use collate::{BuildProperties, Config, Packer, PackingOptions, References};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut properties = BuildProperties::new();
//! properties.insert("displayName", "Example Mod");
//! properties.insert("author", "Example Author");
//! properties.insert("modVersion", "1.0.0");
//! properties.insert("side", "Both");
//! properties.insert("buildIgnore", "*.pdb;obj/**");
//!
//! let references = References::load(Some(Path::new("obj/modrefs.txt")), None, None)?;
//!
//! let options = PackingOptions::new(
//!     "ExampleMod",
//!     "ExampleMod/bin/Release",
//!     "ExampleMod",
//!     "2024.5",
//!     "ExampleMod.tmod",
//! )
//! .with_properties(properties)
//! .with_references(references);
//!
//! let config = Config::load()?;
//! let summary = Packer::new(options).with_config(&config.packing).pack()?;
//! println!("Wrote {} ({} bytes)", summary.archive_path.display(), summary.size);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`properties`] - Build properties and their validation
//! - [`references`] - Mod, assembly and package references
//! - [`collector`] - Build output enumeration
//! - [`filter`] - Inclusion rules and visibility flags
//! - [`compress`] - Per-entry deflate compression
//! - [`metadata`] - Metadata block encoding
//! - [`archive`] - Container writer and reader
//! - [`packer`] - The packaging pipeline
//! - [`config`] - User configuration
//! - [`error`] - Error types and result handling

pub mod archive;
mod codec;
pub mod collector;
pub mod compress;
pub mod config;
pub mod error;
pub mod filter;
pub mod metadata;
pub mod packer;
pub mod properties;
pub mod references;

pub use archive::{ArchiveEntry, ArchiveHeader, FormatVersion, ModArchive};
pub use collector::InputCollector;
pub use compress::CompressionPolicy;
pub use config::{Config, PackingConfig};
pub use error::{Error, Result};
pub use filter::{Decision, FileFilter, FilterRules, IgnorePatterns, Visibility};
pub use metadata::ModMetadata;
pub use packer::{pack_mod, PackSummary, Packer, PackingOptions, ProgressCallback};
pub use properties::{BuildProperties, ModSide};
pub use references::{
    AssemblyReference, ModReference, NuGetReference, Reference, References,
};
