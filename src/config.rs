//! User configuration management
//!
//! Configuration is stored in TOML format at `~/.collate/config.toml`.
//! Everything has a default, so a missing file is not an error.
//!
//! # Examples
//!
//! ```no_run
//! use collate::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::load()?;
//! println!("Compression level: {}", config.packing.compression_level);
//!
//! config.set("packing.min_compress_size", "4096")?;
//! config.save()?;
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides the config directory
pub const CONFIG_DIR_ENV: &str = "COLLATE_CONFIG_DIR";

/// User configuration file (`~/.collate/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Packaging settings
    #[serde(default)]
    pub packing: PackingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingConfig {
    /// Directory archives are written to when no output path is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mods_dir: Option<PathBuf>,

    /// Deflate level, 0-9
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    /// Files smaller than this are stored without trying to compress them
    #[serde(default = "default_min_compress_size")]
    pub min_compress_size: u64,

    /// Compression worker threads (0 = one per CPU)
    #[serde(default)]
    pub worker_threads: usize,
}

fn default_compression_level() -> u32 {
    6
}

fn default_min_compress_size() -> u64 {
    1024
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            mods_dir: None,
            compression_level: default_compression_level(),
            min_compress_size: default_min_compress_size(),
            worker_threads: 0,
        }
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// Uses COLLATE_CONFIG_DIR if set, otherwise ~/.collate/config.toml
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(config_dir).join("config.toml"));
        }

        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| Error::Other("Could not find home directory".to_string()))?;

        Ok(PathBuf::from(home).join(".collate").join("config.toml"))
    }

    /// Load config from file, or the defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        config.packing.check()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Set a value by its dotted key, e.g. `packing.compression_level`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || Error::Other(format!("Invalid value for {}: {}", key, value));

        match key {
            "packing.mods_dir" => {
                self.packing.mods_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "packing.compression_level" => {
                self.packing.compression_level = value.parse().map_err(|_| invalid())?;
            }
            "packing.min_compress_size" => {
                self.packing.min_compress_size = value.parse().map_err(|_| invalid())?;
            }
            "packing.worker_threads" => {
                self.packing.worker_threads = value.parse().map_err(|_| invalid())?;
            }
            _ => return Err(Error::Other(format!("Unknown config key: {}", key))),
        }

        self.packing.check()
    }
}

impl PackingConfig {
    /// The configured mods directory with a leading `~` expanded
    pub fn mods_dir(&self) -> Option<PathBuf> {
        self.mods_dir
            .as_ref()
            .map(|dir| PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).to_string()))
    }

    fn check(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(Error::Other(format!(
                "packing.compression_level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}
