//! Build properties embedded in the archive metadata
//!
//! Properties are an ordered string map. A key that was never set is absent;
//! a key set to `""` is present with an empty value, and the two encode
//! differently in the archive.
//!
//! # Examples
//!
//! ```
//! use collate::{BuildProperties, ModSide};
//!
//! let mut props = BuildProperties::new();
//! props.insert("displayName", "My Mod");
//! props.insert("side", "Client");
//! props.insert_opt("homepage", None::<String>);
//!
//! assert_eq!(props.get("displayName"), Some("My Mod"));
//! assert!(!props.contains_key("homepage"));
//! assert_eq!(props.side().unwrap(), ModSide::Client);
//! ```

use crate::{Error, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const DISPLAY_NAME: &str = "displayName";
pub const AUTHOR: &str = "author";
pub const MOD_VERSION: &str = "modVersion";
pub const HOMEPAGE: &str = "homepage";
pub const SIDE: &str = "side";
pub const SORT_BEFORE: &str = "sortBefore";
pub const SORT_AFTER: &str = "sortAfter";
pub const HIDE_CODE: &str = "hideCode";
pub const HIDE_RESOURCES: &str = "hideResources";
pub const INCLUDE_SOURCE: &str = "includeSource";
pub const BUILD_IGNORE: &str = "buildIgnore";

/// Properties the loader refuses to activate a mod without
pub const REQUIRED_PROPERTIES: [&str; 4] = [DISPLAY_NAME, AUTHOR, MOD_VERSION, SIDE];

/// Which side of a multiplayer session loads the mod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModSide {
    Both,
    Client,
    Server,
    NoSync,
}

impl ModSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModSide::Both => "Both",
            ModSide::Client => "Client",
            ModSide::Server => "Server",
            ModSide::NoSync => "NoSync",
        }
    }
}

impl fmt::Display for ModSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Both" => Ok(ModSide::Both),
            "Client" => Ok(ModSide::Client),
            "Server" => Ok(ModSide::Server),
            "NoSync" => Ok(ModSide::NoSync),
            other => Err(Error::InvalidProperty {
                key: SIDE.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Parse a boolean token the way the build tooling writes them
///
/// Accepts `true`/`false` in any case (so MSBuild's `True`/`False` work).
/// Surrounding whitespace is ignored.
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Ordered key/value build properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildProperties {
    entries: Vec<(String, String)>,
}

impl BuildProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, keeping its original position if it was already set
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Set a property only when a value is given
    pub fn insert_opt<V: Into<String>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ensure every required property is present
    ///
    /// Reports the first missing key in [`REQUIRED_PROPERTIES`] order.
    pub fn validate(&self) -> Result<()> {
        for key in REQUIRED_PROPERTIES {
            if !self.contains_key(key) {
                return Err(Error::MissingProperty {
                    key: key.to_string(),
                });
            }
        }

        self.side()?;
        for key in [HIDE_CODE, HIDE_RESOURCES, INCLUDE_SOURCE] {
            self.flag(key)?;
        }

        Ok(())
    }

    pub fn side(&self) -> Result<ModSide> {
        match self.get(SIDE) {
            Some(value) => value.parse(),
            None => Err(Error::MissingProperty {
                key: SIDE.to_string(),
            }),
        }
    }

    /// Read a boolean property; unset means `false`
    pub fn flag(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None => Ok(false),
            Some(value) => parse_bool(value).ok_or_else(|| Error::InvalidProperty {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

impl Serialize for BuildProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BuildProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = BuildProperties::new();
        for (key, value) in iter {
            props.insert(key, value);
        }
        props
    }
}
