use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Target assembly not found: {}\n\n\
             Hint: Build the project before packaging it.\n\
             The build output directory must contain <AssemblyName>.dll.",
             path.display())]
    MissingOutput { path: PathBuf },

    #[error("Missing required property '{key}'\n\n\
             Hint: The mod loader needs displayName, author, modVersion and side.\n\
             Pass it on the command line, e.g. --display-name \"My Mod\"")]
    MissingProperty { key: String },

    #[error("Invalid value for property '{key}': '{value}'")]
    InvalidProperty { key: String, value: String },

    #[error("Malformed reference row in {} (line {line}): {reason}", file.display())]
    MalformedReferenceRow {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid build ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write archive {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("Unsupported archive format version {0}")]
    UnsupportedFormatVersion(u32),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}
