use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QualityError {
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization failed: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Column '{column}' does not exist in {dataset}")]
    MissingColumn { dataset: String, column: String },

    #[error("Column '{column}' in {dataset} holds {actual} values, expected {expected}")]
    ColumnKind {
        dataset: String,
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Timestamp conversion failed: {0}")]
    Timestamp(String),
}

impl QualityError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, QualityError>;
