//! Error taxonomy for the export pipeline
//!
//! Every fallible library operation returns [`ExportError`]. The binary wraps
//! these in `anyhow` at the command boundary.

use std::path::{Path, PathBuf};

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The loaded document does not have the expected top-level or note-level shape
    #[error("schema error: {0}")]
    Schema(String),

    /// A timestamp lacks the UTC marker or does not match the fixed pattern
    #[error("invalid timestamp '{value}': {reason}")]
    Format { value: String, reason: String },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A filename cannot be embedded safely in a generated script
    #[error("unsupported character {character:?} in filename '{filename}'")]
    UnsupportedCharacter { filename: String, character: char },

    #[error("version control error: {0}")]
    VersionControl(#[from] git2::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config error in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ExportError {
    pub(crate) fn format(value: &str, reason: impl Into<String>) -> Self {
        ExportError::Format {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn fs(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ExportError::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Errors that only concern a single note and may be isolated by the caller
    pub fn is_per_note(&self) -> bool {
        matches!(
            self,
            ExportError::Format { .. } | ExportError::UnsupportedCharacter { .. }
        )
    }
}
