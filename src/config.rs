//! Export configuration
//!
//! Options are resolved once at startup from layers, each overriding the
//! previous one: defaults, an optional TOML file, environment variables, and
//! finally command-line flags. The result is passed by reference into the
//! exporter; nothing reads the environment after that.

use crate::error::{ExportError, Result};
use crate::git_ops::GitAuthor;
use crate::validation::SchemaPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const ENV_READABLE_FILENAMES: &str = "SIMPLENOTE_READABLE_FILENAMES";
pub const ENV_USE_GIT: &str = "SIMPLENOTE_USE_GIT";
pub const ENV_SAVE_INDEX: &str = "SIMPLENOTE_SAVE_INDEX";
pub const ENV_SAVE_INDEX_TRASHED: &str = "SIMPLENOTE_SAVE_INDEX_TRASHED";
pub const ENV_FILE_EXTENSION: &str = "SIMPLENOTE_FILE_EXTENSION";
pub const ENV_GIT_AUTHOR_NAME: &str = "SIMPLENOTE_GIT_AUTHOR_NAME";
pub const ENV_GIT_AUTHOR_EMAIL: &str = "SIMPLENOTE_GIT_AUTHOR_EMAIL";

/// Order in which notes are committed to the history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitOrder {
    /// Input order of `activeNotes`
    #[default]
    Input,
    /// Oldest `lastModified` first; ties keep input order
    Chronological,
}

impl FromStr for CommitOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "input" => Ok(CommitOrder::Input),
            "chronological" => Ok(CommitOrder::Chronological),
            _ => Err(format!(
                "Invalid commit order '{}'. Valid options are: input, chronological",
                s
            )),
        }
    }
}

/// What happens when a single note cannot be exported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// The first bad note aborts the whole run
    #[default]
    Abort,
    /// Bad notes are skipped, logged and listed in the summary
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "abort" => Ok(FailurePolicy::Abort),
            "isolate" => Ok(FailurePolicy::Isolate),
            _ => Err(format!(
                "Invalid failure policy '{}'. Valid options are: abort, isolate",
                s
            )),
        }
    }
}

/// Resolved options for one export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Name files after the note's first line instead of its id
    pub use_first_line_as_filename: bool,
    /// Extension appended to every note file; empty means none
    pub file_extension: String,
    pub save_index: bool,
    pub save_index_include_trashed: bool,
    pub use_version_control: bool,
    pub commit_order: CommitOrder,
    pub failure_policy: FailurePolicy,
    pub schema_policy: SchemaPolicy,
    pub git_author: GitAuthor,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            use_first_line_as_filename: false,
            file_extension: "txt".to_string(),
            save_index: true,
            save_index_include_trashed: true,
            use_version_control: false,
            commit_order: CommitOrder::Input,
            failure_policy: FailurePolicy::Abort,
            schema_policy: SchemaPolicy::PerNote,
            git_author: GitAuthor::default(),
        }
    }
}

/// A partial set of options; unset fields leave the lower layer untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsLayer {
    pub use_first_line_as_filename: Option<bool>,
    pub file_extension: Option<String>,
    pub save_index: Option<bool>,
    pub save_index_include_trashed: Option<bool>,
    pub use_version_control: Option<bool>,
    pub commit_order: Option<CommitOrder>,
    pub failure_policy: Option<FailurePolicy>,
    pub schema_policy: Option<SchemaPolicy>,
    pub git_author_name: Option<String>,
    pub git_author_email: Option<String>,
}

impl OptionsLayer {
    /// Parse a TOML config file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ExportError::fs(path, e))?;
        toml::from_str(&content).map_err(|source| ExportError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the `SIMPLENOTE_*` variables through `lookup`
    ///
    /// # Arguments
    /// * `lookup` - Variable getter, `|k| std::env::var(k).ok()` in production
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).map(|v| force_bool(&v));
        Self {
            use_first_line_as_filename: flag(ENV_READABLE_FILENAMES),
            use_version_control: flag(ENV_USE_GIT),
            save_index: flag(ENV_SAVE_INDEX),
            save_index_include_trashed: flag(ENV_SAVE_INDEX_TRASHED),
            file_extension: lookup(ENV_FILE_EXTENSION),
            git_author_name: lookup(ENV_GIT_AUTHOR_NAME),
            git_author_email: lookup(ENV_GIT_AUTHOR_EMAIL),
            ..Self::default()
        }
    }

    /// The process environment
    pub fn from_process_env() -> Self {
        Self::from_env(|key| std::env::var(key).ok())
    }
}

impl ExportOptions {
    /// Apply a layer on top of these options
    pub fn apply(&mut self, layer: OptionsLayer) {
        if let Some(v) = layer.use_first_line_as_filename {
            self.use_first_line_as_filename = v;
        }
        if let Some(v) = layer.file_extension {
            self.file_extension = v;
        }
        if let Some(v) = layer.save_index {
            self.save_index = v;
        }
        if let Some(v) = layer.save_index_include_trashed {
            self.save_index_include_trashed = v;
        }
        if let Some(v) = layer.use_version_control {
            self.use_version_control = v;
        }
        if let Some(v) = layer.commit_order {
            self.commit_order = v;
        }
        if let Some(v) = layer.failure_policy {
            self.failure_policy = v;
        }
        if let Some(v) = layer.schema_policy {
            self.schema_policy = v;
        }
        if let Some(v) = layer.git_author_name {
            self.git_author.name = Some(v);
        }
        if let Some(v) = layer.git_author_email {
            self.git_author.email = Some(v);
        }
    }

    /// Defaults overridden by each layer in turn
    pub fn layered(layers: impl IntoIterator<Item = OptionsLayer>) -> Self {
        let mut options = Self::default();
        for layer in layers {
            options.apply(layer);
        }
        options
    }
}

/// Coerce a flag value into a boolean
///
/// Everything is true except `false`, `off`, `no` and `0` (any case).
pub fn force_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "false" | "off" | "no" | "0"
    )
}
