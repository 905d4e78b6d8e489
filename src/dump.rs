//! Debug dump of active notes keyed by id
//!
//! Sorted by id so two dumps of successive exports diff line by line.

use crate::error::Result;
use crate::notes::{Note, NoteCollection};
use crate::storage::{to_json_with_indent, write_text};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Default file written by the `dump` command
pub const DEFAULT_DUMP_FILENAME: &str = "debug.yaml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DumpFormat {
    #[default]
    Yaml,
    Json,
}

impl FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "yaml" | "yml" => Ok(DumpFormat::Yaml),
            "json" => Ok(DumpFormat::Json),
            _ => Err(format!(
                "Invalid dump format '{}'. Valid options are: yaml, json",
                s
            )),
        }
    }
}

/// Render the active notes as an id-sorted map
pub fn render_dump(collection: &NoteCollection, format: DumpFormat) -> Result<String> {
    let by_id: BTreeMap<&str, &Note> = collection
        .active_notes
        .iter()
        .map(|note| (note.id.as_str(), note))
        .collect();
    match format {
        DumpFormat::Yaml => Ok(serde_yaml::to_string(&by_id)?),
        DumpFormat::Json => to_json_with_indent(&by_id, b"  "),
    }
}

/// Write the dump to `path`
pub fn dump_notes(collection: &NoteCollection, path: &Path, format: DumpFormat) -> Result<()> {
    write_text(path, &render_dump(collection, format)?)
}
