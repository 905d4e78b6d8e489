//! Build an importable export document from plain files
//!
//! The reverse of the exporter: every `*.md` and `*.txt` file in one flat
//! directory becomes an active note with a fresh id. The service ignores ids
//! on import, so they only need to be unique within the document.

use crate::error::{ExportError, Result};
use crate::file_times::epoch_seconds;
use crate::notes::{Note, NoteCollection};
use crate::storage::{to_json_with_indent, write_text};
use crate::timestamp;
use chrono::{DateTime, Local};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use serde_json::Value;
use uuid::Uuid;

/// File extensions picked up, compared case-sensitively
pub const IMPORT_EXTENSIONS: &[&str] = &["md", "txt"];

/// Environment variable overriding the default output filename
pub const ENV_EXPORT_FILENAME: &str = "SIMPLENOTE_EXPORT_FILENAME";

/// Read every note file in `dir` into a collection, in filename order
pub fn collect_notes(dir: &Path) -> Result<NoteCollection> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for dir_entry in fs::read_dir(dir).map_err(|e| ExportError::fs(dir, e))? {
        let path = dir_entry.map_err(|e| ExportError::fs(dir, e))?.path();
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMPORT_EXTENSIONS.contains(&e));
        if wanted && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    info!("{} file(s) to convert", paths.len());

    let notes = paths
        .iter()
        .map(|path| note_from_file(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(NoteCollection::new(notes, Vec::new()))
}

/// Build a note from one file, taking its dates from the file system
pub fn note_from_file(path: &Path) -> Result<Note> {
    let content = fs::read_to_string(path).map_err(|e| ExportError::fs(path, e))?;
    let metadata = fs::metadata(path).map_err(|e| ExportError::fs(path, e))?;
    let modified = metadata.modified().map_err(|e| ExportError::fs(path, e))?;
    let created = metadata.created().unwrap_or(modified);
    let is_markdown = path.extension().and_then(|e| e.to_str()) == Some("md");

    let note = Note::new(
        Uuid::new_v4().to_string(),
        content,
        timestamp::encode_seconds(epoch_seconds(created.min(modified)))?,
        timestamp::encode_seconds(epoch_seconds(modified))?,
    );
    Ok(if is_markdown {
        note.with_extra("markdown", Value::Bool(true))
    } else {
        note
    })
}

/// `simplenote_<YYYYmmdd_HHMMSS>.json` for the given local time
pub fn default_output_name(now: DateTime<Local>) -> String {
    format!("simplenote_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Write the collection as an importable JSON document
///
/// `trashedNotes` is always present, even when empty: the web importer
/// silently fails without it.
pub fn write_collection(collection: &NoteCollection, path: &Path) -> Result<()> {
    write_text(path, &to_json_with_indent(collection, b"    ")?)
}
