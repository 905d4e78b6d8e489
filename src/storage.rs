//! Reading export bundles and writing output documents
//!
//! An export is either the raw `notes.json` or the zip the web app produces,
//! which holds the same document at `source/notes.json` next to one text file
//! per note.

use crate::duplicates::fold_case;
use crate::error::{ExportError, Result};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Member of the zip bundle that holds the JSON document
pub const ARCHIVE_NOTES_PATH: &str = "source/notes.json";

/// Whether `path` names a raw JSON export rather than a zip bundle
pub fn is_raw_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load the export document from a raw JSON file or a zip bundle
pub fn load_document(path: &Path) -> Result<Value> {
    let bytes = if is_raw_json(path) {
        info!("Extracting from Simplenote raw json file {}", path.display());
        fs::read(path).map_err(|e| ExportError::fs(path, e))?
    } else {
        info!("Extracting from Simplenote json in zip {}", path.display());
        let mut archive = open_archive(path)?;
        let mut member = archive.by_name(ARCHIVE_NOTES_PATH)?;
        let mut bytes = Vec::new();
        member
            .read_to_end(&mut bytes)
            .map_err(|e| ExportError::fs(path, e))?;
        bytes
    };
    Ok(serde_json::from_slice(&bytes)?)
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| ExportError::fs(path, e))?;
    Ok(ZipArchive::new(file)?)
}

/// Pairs of archive member names that differ only by case
///
/// Each pair is `(earlier member, later member)` in archive order.
pub fn archive_member_collisions(path: &Path) -> Result<Vec<(String, String)>> {
    let mut archive = open_archive(path)?;
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut collisions = Vec::new();
    for i in 0..archive.len() {
        let name = archive.by_index(i)?.name().to_string();
        match seen.get(&fold_case(&name)) {
            Some(first) => collisions.push((first.clone(), name)),
            None => {
                seen.insert(fold_case(&name), name);
            }
        }
    }
    Ok(collisions)
}

/// Create `dir` and its parents; an existing directory is not an error
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(_) if dir.is_dir() => Ok(()),
        Err(e) => Err(ExportError::fs(dir, e)),
    }
}

/// Serialize `value` as pretty JSON using `indent` for each level
pub fn to_json_with_indent<T: Serialize>(value: &T, indent: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write text to `path`, replacing any existing file
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content.as_bytes()).map_err(|e| ExportError::fs(path, e))
}
