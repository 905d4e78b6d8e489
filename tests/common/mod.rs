//! Common test utilities for integration tests

#![allow(dead_code)]

use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::FileOptions;

/// One active note with the mandatory keys only
pub fn note_json(id: &str, content: &str, created: &str, modified: &str) -> Value {
    json!({
        "id": id,
        "content": content,
        "creationDate": created,
        "lastModified": modified,
    })
}

/// A complete export document
pub fn document(active: Vec<Value>, trashed: Vec<Value>) -> Value {
    json!({
        "activeNotes": active,
        "trashedNotes": trashed,
    })
}

/// Write `document` as `notes.json` in a fresh temp dir
pub fn write_json_export(document: &Value) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("notes.json");
    fs::write(&path, serde_json::to_string_pretty(document).unwrap()).unwrap();
    (temp_dir, path)
}

/// Write `document` into a zip bundle shaped like the web app's download
pub fn write_zip_export(dir: &Path, document: &Value, extra_members: &[&str]) -> PathBuf {
    let path = dir.join("notes.zip");
    let mut writer = ZipWriter::new(fs::File::create(&path).unwrap());
    writer
        .start_file("source/notes.json", FileOptions::default())
        .unwrap();
    writer
        .write_all(serde_json::to_string(document).unwrap().as_bytes())
        .unwrap();
    for name in extra_members {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(name.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}
