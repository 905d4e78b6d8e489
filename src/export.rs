//! Export materializer
//!
//! Turns a validated note collection into one file per active note. Each
//! file gets the note's modification time (and creation time where the
//! platform allows), optionally a git commit dated to that modification
//! time, and an entry in the metadata index.
//!
//! The run is single threaded and processes notes in input order, since
//! output and commit order must be deterministic. Concurrent runs against
//! the same output directory are not supported.

use crate::config::{CommitOrder, ExportOptions, FailurePolicy};
use crate::duplicates::{DuplicateRegistry, find_duplicates, fold_case, report_duplicates};
use crate::error::{ExportError, Result};
use crate::file_times::{CreationTime, set_file_times};
use crate::filename::{DEFAULT_MAX_LENGTH, is_truncated, safe_filename};
use crate::git_ops::GitOps;
use crate::notes::{Note, NoteCollection, first_line};
use crate::storage::{ensure_dir, to_json_with_indent, write_text};
use crate::timestamp;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Name of the metadata index written next to the note files
pub const INDEX_FILENAME: &str = "simplenote_index.json";

/// Prefix marking a name that was disambiguated with the note id
pub const DUPLICATE_PREFIX: &str = "dupe__";

/// Metadata snapshot of one export run
///
/// Every active note minus its content, plus the resolved `filename`, keyed
/// by note id. Serialized with sorted keys so successive exports diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportIndex {
    pub active_notes: BTreeMap<String, Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trashed_notes: Option<Vec<Value>>,
}

/// A note skipped under [`FailurePolicy::Isolate`]
#[derive(Debug)]
pub struct NoteFailure {
    pub note_id: String,
    pub error: ExportError,
}

/// Outcome of a completed run
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub index: ExportIndex,
    /// Files written, in input order
    pub written: Vec<PathBuf>,
    pub commits: usize,
    /// Number of colliding name buckets found
    pub duplicates: usize,
    pub failures: Vec<NoteFailure>,
}

/// A note file waiting to be committed
struct PendingCommit {
    filename: String,
    message: String,
    modified: DateTime<Utc>,
}

/// Validate a parsed export document and materialize it into `output_dir`
///
/// Validation happens before the output directory is created, so a schema
/// error leaves nothing on disk.
pub fn export_document(
    document: Value,
    output_dir: &Path,
    options: &ExportOptions,
    creation_time: &CreationTime,
) -> Result<ExportSummary> {
    let (collection, _report) = NoteCollection::from_document(document, options.schema_policy)?;
    materialize(&collection, output_dir, options, creation_time)
}

/// Write every active note of `collection` into `output_dir`
///
/// # Arguments
/// * `collection` - Validated notes; input order decides write order
/// * `output_dir` - Created if missing; existing files are overwritten
/// * `options` - Naming, index and history settings
/// * `creation_time` - Platform setter for file creation time, if any
///
/// # Returns
/// The run summary, or the first fatal error. Filesystem and git errors are
/// always fatal; per-note timestamp and filename errors are fatal unless the
/// failure policy isolates them.
pub fn materialize(
    collection: &NoteCollection,
    output_dir: &Path,
    options: &ExportOptions,
    creation_time: &CreationTime,
) -> Result<ExportSummary> {
    let registry = find_duplicates(collection, Some(&safe_filename), false);
    let mut summary = ExportSummary {
        duplicates: report_duplicates(&registry),
        ..ExportSummary::default()
    };
    warn_on_repeated_ids(collection);

    if cfg!(windows) && !creation_time.is_available() {
        warn!("Windows, but no creation time setter available; file creation times left unset");
    }

    ensure_dir(output_dir)?;
    let git = if options.use_version_control {
        Some(GitOps::init(output_dir, &options.git_author)?)
    } else {
        None
    };

    info!(
        "Exporting {} note(s) to {}",
        collection.len(),
        output_dir.display()
    );

    let mut pending = Vec::new();
    for note in &collection.active_notes {
        match export_note(note, output_dir, options, &registry, creation_time) {
            Ok((path, metadata, modified)) => {
                let filename = file_name_of(&path);
                if git.is_some() {
                    pending.push(PendingCommit {
                        filename,
                        message: commit_message(&note.id, &metadata)?,
                        modified,
                    });
                }
                if options.save_index {
                    summary.index.active_notes.insert(note.id.clone(), metadata);
                }
                summary.written.push(path);
            }
            Err(error)
                if options.failure_policy == FailurePolicy::Isolate && error.is_per_note() =>
            {
                warn!("skipping note {}: {}", note.id, error);
                summary.failures.push(NoteFailure {
                    note_id: note.id.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    if let Some(git) = &git {
        if options.commit_order == CommitOrder::Chronological {
            pending.sort_by_key(|commit| commit.modified);
        }
        for commit in &pending {
            git.stage(Path::new(&commit.filename))?;
            git.commit(&commit.message, commit.modified.timestamp())?;
            summary.commits += 1;
        }
    }

    if options.save_index {
        if options.save_index_include_trashed {
            summary.index.trashed_notes = Some(collection.trashed_notes.clone());
        }
        let index_path = output_dir.join(INDEX_FILENAME);
        write_text(&index_path, &to_json_with_indent(&summary.index, b" ")?)?;
        debug!("wrote index {}", index_path.display());
    }

    info!(
        "Exported {} note(s), {} commit(s), {} skipped",
        summary.written.len(),
        summary.commits,
        summary.failures.len()
    );
    Ok(summary)
}

/// Write one note and restore its timestamps
///
/// Everything that can fail for this note alone (timestamps, filename) is
/// checked before the file is touched.
fn export_note(
    note: &Note,
    output_dir: &Path,
    options: &ExportOptions,
    registry: &DuplicateRegistry,
    creation_time: &CreationTime,
) -> Result<(PathBuf, Map<String, Value>, DateTime<Utc>)> {
    let content = note.normalized_content();
    let modified = timestamp::decode(&note.last_modified)?;
    let created = timestamp::decode(&note.creation_date)?;

    let filename = resolve_filename(note, &content, options, registry);
    ensure_single_segment(&filename)?;
    let path = output_dir.join(&filename);
    debug!("writing note {} to {}", note.id, path.display());

    write_text(&path, &content)?;
    set_file_times(&path, SystemTime::now(), SystemTime::from(modified))?;
    if let CreationTime::Available(setter) = creation_time {
        setter.set_creation_time(&path, SystemTime::from(created))?;
    }

    let mut metadata = note.metadata();
    metadata.insert("filename".to_string(), Value::String(filename));
    Ok((path, metadata, modified))
}

/// On-disk name for a note: its id, or its (disambiguated) first line
///
/// A name that would be overwritten by the index file goes through the same
/// `dupe__<name>__<id>` form as a case-insensitive collision.
pub fn resolve_filename(
    note: &Note,
    normalized_content: &str,
    options: &ExportOptions,
    registry: &DuplicateRegistry,
) -> String {
    let (stem, colliding) = if options.use_first_line_as_filename {
        let safe = safe_filename(first_line(normalized_content));
        if is_truncated(&safe, DEFAULT_MAX_LENGTH) {
            warn!("title of note {} truncated to {}", note.id, safe);
        }
        let colliding = registry.contains(&safe);
        (safe, colliding)
    } else {
        (note.id.clone(), false)
    };

    let disambiguated = if colliding || is_index_name(&with_extension(&stem, options)) {
        format!("{}{}__{}", DUPLICATE_PREFIX, fold_case(&stem), note.id)
    } else {
        stem
    };
    with_extension(&disambiguated, options)
}

fn with_extension(stem: &str, options: &ExportOptions) -> String {
    if options.file_extension.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, options.file_extension)
    }
}

/// Whether `filename` names the index on a case-insensitive file system
fn is_index_name(filename: &str) -> bool {
    fold_case(filename) == INDEX_FILENAME
}

/// Reject names that would escape the output directory
fn ensure_single_segment(filename: &str) -> Result<()> {
    if let Some(character) = filename.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(ExportError::UnsupportedCharacter {
            filename: filename.to_string(),
            character,
        });
    }
    if filename.is_empty() || filename == "." || filename == ".." {
        return Err(ExportError::UnsupportedCharacter {
            filename: filename.to_string(),
            character: '.',
        });
    }
    Ok(())
}

fn commit_message(note_id: &str, metadata: &Map<String, Value>) -> Result<String> {
    Ok(format!(
        "Note id={}\n\n{}\n",
        note_id,
        to_json_with_indent(metadata, b" ")?
    ))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn warn_on_repeated_ids(collection: &NoteCollection) {
    let mut seen = HashSet::new();
    for note in &collection.active_notes {
        if !seen.insert(note.id.as_str()) {
            warn!(
                "note id {} appears more than once; later files may overwrite earlier ones",
                note.id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn note(id: &str, content: &str, modified: &str) -> Note {
        Note::new(id, content, "2021-06-01T12:00:00.000Z", modified)
    }

    fn readable() -> ExportOptions {
        ExportOptions {
            use_first_line_as_filename: true,
            ..ExportOptions::default()
        }
    }

    // 重複時のファイル名解決テスト
    #[test]
    fn test_resolve_filename_disambiguates() {
        let collection = NoteCollection::new(
            vec![
                note("id1", "Test\nx", "2022-01-01T00:00:00.000Z"),
                note("id2", "test\ny", "2022-01-01T00:00:00.000Z"),
                note("id3", "Other\nz", "2022-01-01T00:00:00.000Z"),
            ],
            vec![],
        );
        let registry = find_duplicates(&collection, Some(&safe_filename), false);
        let names: Vec<String> = collection
            .active_notes
            .iter()
            .map(|n| resolve_filename(n, &n.normalized_content(), &readable(), &registry))
            .collect();
        assert_eq!(
            names,
            vec!["dupe__test__id1.txt", "dupe__test__id2.txt", "Other.txt"]
        );
    }

    // IDをファイル名に使う既定動作のテスト
    #[test]
    fn test_resolve_filename_by_id() {
        let n = note("abc-123", "Title\n", "2022-01-01T00:00:00.000Z");
        let options = ExportOptions {
            file_extension: String::new(),
            ..ExportOptions::default()
        };
        let name = resolve_filename(&n, "Title\n", &options, &DuplicateRegistry::default());
        assert_eq!(name, "abc-123");
    }

    // インデックスファイル名との衝突回避テスト
    #[test]
    fn test_resolve_filename_avoids_index_name() {
        let options = ExportOptions {
            file_extension: "json".to_string(),
            ..readable()
        };
        let titled = note("t1", "Simplenote_Index\nbody", "2022-01-01T00:00:00.000Z");
        assert_eq!(
            resolve_filename(&titled, &titled.content, &options, &DuplicateRegistry::default()),
            "dupe__simplenote_index__t1.json"
        );

        let by_id = note("simplenote_index", "Whatever\n", "2022-01-01T00:00:00.000Z");
        let id_options = ExportOptions {
            use_first_line_as_filename: false,
            ..options
        };
        assert_eq!(
            resolve_filename(&by_id, &by_id.content, &id_options, &DuplicateRegistry::default()),
            "dupe__simplenote_index__simplenote_index.json"
        );
    }

    // インデックスがノートを上書きしないことのテスト
    #[test]
    fn test_index_does_not_overwrite_note() {
        let temp_dir = TempDir::new().unwrap();
        let collection = NoteCollection::new(
            vec![note("n1", "simplenote_index\nkeep me", "2022-01-01T00:00:00.000Z")],
            vec![],
        );
        let options = ExportOptions {
            file_extension: "json".to_string(),
            ..readable()
        };
        let summary =
            materialize(&collection, temp_dir.path(), &options, &CreationTime::Unavailable)
                .unwrap();

        let note_path = temp_dir.path().join("dupe__simplenote_index__n1.json");
        assert_eq!(summary.written, vec![note_path.clone()]);
        assert_eq!(
            fs::read_to_string(&note_path).unwrap(),
            "simplenote_index\nkeep me"
        );
        assert!(temp_dir.path().join(INDEX_FILENAME).exists());
    }

    // ミリ秒精度の更新日時テスト
    #[test]
    fn test_modified_time_keeps_millis() {
        let temp_dir = TempDir::new().unwrap();
        let collection = NoteCollection::new(
            vec![note("n1", "Precise\n", "2022-06-27T01:39:12.602Z")],
            vec![],
        );
        materialize(&collection, temp_dir.path(), &readable(), &CreationTime::Unavailable)
            .unwrap();

        let modified = fs::metadata(temp_dir.path().join("Precise.txt"))
            .unwrap()
            .modified()
            .unwrap();
        let expected = timestamp::decode("2022-06-27T01:39:12.602Z").unwrap();
        assert_eq!(modified, SystemTime::from(expected));
    }

    #[test]
    fn test_ensure_single_segment() {
        assert!(ensure_single_segment("ok.txt").is_ok());
        assert!(ensure_single_segment("../escape.txt").is_err());
        assert!(ensure_single_segment("..").is_err());
        assert!(ensure_single_segment("a\\b").is_err());
    }

    // 不正なタイムスタンプで全体が中断されるテスト
    #[test]
    fn test_bad_timestamp_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let collection = NoteCollection::new(
            vec![
                note("good", "Good\n", "2022-01-01T00:00:00.000Z"),
                note("bad", "Bad\n", "2022-01-01 00:00:00"),
            ],
            vec![],
        );
        let err = materialize(
            &collection,
            temp_dir.path(),
            &readable(),
            &CreationTime::Unavailable,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::Format { .. }));
        assert!(!temp_dir.path().join(INDEX_FILENAME).exists());
    }

    // 不正なノートを隔離して続行するテスト
    #[test]
    fn test_bad_timestamp_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let collection = NoteCollection::new(
            vec![
                note("bad", "Bad\n", "yesterday"),
                note("good", "Good\n", "2022-01-01T00:00:00.000Z"),
            ],
            vec![],
        );
        let options = ExportOptions {
            failure_policy: FailurePolicy::Isolate,
            ..readable()
        };
        let summary = materialize(
            &collection,
            temp_dir.path(),
            &options,
            &CreationTime::Unavailable,
        )
        .unwrap();
        assert_eq!(summary.written, vec![temp_dir.path().join("Good.txt")]);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].note_id, "bad");
        assert!(!temp_dir.path().join("Bad.txt").exists());
        assert!(!summary.index.active_notes.contains_key("bad"));
    }

    // インデックスの内容テスト
    #[test]
    fn test_index_contents() {
        let temp_dir = TempDir::new().unwrap();
        let tagged = note("n1", "Tagged\r\nbody", "2022-01-01T00:00:00.000Z")
            .with_extra("tags", serde_json::json!(["work"]))
            .with_extra("pinned", Value::Null);
        let collection = NoteCollection::new(vec![tagged], vec![serde_json::json!({"id": "t1"})]);

        let summary = materialize(
            &collection,
            temp_dir.path(),
            &readable(),
            &CreationTime::Unavailable,
        )
        .unwrap();

        let text = fs::read_to_string(temp_dir.path().join(INDEX_FILENAME)).unwrap();
        let index: ExportIndex = serde_json::from_str(&text).unwrap();
        assert_eq!(index, summary.index);
        let entry = &index.active_notes["n1"];
        assert_eq!(entry["filename"], "Tagged.txt");
        assert_eq!(entry["tags"], serde_json::json!(["work"]));
        assert_eq!(entry["pinned"], Value::Null);
        assert!(entry.get("content").is_none());
        assert_eq!(index.trashed_notes, Some(vec![serde_json::json!({"id": "t1"})]));
        assert!(text.starts_with("{\n \"activeNotes\""));
    }

    #[test]
    fn test_index_without_trashed() {
        let temp_dir = TempDir::new().unwrap();
        let collection = NoteCollection::new(
            vec![note("n1", "A\n", "2022-01-01T00:00:00.000Z")],
            vec![serde_json::json!({"id": "t1"})],
        );
        let options = ExportOptions {
            save_index_include_trashed: false,
            ..ExportOptions::default()
        };
        materialize(&collection, temp_dir.path(), &options, &CreationTime::Unavailable).unwrap();
        let text = fs::read_to_string(temp_dir.path().join(INDEX_FILENAME)).unwrap();
        assert!(!text.contains("trashedNotes"));
        assert!(temp_dir.path().join("n1.txt").exists());
    }

    #[test]
    fn test_no_index_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let collection =
            NoteCollection::new(vec![note("n1", "A\n", "2022-01-01T00:00:00.000Z")], vec![]);
        let options = ExportOptions {
            save_index: false,
            ..ExportOptions::default()
        };
        let summary =
            materialize(&collection, temp_dir.path(), &options, &CreationTime::Unavailable)
                .unwrap();
        assert!(summary.index.active_notes.is_empty());
        assert!(!temp_dir.path().join(INDEX_FILENAME).exists());
    }

    // コミットメッセージの形式テスト
    #[test]
    fn test_commit_message_format() {
        let mut metadata = Map::new();
        metadata.insert("id".to_string(), Value::String("n1".to_string()));
        metadata.insert("filename".to_string(), Value::String("n1.txt".to_string()));
        let message = commit_message("n1", &metadata).unwrap();
        assert_eq!(
            message,
            "Note id=n1\n\n{\n \"filename\": \"n1.txt\",\n \"id\": \"n1\"\n}\n"
        );
    }
}
