//! Tests for the auxiliary tools: sanity check, dump, git script and import

mod common;

use common::{document, note_json, write_json_export, write_zip_export};
use simplenote_export::check::sanity_check;
use simplenote_export::dump::{DumpFormat, dump_notes};
use simplenote_export::import::{collect_notes, write_collection};
use simplenote_export::script::{FileEvent, ScriptFlavor, collect_timeline, render_script};
use simplenote_export::{
    CreationTime, ExportOptions, NoteCollection, SchemaPolicy, export_document, load_document,
};
use std::fs;
use tempfile::TempDir;

fn notes_with_duplicates() -> serde_json::Value {
    document(
        vec![
            note_json(
                "id1",
                "Music\nlist",
                "2021-01-01T00:00:00.000Z",
                "2021-01-01T00:00:00.000Z",
            ),
            note_json(
                "id2",
                "music\nother",
                "2021-01-01T00:00:00.000Z",
                "2021-01-02T00:00:00.000Z",
            ),
            note_json(
                "id3",
                "single line",
                "2021-01-01T00:00:00.000Z",
                "2021-01-03T00:00:00.000Z",
            ),
        ],
        vec![],
    )
}

// サニティチェックのテスト
#[test]
fn test_sanity_check_findings() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_zip_export(
        temp_dir.path(),
        &notes_with_duplicates(),
        &["source/notes/Music.txt", "source/notes/MUSIC.txt"],
    );

    let report = sanity_check(&input, SchemaPolicy::PerNote).unwrap();
    assert!(report.has_findings());
    assert_eq!(report.validation.notes_checked, 3);
    assert_eq!(report.validation.missing_newline, vec!["id3".to_string()]);
    assert_eq!(report.duplicate_first_lines, 1);
    assert_eq!(
        report.archive_collisions,
        vec![(
            "source/notes/Music.txt".to_string(),
            "source/notes/MUSIC.txt".to_string()
        )]
    );
}

#[test]
fn test_sanity_check_clean_json() {
    let doc = document(
        vec![note_json(
            "a1",
            "Fine\nnote",
            "2021-01-01T00:00:00.000Z",
            "2021-01-01T00:00:00.000Z",
        )],
        vec![],
    );
    let (_temp_dir, input) = write_json_export(&doc);
    let report = sanity_check(&input, SchemaPolicy::PerNote).unwrap();
    assert!(!report.has_findings());
}

// デバッグダンプのテスト
#[test]
fn test_dump_sorted_by_id() {
    let (temp_dir, input) = write_json_export(&notes_with_duplicates());
    let (collection, _) =
        NoteCollection::from_document(load_document(&input).unwrap(), SchemaPolicy::PerNote)
            .unwrap();

    let yaml_path = temp_dir.path().join("debug.yaml");
    dump_notes(&collection, &yaml_path, DumpFormat::Yaml).unwrap();
    let yaml = fs::read_to_string(&yaml_path).unwrap();
    let first = yaml.find("id1:").unwrap();
    let third = yaml.find("id3:").unwrap();
    assert!(first < third);

    let json_path = temp_dir.path().join("debug.json");
    dump_notes(&collection, &json_path, DumpFormat::Json).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed["id2"]["content"], "music\nother");
}

// エクスポート結果からの git スクリプト生成テスト
#[test]
fn test_git_script_from_export() {
    let (temp_dir, input) = write_json_export(&notes_with_duplicates());
    let output = temp_dir.path().join("out");
    export_document(
        load_document(&input).unwrap(),
        &output,
        &ExportOptions::default(),
        &CreationTime::Unavailable,
    )
    .unwrap();

    let timeline = collect_timeline(&output, "txt").unwrap();
    let created: Vec<&str> = timeline
        .iter()
        .filter(|e| e.event == FileEvent::Created)
        .map(|e| e.filename.as_str())
        .collect();
    assert_eq!(created, vec!["id1.txt", "id2.txt", "id3.txt"]);

    let script = render_script(&timeline, ScriptFlavor::Shell).unwrap();
    assert!(script.contains("git add \"id1.txt\""));
    assert!(!script.contains("simplenote_index.json"));
}

// ファイルからのインポートと再エクスポートのテスト
#[test]
fn test_import_then_export() {
    let source = TempDir::new().unwrap();
    fs::write(source.path().join("alpha.txt"), "Alpha\nfirst").unwrap();
    fs::write(source.path().join("beta.md"), "# Beta\nsecond").unwrap();

    let collection = collect_notes(source.path()).unwrap();
    let work = TempDir::new().unwrap();
    let import_file = work.path().join("import.json");
    write_collection(&collection, &import_file).unwrap();

    let options = ExportOptions {
        use_first_line_as_filename: true,
        ..ExportOptions::default()
    };
    let output = work.path().join("out");
    export_document(
        load_document(&import_file).unwrap(),
        &output,
        &options,
        &CreationTime::Unavailable,
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(output.join("Alpha.txt")).unwrap(),
        "Alpha\nfirst"
    );
    assert_eq!(
        fs::read_to_string(output.join("Beta.txt")).unwrap(),
        "# Beta\nsecond"
    );
}
