use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys every active note must carry
pub const MANDATORY_KEYS: &[&str] = &["id", "content", "creationDate", "lastModified"];

/// Keys a note may carry in addition to the mandatory ones
pub const OPTIONAL_KEYS: &[&str] = &["markdown", "tags", "pinned"];

/// A single exported note
///
/// Only the mandatory fields are interpreted. Any other key the note carries
/// (`markdown`, `tags`, `pinned`) lands in `extra` as raw JSON and is copied to
/// the index and commit messages as is, including `null` and odd types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Identifier assigned by the service (UUID-like, dashes optional)
    pub id: String,
    /// Full note text; the first line acts as the title
    pub content: String,
    /// Creation timestamp in the service format (`YYYY-MM-DDTHH:MM:SS.mmmZ`)
    pub creation_date: String,
    /// Last modification timestamp in the service format
    pub last_modified: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    /// A note with the mandatory fields only
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        creation_date: impl Into<String>,
        last_modified: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            creation_date: creation_date.into(),
            last_modified: last_modified.into(),
            extra: Map::new(),
        }
    }

    /// Attach a pass-through key
    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Content with carriage returns stripped
    pub fn normalized_content(&self) -> String {
        normalize_content(&self.content)
    }

    /// Text up to the first line feed of the normalized content
    pub fn first_line(&self) -> String {
        first_line(&self.normalized_content()).to_string()
    }

    /// Note metadata without `content`, as a JSON object with sorted keys
    pub fn metadata(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert(
            "creationDate".into(),
            Value::String(self.creation_date.clone()),
        );
        map.insert(
            "lastModified".into(),
            Value::String(self.last_modified.clone()),
        );
        map
    }
}

/// Strip carriage returns left by Windows and web clients
pub fn normalize_content(content: &str) -> String {
    content.replace('\r', "")
}

/// Text before the first line feed, or the whole text when there is none
pub fn first_line(content: &str) -> &str {
    content.split_once('\n').map_or(content, |(line, _)| line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Note {
        Note::new(
            "206549e6-2fcc-4b79-b58e-44d758623cfa",
            "simplenote todo\r\n\r\nbody\r\n",
            "2024-03-19T05:03:04.477Z",
            "2024-03-19T15:49:29.254Z",
        )
        .with_extra("markdown", Value::Bool(true))
        .with_extra("tags", serde_json::json!(["tag"]))
    }

    // 改行コード正規化のテスト
    #[test]
    fn test_normalized_content() {
        assert_eq!(sample().normalized_content(), "simplenote todo\n\nbody\n");
        assert_eq!(sample().first_line(), "simplenote todo");
    }

    #[test]
    fn test_first_line_without_newline() {
        assert_eq!(first_line("single line"), "single line");
        assert_eq!(first_line(""), "");
        assert_eq!(first_line("\nsecond"), "");
    }

    // メタデータにcontentが含まれないことのテスト
    #[test]
    fn test_metadata_excludes_content() {
        let metadata = sample().metadata();
        assert!(!metadata.contains_key("content"));
        assert!(!metadata.contains_key("pinned"));
        assert_eq!(metadata["markdown"], Value::Bool(true));
        assert_eq!(metadata["tags"], serde_json::json!(["tag"]));
    }

    // camelCaseでのシリアライズテスト
    #[test]
    fn test_serde_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("creationDate").is_some());
        assert!(value.get("lastModified").is_some());
        assert!(value.get("pinned").is_none());
        let back: Note = serde_json::from_value(value).unwrap();
        assert_eq!(back, sample());
    }

    // 任意キーがそのまま引き継がれることのテスト
    #[test]
    fn test_metadata_passes_through_raw_values() {
        let note = Note::new("n1", "x\n", "2022-01-01T00:00:00.000Z", "2022-01-01T00:00:00.000Z")
            .with_extra("pinned", serde_json::json!(1))
            .with_extra("markdown", Value::Null)
            .with_extra("tags", serde_json::json!("not-a-list"));
        let metadata = note.metadata();
        assert_eq!(metadata["pinned"], serde_json::json!(1));
        assert_eq!(metadata["markdown"], Value::Null);
        assert_eq!(metadata["tags"], serde_json::json!("not-a-list"));
        assert_eq!(metadata.len(), 6);
    }
}
