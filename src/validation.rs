//! Schema validation for loaded export documents
//!
//! The document is checked before anything is deserialized or written, so a
//! malformed export never leaves a partial output directory behind.

use crate::error::{ExportError, Result};
use crate::notes::{MANDATORY_KEYS, OPTIONAL_KEYS, first_line, normalize_content};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Top-level keys of an export document, exactly
pub const TOP_LEVEL_KEYS: &[&str] = &["activeNotes", "trashedNotes"];

/// How the optional note keys are checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaPolicy {
    /// Each note independently: mandatory keys plus any of the declared optional keys
    #[default]
    PerNote,
    /// The first note defines which optional keys every note must carry
    InferFromFirst,
}

impl FromStr for SchemaPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "per-note" => Ok(SchemaPolicy::PerNote),
            "infer-from-first" => Ok(SchemaPolicy::InferFromFirst),
            _ => Err(format!(
                "Invalid schema policy '{}'. Valid options are: per-note, infer-from-first",
                s
            )),
        }
    }
}

/// Non-fatal findings from a successful validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of active notes checked
    pub notes_checked: usize,
    /// Ids of notes whose content has no line feed at all
    pub missing_newline: Vec<String>,
}

/// Validate an export document against the expected shape
///
/// # Arguments
/// * `document` - The parsed export (`activeNotes` and `trashedNotes`)
/// * `policy` - How optional note keys are checked
///
/// # Returns
/// A report of warnings, or `ExportError::Schema` on any structural mismatch.
/// Notes without a line break are logged and reported, not rejected.
pub fn validate(document: &Value, policy: SchemaPolicy) -> Result<ValidationReport> {
    let top = document
        .as_object()
        .ok_or_else(|| ExportError::Schema("document is not a JSON object".to_string()))?;

    let found: BTreeSet<&str> = top.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = TOP_LEVEL_KEYS.iter().copied().collect();
    if found != expected {
        return Err(ExportError::Schema(format!(
            "top-level keys {:?} do not match expected {:?}",
            found, expected
        )));
    }

    let active = top["activeNotes"]
        .as_array()
        .ok_or_else(|| ExportError::Schema("activeNotes is not an array".to_string()))?;
    if !top["trashedNotes"].is_array() {
        return Err(ExportError::Schema(
            "trashedNotes is not an array".to_string(),
        ));
    }

    let notes = active
        .iter()
        .enumerate()
        .map(|(index, note)| {
            note.as_object().ok_or_else(|| {
                ExportError::Schema(format!("activeNotes[{}] is not an object", index))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let inferred_optional = match (policy, notes.first()) {
        (SchemaPolicy::InferFromFirst, Some(first)) => Some(optional_keys_of(first)),
        _ => None,
    };

    let mut report = ValidationReport::default();
    for (index, note) in notes.iter().copied().enumerate() {
        check_note_keys(index, note, inferred_optional.as_ref())?;
        let content = note["content"].as_str().ok_or_else(|| {
            ExportError::Schema(format!("activeNotes[{}].content is not a string", index))
        })?;
        let id = note["id"].as_str().ok_or_else(|| {
            ExportError::Schema(format!("activeNotes[{}].id is not a string", index))
        })?;

        let content = normalize_content(content);
        if !content.contains('\n') {
            let preview: String = first_line(&content).chars().take(100).collect();
            warn!("missing newline in content for note {}: {:?}", id, preview);
            report.missing_newline.push(id.to_string());
        }
        report.notes_checked += 1;
    }

    Ok(report)
}

fn optional_keys_of(note: &Map<String, Value>) -> BTreeSet<&'static str> {
    OPTIONAL_KEYS
        .iter()
        .copied()
        .filter(|key| note.contains_key(*key))
        .collect()
}

fn check_note_keys(
    index: usize,
    note: &Map<String, Value>,
    inferred_optional: Option<&BTreeSet<&'static str>>,
) -> Result<()> {
    for key in MANDATORY_KEYS {
        if !note.contains_key(*key) {
            return Err(ExportError::Schema(format!(
                "activeNotes[{}] is missing key '{}'",
                index, key
            )));
        }
    }

    let allowed = |key: &str| match inferred_optional {
        Some(set) => set.contains(key),
        None => OPTIONAL_KEYS.contains(&key),
    };
    for key in note.keys() {
        if !MANDATORY_KEYS.contains(&key.as_str()) && !allowed(key) {
            return Err(ExportError::Schema(format!(
                "activeNotes[{}] has unexpected key '{}'",
                index, key
            )));
        }
    }

    if let Some(set) = inferred_optional {
        if let Some(missing) = set.iter().find(|key| !note.contains_key(**key)) {
            return Err(ExportError::Schema(format!(
                "activeNotes[{}] is missing key '{}' carried by the first note",
                index, missing
            )));
        }
    }

    Ok(())
}
