use super::note::Note;
use crate::error::{ExportError, Result};
use crate::validation::{SchemaPolicy, ValidationReport, validate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The full contents of one export
///
/// `active_notes` keeps input order, which decides write and commit order.
/// `trashed_notes` is never interpreted and is carried through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCollection {
    pub active_notes: Vec<Note>,
    pub trashed_notes: Vec<Value>,
}

impl NoteCollection {
    /// Create a collection from notes that are already known to be well formed
    pub fn new(active_notes: Vec<Note>, trashed_notes: Vec<Value>) -> Self {
        Self {
            active_notes,
            trashed_notes,
        }
    }

    /// Validate a parsed export document and build the collection from it
    ///
    /// # Arguments
    /// * `document` - Parsed JSON of the export
    /// * `policy` - How optional note keys are checked
    ///
    /// # Returns
    /// The collection and the validation warnings, or `ExportError::Schema`
    pub fn from_document(
        document: Value,
        policy: SchemaPolicy,
    ) -> Result<(Self, ValidationReport)> {
        let report = validate(&document, policy)?;
        let collection = serde_json::from_value(document)
            .map_err(|e| ExportError::Schema(format!("malformed note field: {}", e)))?;
        Ok((collection, report))
    }

    /// Map from id (dashes removed) to note, ignoring trashed notes
    ///
    /// Ids round-tripped through the service may gain or lose dashes, so the
    /// compact form is the stable key when comparing two exports.
    pub fn by_compact_id(&self) -> BTreeMap<String, &Note> {
        self.active_notes
            .iter()
            .map(|note| (note.id.replace('-', ""), note))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.active_notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active_notes.is_empty()
    }
}
