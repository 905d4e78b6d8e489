//! Duplicate filename detection
//!
//! Windows and default macOS file systems preserve case but compare names
//! case-insensitively, so `Music.txt`, `MUSIC.txt` and `music.txt` are the
//! same file there. The registry groups notes by the case-folded candidate
//! name derived from their first line.

use crate::notes::NoteCollection;
use log::warn;
use std::collections::BTreeMap;

/// One note that maps to a registry bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEntry {
    /// Candidate name before case folding
    pub candidate: String,
    pub note_id: String,
}

/// Case-folded candidate name to the notes that produce it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateRegistry {
    buckets: BTreeMap<String, Vec<DuplicateEntry>>,
}

impl DuplicateRegistry {
    /// Whether `name` (folded before lookup) is a registered bucket
    pub fn contains(&self, name: &str) -> bool {
        self.buckets.contains_key(&fold_case(name))
    }

    /// Entries for `name` (folded before lookup), in input order
    pub fn get(&self, name: &str) -> Option<&[DuplicateEntry]> {
        self.buckets.get(&fold_case(name)).map(Vec::as_slice)
    }

    /// Buckets holding more than one note
    pub fn collisions(&self) -> impl Iterator<Item = (&str, &[DuplicateEntry])> {
        self.iter().filter(|(_, entries)| entries.len() > 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DuplicateEntry])> {
        self.buckets
            .iter()
            .map(|(key, entries)| (key.as_str(), entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Case folding used for every registry key
pub fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

/// Build the duplicate registry for all active notes
///
/// # Arguments
/// * `collection` - Notes to scan; trashed notes are ignored
/// * `name_fn` - Optional transform applied to each first line (usually
///   [`crate::safe_filename`]); `None` compares raw first lines
/// * `keep_unique` - Keep single-entry buckets instead of pruning them
pub fn find_duplicates(
    collection: &NoteCollection,
    name_fn: Option<&dyn Fn(&str) -> String>,
    keep_unique: bool,
) -> DuplicateRegistry {
    let mut buckets: BTreeMap<String, Vec<DuplicateEntry>> = BTreeMap::new();
    for note in &collection.active_notes {
        let raw = note.first_line();
        let candidate = match name_fn {
            Some(f) => f(&raw),
            None => raw,
        };
        buckets
            .entry(fold_case(&candidate))
            .or_default()
            .push(DuplicateEntry {
                candidate,
                note_id: note.id.clone(),
            });
    }

    if !keep_unique {
        buckets.retain(|_, entries| entries.len() > 1);
    }
    DuplicateRegistry { buckets }
}

/// Log every bucket that holds more than one note
///
/// # Returns
/// The number of colliding buckets reported
pub fn report_duplicates(registry: &DuplicateRegistry) -> usize {
    let mut count = 0;
    for (key, entries) in registry.collisions() {
        let described: Vec<String> = entries
            .iter()
            .map(|e| format!("{:?} (id={})", e.candidate, e.note_id))
            .collect();
        warn!(
            "found a duplicate: lower: {:?} - {}",
            key,
            described.join(", ")
        );
        count += 1;
    }
    count
}
