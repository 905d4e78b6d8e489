//! Note domain model
//!
//! This module contains the in-memory shape of a Simplenote export:
//! - `note`: a single active note and content helpers
//! - `collection`: the validated `activeNotes`/`trashedNotes` container

mod collection;
mod note;

pub use collection::NoteCollection;
pub use note::{MANDATORY_KEYS, Note, OPTIONAL_KEYS, first_line, normalize_content};
