//! Simplenote Export Library
//!
//! This library converts a Simplenote export (`notes.json`, raw or inside the
//! zip bundle the web app produces) into one plain file per note. File
//! modification and creation times are restored from the note metadata, and
//! each note can optionally be committed to a git repository dated to its
//! last modification, so the output looks to ordinary tools as if it had been
//! written over time.
//!
//! # Architecture
//!
//! The pipeline is a chain of pure steps feeding one side-effecting step:
//! - **Validation**: `validation` checks the document shape before anything is written
//! - **Naming**: `filename` makes titles safe, `duplicates` finds case-insensitive collisions
//! - **Materialization**: `export` writes files, restores timestamps, commits, and writes the index
//! - **Collaborators**: `storage` (input bundles, output files), `git_ops`, `file_times`
//!
//! # Example
//!
//! ```no_run
//! use simplenote_export::{CreationTime, ExportOptions, export_document, load_document};
//! use std::path::Path;
//!
//! # fn main() -> simplenote_export::Result<()> {
//! let document = load_document(Path::new("notes.zip"))?;
//! let options = ExportOptions {
//!     use_first_line_as_filename: true,
//!     ..ExportOptions::default()
//! };
//! let summary = export_document(
//!     document,
//!     Path::new("notes_dir"),
//!     &options,
//!     &CreationTime::detect(),
//! )?;
//! println!("wrote {} files", summary.written.len());
//! # Ok(())
//! # }
//! ```

pub mod check;
pub mod config;
pub mod duplicates;
pub mod dump;
pub mod error;
pub mod export;
pub mod file_times;
pub mod filename;
pub mod git_ops;
pub mod import;
pub mod notes;
pub mod script;
pub mod storage;
pub mod timestamp;
pub mod validation;

// Re-export commonly used types
pub use config::{CommitOrder, ExportOptions, FailurePolicy, OptionsLayer, force_bool};
pub use duplicates::{DuplicateEntry, DuplicateRegistry, find_duplicates, report_duplicates};
pub use error::{ExportError, Result};
pub use export::{
    DUPLICATE_PREFIX, ExportIndex, ExportSummary, INDEX_FILENAME, export_document, materialize,
};
pub use file_times::{CreationTime, CreationTimeSetter};
pub use filename::{safe_filename, safe_filename_with};
pub use git_ops::{GitAuthor, GitOps};
pub use notes::{Note, NoteCollection};
pub use storage::load_document;
pub use validation::{SchemaPolicy, ValidationReport, validate};
