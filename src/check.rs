//! Read-only sanity check of an export
//!
//! Finds problems before exporting: schema mismatches, notes without a line
//! break, first lines that collide case-insensitively, and (for zip bundles)
//! member files that would overwrite each other on a case-insensitive file
//! system. Nothing is written.

use crate::duplicates::{find_duplicates, report_duplicates};
use crate::error::Result;
use crate::notes::NoteCollection;
use crate::storage::{archive_member_collisions, is_raw_json, load_document};
use crate::validation::{SchemaPolicy, ValidationReport};
use log::{info, warn};
use std::path::Path;

/// Findings of a sanity check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub validation: ValidationReport,
    /// Buckets of raw first lines shared by more than one note
    pub duplicate_first_lines: usize,
    /// Archive members that collide case-insensitively
    pub archive_collisions: Vec<(String, String)>,
}

impl CheckReport {
    /// Whether anything worth a second look was found
    pub fn has_findings(&self) -> bool {
        !self.validation.missing_newline.is_empty()
            || self.duplicate_first_lines > 0
            || !self.archive_collisions.is_empty()
    }
}

/// Check the export at `path` and log every finding
///
/// # Errors
/// Schema errors and unreadable input are returned; everything else is a
/// finding in the report.
pub fn sanity_check(path: &Path, policy: SchemaPolicy) -> Result<CheckReport> {
    let mut report = CheckReport::default();

    if !is_raw_json(path) {
        info!("Checking text files in zip");
        report.archive_collisions = archive_member_collisions(path)?;
        for (first, second) in &report.archive_collisions {
            warn!(
                "found a duplicate: lower: {:?} - {:?} and {:?}",
                first.to_lowercase(),
                second,
                first
            );
        }
    }

    info!("Checking json");
    let (collection, validation) = NoteCollection::from_document(load_document(path)?, policy)?;
    report.validation = validation;

    let registry = find_duplicates(&collection, None, false);
    report.duplicate_first_lines = report_duplicates(&registry);
    Ok(report)
}
