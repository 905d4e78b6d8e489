//! Git import script generator
//!
//! For a flat directory of note files (for example one written by the
//! exporter with timestamps restored), emit a shell or batch script that
//! adds and commits each file in chronological order with `--date` set from
//! the file's own times. This is the time-ordered alternative to committing
//! during export.

use crate::error::{ExportError, Result};
use crate::file_times::epoch_seconds;
use chrono::{Local, TimeZone};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// What happened to a file at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileEvent {
    Created,
    Modified,
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileEvent::Created => f.write_str("CREATED"),
            FileEvent::Modified => f.write_str("MODIFIED"),
        }
    }
}

/// One event in the generated history
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimelineEntry {
    pub timestamp: i64,
    pub filename: String,
    pub event: FileEvent,
}

/// Target shell for the generated script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFlavor {
    /// POSIX `sh`
    Shell,
    /// Windows `cmd.exe`
    Batch,
}

impl ScriptFlavor {
    /// Flavor matching the host platform
    pub fn native() -> Self {
        if cfg!(windows) {
            ScriptFlavor::Batch
        } else {
            ScriptFlavor::Shell
        }
    }

    /// Characters the shell would still expand or split inside double quotes
    fn unquotable(self) -> &'static [char] {
        match self {
            ScriptFlavor::Shell => &['"', '$', '`', '\\', '\n', '\r'],
            ScriptFlavor::Batch => &['"', '%', '^', '\n', '\r'],
        }
    }

    fn comment_prefix(self) -> &'static str {
        match self {
            ScriptFlavor::Shell => "#",
            ScriptFlavor::Batch => "REM",
        }
    }
}

impl FromStr for ScriptFlavor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "shell" | "sh" => Ok(ScriptFlavor::Shell),
            "batch" | "bat" => Ok(ScriptFlavor::Batch),
            _ => Err(format!(
                "Invalid script flavor '{}'. Valid options are: shell, batch",
                s
            )),
        }
    }
}

/// Collect creation and modification events for files with `extension` in `dir`
///
/// The earlier of the creation and modification time counts as creation. A
/// separate modification event is recorded only when the two differ. The
/// result is sorted by time, then filename, then event.
pub fn collect_timeline(dir: &Path, extension: &str) -> Result<Vec<TimelineEntry>> {
    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(dir).map_err(|e| ExportError::fs(dir, e))? {
        let dir_entry = dir_entry.map_err(|e| ExportError::fs(dir, e))?;
        let path = dir_entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let metadata = dir_entry.metadata().map_err(|e| ExportError::fs(&path, e))?;
        if !metadata.is_file() {
            continue;
        }

        let modified = metadata.modified().map_err(|e| ExportError::fs(&path, e))?;
        // Not every file system records a birth time
        let created = metadata.created().unwrap_or(modified);
        let mut times = [epoch_seconds(created), epoch_seconds(modified)];
        times.sort();
        let [first, last] = times;

        let filename = dir_entry.file_name().to_string_lossy().into_owned();
        entries.push(TimelineEntry {
            timestamp: first,
            filename: filename.clone(),
            event: FileEvent::Created,
        });
        if first != last {
            entries.push(TimelineEntry {
                timestamp: last,
                filename,
                event: FileEvent::Modified,
            });
        }
    }
    entries.sort();
    Ok(entries)
}

/// Render the timeline as a script of `git add`/`git commit` pairs
///
/// # Errors
/// `ExportError::UnsupportedCharacter` when a filename contains a character
/// the target shell would interpret inside double quotes (`"`, `$`, a
/// backtick or `\` for sh; `"`, `%` or `^` for batch) or a line break.
pub fn render_script(entries: &[TimelineEntry], flavor: ScriptFlavor) -> Result<String> {
    let prefix = flavor.comment_prefix();
    let mut script = format!(
        "{} generated by simplenote-export {}\n",
        prefix,
        env!("CARGO_PKG_VERSION")
    );
    script.push_str("git init\n");

    for entry in entries {
        if let Some(character) = entry
            .filename
            .chars()
            .find(|c| flavor.unquotable().contains(c))
        {
            return Err(ExportError::UnsupportedCharacter {
                filename: entry.filename.clone(),
                character,
            });
        }
        let local = Local
            .timestamp_opt(entry.timestamp, 0)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());
        script.push_str(&format!("{} {}\n", prefix, local));
        script.push_str(&format!("git add \"{}\"\n", entry.filename));
        script.push_str(&format!(
            "git commit --allow-empty -m \"{} {}\" --date=\"{} +0000\" \"{}\"\n",
            entry.event, entry.filename, entry.timestamp, entry.filename
        ));
    }
    Ok(script)
}
