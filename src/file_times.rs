//! File timestamp restoration
//!
//! Access and modification times are set with std on every platform.
//! Creation time only exists as a settable property on Windows, so it is
//! modelled as an optional capability the caller hands to the exporter.

use crate::error::{ExportError, Result};
use std::fs::{File, FileTimes};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Platform hook that can set a file's creation (birth) time
pub trait CreationTimeSetter {
    fn set_creation_time(&self, path: &Path, created: SystemTime) -> Result<()>;
}

/// Whether a creation-time setter is available on this host
pub enum CreationTime {
    Unavailable,
    Available(Box<dyn CreationTimeSetter>),
}

impl CreationTime {
    /// The native setter where the platform has one
    pub fn detect() -> Self {
        #[cfg(windows)]
        {
            CreationTime::Available(Box::new(WindowsCreationTime))
        }
        #[cfg(not(windows))]
        {
            CreationTime::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, CreationTime::Available(_))
    }
}

impl std::fmt::Debug for CreationTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreationTime::Unavailable => f.write_str("Unavailable"),
            CreationTime::Available(_) => f.write_str("Available"),
        }
    }
}

/// Convert epoch seconds (possibly before 1970) to a `SystemTime`
pub fn system_time(epoch_seconds: i64) -> SystemTime {
    if epoch_seconds >= 0 {
        UNIX_EPOCH + Duration::from_secs(epoch_seconds.unsigned_abs())
    } else {
        UNIX_EPOCH - Duration::from_secs(epoch_seconds.unsigned_abs())
    }
}

/// Whole epoch seconds of a `SystemTime`, negative before 1970
pub fn epoch_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}

/// Set access time to `accessed` and modification time to `modified`
pub fn set_file_times(path: &Path, accessed: SystemTime, modified: SystemTime) -> Result<()> {
    let file = File::options()
        .write(true)
        .open(path)
        .map_err(|e| ExportError::fs(path, e))?;
    let times = FileTimes::new()
        .set_accessed(accessed)
        .set_modified(modified);
    file.set_times(times).map_err(|e| ExportError::fs(path, e))
}

#[cfg(windows)]
struct WindowsCreationTime;

#[cfg(windows)]
impl CreationTimeSetter for WindowsCreationTime {
    fn set_creation_time(&self, path: &Path, created: SystemTime) -> Result<()> {
        use std::os::windows::fs::FileTimesExt;

        let file = File::options()
            .write(true)
            .open(path)
            .map_err(|e| ExportError::fs(path, e))?;
        let times = FileTimes::new().set_created(created);
        file.set_times(times).map_err(|e| ExportError::fs(path, e))
    }
}
