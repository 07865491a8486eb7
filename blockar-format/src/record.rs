use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Metadata for one archived file.
///
/// The remaining header fields (mode, ownership, format markers) are fixed
/// by the codec and not carried per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub size: u64,
    pub mtime: u64,
}

impl Entry {
    pub fn new<S: Into<String>>(name: S, size: u64, mtime: u64) -> Entry {
        Entry {
            name: name.into(),
            size,
            mtime,
        }
    }

    /// Builds an entry from filesystem metadata. Modification times before
    /// the epoch, or unavailable on this platform, are stored as 0.
    pub fn from_metadata<S: Into<String>>(name: S, meta: &std::fs::Metadata) -> Entry {
        Entry::new(name, meta.len(), mtime_secs(meta.modified().ok()))
    }

    #[inline(always)]
    pub fn modified(&self) -> SystemTime {
        UNIX_EPOCH + std::time::Duration::from_secs(self.mtime)
    }
}

#[inline(always)]
fn mtime_secs(modified: Option<SystemTime>) -> u64 {
    modified
        .and_then(|x| x.duration_since(UNIX_EPOCH).ok())
        .map(|x| x.as_secs())
        .unwrap_or(0)
}
