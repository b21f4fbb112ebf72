//! Per-user playback sequences.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::clip::ClipRecord;

/// Ordered list of clip ids for one user.
///
/// Entries are kept as plain strings: clients may persist filenames
/// instead of ids, and those are resolved at export time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Sequence(pub Vec<String>);

impl Sequence {
    pub fn new(entries: Vec<String>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    /// Remove every occurrence of `entry`. Returns how many were removed.
    pub fn remove_all(&mut self, entry: &str) -> usize {
        let before = self.0.len();
        self.0.retain(|e| e != entry);
        before - self.0.len()
    }

    /// Map each entry to the filename stored on disk.
    ///
    /// Entries matching a clip id resolve to that clip's filename; anything
    /// else is assumed to already be a filename. Order and duplicates are
    /// preserved.
    pub fn resolve_filenames(&self, clips: &[ClipRecord]) -> Vec<String> {
        self.0
            .iter()
            .map(|entry| {
                clips
                    .iter()
                    .find(|c| c.id.as_str() == entry)
                    .map(|c| c.filename.clone())
                    .unwrap_or_else(|| entry.clone())
            })
            .collect()
    }
}

impl From<Vec<String>> for Sequence {
    fn from(entries: Vec<String>) -> Self {
        Self(entries)
    }
}
