//! Export results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the merged file was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    /// Concat demuxer with stream copy
    Copy,
    /// Full re-encode through the concat filter
    Reencode,
}

impl ExportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportMode::Copy => "copy",
            ExportMode::Reencode => "reencode",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    /// File name inside the exports directory
    pub output_name: String,
    /// Which path produced the file
    pub mode: ExportMode,
    /// Number of clips merged
    pub clip_count: usize,
}

impl ExportResult {
    /// Public URL of the exported file.
    pub fn export_url(&self) -> String {
        format!("/exports/{}", self.output_name)
    }
}

/// Export file name for a user at a given millisecond timestamp.
pub fn export_file_name(user_id: &str, timestamp_ms: i64) -> String {
    format!("choreo_{}_{}.mp4", user_id, timestamp_ms)
}

/// Concat list file name. `nonce` keeps simultaneous exports apart.
pub fn concat_list_name(user_id: &str, timestamp_ms: i64, nonce: &str) -> String {
    format!("concat_{}_{}_{}.txt", user_id, timestamp_ms, nonce)
}
