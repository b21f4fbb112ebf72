//! Uploaded clip models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Extension used when the uploaded file name carries none.
pub const DEFAULT_CLIP_EXTENSION: &str = ".mp4";

/// Unique identifier for an uploaded clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    /// Generate a new random clip ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClipId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A row of the clips table (`videos.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipRecord {
    /// Generated clip id
    pub id: ClipId,

    /// Owning user
    pub user_id: String,

    /// Stored file name inside the user's upload folder (`<id><ext>`)
    pub filename: String,

    /// Public URL path of the stored file
    pub url: String,

    /// File name as sent by the browser
    pub original_name: String,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,

    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,

    /// Duration in seconds, when the file could be probed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Free-text annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ClipRecord {
    /// Build the record for a freshly uploaded file.
    ///
    /// The stored filename is derived from the id and the extension of
    /// `original_name`, so two uploads of the same file never collide.
    pub fn new(id: ClipId, user_id: impl Into<String>, original_name: impl Into<String>, size: u64) -> Self {
        let user_id = user_id.into();
        let original_name = original_name.into();
        let filename = format!("{}{}", id, extension_of(&original_name));
        let url = upload_url(&user_id, &filename);

        Self {
            id,
            user_id,
            filename,
            url,
            original_name,
            size,
            uploaded_at: Utc::now(),
            duration: None,
            notes: None,
        }
    }

    /// Set probed duration.
    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }
}

/// Public URL of an uploaded file.
pub fn upload_url(user_id: &str, filename: &str) -> String {
    format!("/uploads/{}/{}", user_id, filename)
}

/// Extension (with the leading dot, lowercased) of a browser-supplied file name.
///
/// Falls back to [`DEFAULT_CLIP_EXTENSION`] when there is none or when it
/// contains anything but ASCII alphanumerics.
pub fn extension_of(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 8
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => DEFAULT_CLIP_EXTENSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("intro move.MOV"), ".mov");
        assert_eq!(extension_of("finale.webm"), ".webm");
        assert_eq!(extension_of("no_extension"), ".mp4");
        assert_eq!(extension_of(".hidden"), ".mp4");
        assert_eq!(extension_of("weird.m p4"), ".mp4");
        assert_eq!(extension_of("C:\\clips\\spin.mp4"), ".mp4");
    }

    #[test]
    fn test_new_record_paths() {
        let id = ClipId::from_string("abc");
        let record = ClipRecord::new(id, "user_1", "Spin Section.mkv", 42);

        assert_eq!(record.filename, "abc.mkv");
        assert_eq!(record.url, "/uploads/user_1/abc.mkv");
        assert_eq!(record.original_name, "Spin Section.mkv");
        assert_eq!(record.size, 42);
        assert!(record.notes.is_none());
    }

    #[test]
    fn test_record_json_is_camel_case() {
        let record = ClipRecord::new(ClipId::from_string("abc"), "u", "a.mp4", 1);
        let json = serde_json::to_value(&record).unwrap();

        assert!(json.get("userId").is_some());
        assert!(json.get("originalName").is_some());
        assert!(json.get("uploadedAt").is_some());
        // Optional fields are omitted until set
        assert!(json.get("duration").is_none());
    }
}
