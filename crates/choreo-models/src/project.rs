//! Choreography projects.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message returned when a project is saved without a title.
pub const MISSING_TITLE_MESSAGE: &str = "Please add a project title before saving.";

/// Summary of a saved project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub clip_count: u32,
    pub last_modified: DateTime<Utc>,
}

impl Project {
    /// Create a project. The name is trimmed and must not be blank.
    pub fn new(name: &str, clip_count: u32) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MISSING_TITLE_MESSAGE.to_string());
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            clip_count,
            last_modified: Utc::now(),
        })
    }
}
