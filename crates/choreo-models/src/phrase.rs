//! Phrase notes: titled annotations describing sections of a choreography.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to phrases created without one.
pub const DEFAULT_PHRASE_TITLE: &str = "New phrase";

/// A single phrase note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    /// URL of the clip this phrase is about (may be empty)
    #[serde(default)]
    pub video_url: String,
    /// Display position, dense from 0
    pub order_index: u32,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
}

impl Phrase {
    /// Create a phrase at the given position.
    pub fn new(title: Option<String>, order_index: u32) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_PHRASE_TITLE.to_string());

        Self {
            id: Uuid::new_v4().simple().to_string()[..8].to_string(),
            title,
            notes: String::new(),
            video_url: String::new(),
            order_index,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Case-insensitive match of `query` against title and notes.
    ///
    /// A blank query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&q) || self.notes.to_lowercase().contains(&q)
    }

    /// Apply a partial update.
    pub fn apply(&mut self, update: PhraseUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(video_url) = update.video_url {
            self.video_url = video_url;
        }
    }
}

/// Partial update of a phrase's editable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhraseUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Sort phrases by display position.
pub fn sort_by_order(phrases: &mut [Phrase]) {
    phrases.sort_by_key(|p| p.order_index);
}

/// Renumber `order_index` densely from 0, keeping the current slice order.
pub fn renumber(phrases: &mut [Phrase]) {
    for (i, phrase) in phrases.iter_mut().enumerate() {
        phrase.order_index = i as u32;
    }
}

/// Reorder phrases to follow `order` (a list of phrase ids).
///
/// Ids missing from `order` keep their relative order after the listed
/// ones; unknown ids in `order` are ignored. Positions are renumbered.
pub fn reorder(phrases: &mut Vec<Phrase>, order: &[String]) {
    sort_by_order(phrases);
    let mut remaining = std::mem::take(phrases);

    for id in order {
        if let Some(pos) = remaining.iter().position(|p| &p.id == id) {
            phrases.push(remaining.remove(pos));
        }
    }
    phrases.append(&mut remaining);
    renumber(phrases);
}
