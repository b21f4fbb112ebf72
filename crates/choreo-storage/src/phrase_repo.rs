//! Phrase notes repository (`data/phrases.json`, keyed by user id).

use std::collections::HashMap;

use choreo_models::phrase::{renumber, reorder, sort_by_order};
use choreo_models::{Phrase, PhraseUpdate};

use crate::error::StorageResult;
use crate::paths::{StoragePaths, PHRASES_TABLE};
use crate::table::JsonTable;

/// Repository for phrase notes.
#[derive(Debug, Clone)]
pub struct PhraseRepository {
    table: JsonTable<HashMap<String, Vec<Phrase>>>,
}

impl PhraseRepository {
    pub fn new(paths: &StoragePaths) -> Self {
        Self {
            table: JsonTable::new(paths.table(PHRASES_TABLE)),
        }
    }

    /// Phrases sorted by position, optionally filtered by `query`.
    pub async fn list(&self, user_id: &str, query: Option<&str>) -> StorageResult<Vec<Phrase>> {
        let mut all = self.table.load().await?;
        let mut phrases = all.remove(user_id).unwrap_or_default();
        sort_by_order(&mut phrases);
        if let Some(q) = query {
            phrases.retain(|p| p.matches(q));
        }
        Ok(phrases)
    }

    /// Append a new phrase at the end.
    pub async fn create(&self, user_id: &str, title: Option<String>) -> StorageResult<Phrase> {
        self.table
            .update(|all| {
                let phrases = all.entry(user_id.to_string()).or_default();
                let phrase = Phrase::new(title, phrases.len() as u32);
                phrases.push(phrase.clone());
                phrase
            })
            .await
    }

    /// Apply a partial update. `None` when the phrase does not exist.
    pub async fn update(
        &self,
        user_id: &str,
        phrase_id: &str,
        update: PhraseUpdate,
    ) -> StorageResult<Option<Phrase>> {
        self.table
            .update(|all| {
                let phrase = all
                    .get_mut(user_id)?
                    .iter_mut()
                    .find(|p| p.id == phrase_id)?;
                phrase.apply(update);
                Some(phrase.clone())
            })
            .await
    }

    /// Delete a phrase and close the gap in positions.
    pub async fn delete(&self, user_id: &str, phrase_id: &str) -> StorageResult<bool> {
        self.table
            .update(|all| {
                let Some(phrases) = all.get_mut(user_id) else {
                    return false;
                };
                let before = phrases.len();
                phrases.retain(|p| p.id != phrase_id);
                if phrases.len() == before {
                    return false;
                }
                sort_by_order(phrases);
                renumber(phrases);
                true
            })
            .await
    }

    /// Reorder to follow `order` and return the resulting list.
    pub async fn reorder(&self, user_id: &str, order: &[String]) -> StorageResult<Vec<Phrase>> {
        self.table
            .update(|all| {
                let phrases = all.entry(user_id.to_string()).or_default();
                reorder(phrases, order);
                phrases.clone()
            })
            .await
    }
}
