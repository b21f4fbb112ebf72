//! Clip and sequence repositories.

use std::collections::HashMap;

use tracing::info;

use choreo_models::{ClipRecord, Sequence};

use crate::error::StorageResult;
use crate::paths::{StoragePaths, SEQUENCES_TABLE, VIDEOS_TABLE};
use crate::table::JsonTable;

/// Repository for clip records (`data/videos.json`, a flat array in upload order).
#[derive(Debug, Clone)]
pub struct ClipRepository {
    table: JsonTable<Vec<ClipRecord>>,
}

impl ClipRepository {
    pub fn new(paths: &StoragePaths) -> Self {
        Self {
            table: JsonTable::new(paths.table(VIDEOS_TABLE)),
        }
    }

    /// Clips owned by `user_id`, in upload order.
    pub async fn list_for_user(&self, user_id: &str) -> StorageResult<Vec<ClipRecord>> {
        let clips = self.table.load().await?;
        Ok(clips.into_iter().filter(|c| c.user_id == user_id).collect())
    }

    /// Get a single clip owned by `user_id`.
    pub async fn get(&self, user_id: &str, clip_id: &str) -> StorageResult<Option<ClipRecord>> {
        let clips = self.table.load().await?;
        Ok(clips
            .into_iter()
            .find(|c| c.user_id == user_id && c.id.as_str() == clip_id))
    }

    /// Append records in one write.
    pub async fn insert_many(&self, records: Vec<ClipRecord>) -> StorageResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let count = records.len();
        self.table.update(move |clips| clips.extend(records)).await?;
        info!("Recorded {} uploaded clip(s)", count);
        Ok(())
    }

    /// Replace a clip's notes. Returns the updated record, or `None` if the
    /// user owns no such clip.
    pub async fn set_notes(
        &self,
        user_id: &str,
        clip_id: &str,
        notes: Option<String>,
    ) -> StorageResult<Option<ClipRecord>> {
        self.table
            .update(|clips| {
                let clip = clips
                    .iter_mut()
                    .find(|c| c.user_id == user_id && c.id.as_str() == clip_id)?;
                clip.notes = notes.filter(|n| !n.is_empty());
                Some(clip.clone())
            })
            .await
    }

    /// Remove a clip record. Returns the removed record.
    pub async fn remove(&self, user_id: &str, clip_id: &str) -> StorageResult<Option<ClipRecord>> {
        self.table
            .update(|clips| {
                let pos = clips
                    .iter()
                    .position(|c| c.user_id == user_id && c.id.as_str() == clip_id)?;
                Some(clips.remove(pos))
            })
            .await
    }
}

/// Repository for per-user sequences (`data/sequences.json`, keyed by user id).
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    table: JsonTable<HashMap<String, Sequence>>,
}

impl SequenceRepository {
    pub fn new(paths: &StoragePaths) -> Self {
        Self {
            table: JsonTable::new(paths.table(SEQUENCES_TABLE)),
        }
    }

    /// The user's sequence, empty when none was saved.
    pub async fn get(&self, user_id: &str) -> StorageResult<Sequence> {
        let mut sequences = self.table.load().await?;
        Ok(sequences.remove(user_id).unwrap_or_default())
    }

    /// Replace the user's sequence.
    pub async fn save(&self, user_id: &str, sequence: Sequence) -> StorageResult<()> {
        let len = sequence.len();
        self.table
            .update(|sequences| {
                sequences.insert(user_id.to_string(), sequence);
            })
            .await?;
        info!(user_id = %user_id, entries = len, "Saved sequence");
        Ok(())
    }

    /// Drop every occurrence of `entry` from the user's sequence.
    pub async fn remove_entry(&self, user_id: &str, entry: &str) -> StorageResult<usize> {
        self.table
            .update(|sequences| {
                sequences
                    .get_mut(user_id)
                    .map(|s| s.remove_all(entry))
                    .unwrap_or(0)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_models::ClipId;
    use tempfile::TempDir;

    fn setup() -> (TempDir, StoragePaths) {
        let dir = TempDir::new().unwrap();
        let paths = StoragePaths::new(dir.path());
        (dir, paths)
    }

    fn seq(entries: &[&str]) -> Sequence {
        Sequence::new(entries.iter().map(|e| e.to_string()).collect())
    }

    #[tokio::test]
    async fn test_clips_are_scoped_to_user() {
        let (_dir, paths) = setup();
        let repo = ClipRepository::new(&paths);

        let a = ClipRecord::new(ClipId::new(), "alice", "intro.mov", 10);
        let b = ClipRecord::new(ClipId::new(), "bob", "verse.mp4", 20);
        let c = ClipRecord::new(ClipId::new(), "alice", "chorus.mp4", 30);
        repo.insert_many(vec![a.clone(), b.clone(), c.clone()]).await.unwrap();

        let alice = repo.list_for_user("alice").await.unwrap();
        assert_eq!(alice, vec![a.clone(), c]);

        assert!(repo.get("bob", a.id.as_str()).await.unwrap().is_none());
        assert_eq!(repo.get("bob", b.id.as_str()).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn test_set_notes_and_remove() {
        let (_dir, paths) = setup();
        let repo = ClipRepository::new(&paths);
        let clip = ClipRecord::new(ClipId::new(), "alice", "intro.mp4", 10);
        repo.insert_many(vec![clip.clone()]).await.unwrap();

        let updated = repo
            .set_notes("alice", clip.id.as_str(), Some("count 5-6-7-8".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("count 5-6-7-8"));

        assert!(repo
            .set_notes("bob", clip.id.as_str(), Some("x".into()))
            .await
            .unwrap()
            .is_none());

        let removed = repo.remove("alice", clip.id.as_str()).await.unwrap();
        assert_eq!(removed.map(|c| c.id), Some(clip.id.clone()));
        assert!(repo.list_for_user("alice").await.unwrap().is_empty());
        assert!(repo.remove("alice", clip.id.as_str()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sequence_last_write_wins() {
        let (_dir, paths) = setup();
        let repo = SequenceRepository::new(&paths);

        assert!(repo.get("alice").await.unwrap().is_empty());

        repo.save("alice", seq(&["a", "b"])).await.unwrap();
        repo.save("alice", seq(&["b", "a", "b"])).await.unwrap();
        repo.save("bob", seq(&["z"])).await.unwrap();

        assert_eq!(repo.get("alice").await.unwrap().entries(), ["b", "a", "b"]);
        assert_eq!(repo.remove_entry("alice", "b").await.unwrap(), 2);
        assert_eq!(repo.get("alice").await.unwrap().entries(), ["a"]);
        assert_eq!(repo.remove_entry("carol", "b").await.unwrap(), 0);
        assert_eq!(repo.get("bob").await.unwrap().entries(), ["z"]);
    }
}
