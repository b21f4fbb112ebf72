//! Project repository (`data/projects.json`, keyed by user id).

use std::collections::HashMap;

use choreo_models::Project;

use crate::error::StorageResult;
use crate::paths::{StoragePaths, PROJECTS_TABLE};
use crate::table::JsonTable;

/// Repository for saved projects.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    table: JsonTable<HashMap<String, Vec<Project>>>,
}

impl ProjectRepository {
    pub fn new(paths: &StoragePaths) -> Self {
        Self {
            table: JsonTable::new(paths.table(PROJECTS_TABLE)),
        }
    }

    /// Projects for a user, most recently modified first.
    pub async fn list(&self, user_id: &str) -> StorageResult<Vec<Project>> {
        let mut all = self.table.load().await?;
        let mut projects = all.remove(user_id).unwrap_or_default();
        projects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(projects)
    }

    pub async fn insert(&self, user_id: &str, project: Project) -> StorageResult<()> {
        self.table
            .update(|all| all.entry(user_id.to_string()).or_default().push(project))
            .await
    }
}
