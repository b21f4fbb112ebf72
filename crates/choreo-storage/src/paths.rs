//! Directory layout under the storage root.

use std::path::{Path, PathBuf};

use choreo_models::{is_safe_filename, is_valid_user_id};
use tokio::fs;
use tracing::info;

use crate::error::{StorageError, StorageResult};

/// Table file names inside `data/`.
pub const VIDEOS_TABLE: &str = "videos.json";
pub const SEQUENCES_TABLE: &str = "sequences.json";
pub const PHRASES_TABLE: &str = "phrases.json";
pub const PROJECTS_TABLE: &str = "projects.json";

/// Resolved storage directories.
///
/// ```text
/// <root>/uploads/<userId>/<clipId><ext>
/// <root>/exports/choreo_<userId>_<ms>.mp4
/// <root>/data/*.json
/// <root>/data/staging/
/// ```
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
    uploads: PathBuf,
    exports: PathBuf,
    data: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            uploads: root.join("uploads"),
            exports: root.join("exports"),
            data: root.join("data"),
            root,
        }
    }

    /// Create every directory the server writes into.
    pub async fn ensure_dirs(&self) -> StorageResult<()> {
        for dir in [&self.uploads, &self.exports, &self.data, &self.staging_dir()] {
            fs::create_dir_all(dir).await?;
        }
        info!("Storage ready at {}", self.root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads
    }

    pub fn exports_dir(&self) -> &Path {
        &self.exports
    }

    pub fn data_dir(&self) -> &Path {
        &self.data
    }

    /// Where multipart bodies land before the owning user is known.
    /// Kept outside `uploads/` so partial files are never served.
    pub fn staging_dir(&self) -> PathBuf {
        self.data.join("staging")
    }

    pub fn table(&self, name: &str) -> PathBuf {
        self.data.join(name)
    }

    /// `uploads/<userId>`, rejecting ids that could escape the directory.
    pub fn user_upload_dir(&self, user_id: &str) -> StorageResult<PathBuf> {
        if !is_valid_user_id(user_id) {
            return Err(StorageError::invalid_key(user_id));
        }
        Ok(self.uploads.join(user_id))
    }

    /// `uploads/<userId>/<filename>`.
    pub fn upload_path(&self, user_id: &str, filename: &str) -> StorageResult<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(StorageError::invalid_key(filename));
        }
        Ok(self.user_upload_dir(user_id)?.join(filename))
    }
}
