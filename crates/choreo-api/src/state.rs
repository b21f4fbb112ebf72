//! Application state.

use std::sync::Arc;

use tracing::debug;

use choreo_media::{ClipMerger, FfmpegRunner};
use choreo_storage::{
    ClipRepository, PhraseRepository, ProjectRepository, SequenceRepository, StoragePaths,
    StorageResult,
};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub paths: StoragePaths,
    pub clips: ClipRepository,
    pub sequences: SequenceRepository,
    pub phrases: PhraseRepository,
    pub projects: ProjectRepository,
    pub merger: ClipMerger,
}

impl AppState {
    /// Create application state, creating storage directories as needed.
    pub async fn new(config: ApiConfig) -> StorageResult<Self> {
        let paths = StoragePaths::new(&config.storage_root);
        paths.ensure_dirs().await?;

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = config.ffmpeg_timeout_secs {
            runner = runner.with_timeout(secs);
        }
        let merger = ClipMerger::new(runner).with_progress(Arc::new(|p| {
            debug!(
                out_time_ms = p.out_time_ms,
                frame = p.frame,
                speed = p.speed,
                "Export progress"
            );
        }));

        Ok(Self {
            clips: ClipRepository::new(&paths),
            sequences: SequenceRepository::new(&paths),
            phrases: PhraseRepository::new(&paths),
            projects: ProjectRepository::new(&paths),
            paths,
            config,
            merger,
        })
    }

    /// Replace the clip merger (e.g. to point at a specific FFmpeg binary).
    pub fn with_merger(mut self, merger: ClipMerger) -> Self {
        self.merger = merger;
        self
    }
}
