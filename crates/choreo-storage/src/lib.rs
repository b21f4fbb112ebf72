//! Local-disk storage for the clip organizer.
//!
//! This crate provides:
//! - The `uploads/`, `exports/` and `data/` directory layout
//! - Cross-device safe file moves and atomic JSON writes
//! - Flat JSON files used as tables (clips, sequences, phrases, projects)

pub mod error;
pub mod fs_utils;
pub mod paths;
pub mod phrase_repo;
pub mod project_repo;
pub mod repos;
pub mod table;

pub use error::{StorageError, StorageResult};
pub use paths::StoragePaths;
pub use phrase_repo::PhraseRepository;
pub use project_repo::ProjectRepository;
pub use repos::{ClipRepository, SequenceRepository};
pub use table::JsonTable;
