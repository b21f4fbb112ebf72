//! Shared data models for the choreography clip organizer.
//!
//! This crate provides Serde-serializable types for:
//! - Uploaded clips and their table rows
//! - Per-user playback sequences
//! - Client timeline state (tracks, placements, sequence derivation)
//! - Phrase notes and projects
//! - Export results and encoding defaults

pub mod clip;
pub mod encoding;
pub mod export;
pub mod phrase;
pub mod project;
pub mod sequence;
pub mod timeline;
pub mod utils;

// Re-export common types
pub use clip::{ClipId, ClipRecord};
pub use encoding::EncodingConfig;
pub use export::{ExportMode, ExportResult};
pub use phrase::{Phrase, PhraseUpdate};
pub use project::Project;
pub use sequence::Sequence;
pub use timeline::{Timeline, TimelineClip, TimelineError, TimelineResult};
pub use utils::{is_safe_filename, is_valid_user_id, DEFAULT_USER_ID};
