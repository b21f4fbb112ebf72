//! FFmpeg CLI wrapper for the clip organizer.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - FFprobe metadata (duration, resolution, audio presence)
//! - Clip concatenation: stream copy first, re-encode on failure

pub mod command;
pub mod concat;
pub mod error;
pub mod probe;
pub mod progress;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{build_concat_filter, write_concat_list, ClipMerger};
pub use error::{MediaError, MediaResult};
pub use probe::{get_duration, probe_video, VideoInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
