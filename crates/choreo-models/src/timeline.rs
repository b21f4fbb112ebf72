//! Editor timeline state.
//!
//! The editor shows a fixed number of tracks; clips from the library are
//! dropped onto a track at a horizontal pixel offset, which is quantized to
//! whole seconds. Placements can be moved between tracks or removed. When
//! the arrangement is saved, the timeline is flattened into the ordered list
//! of clip ids the export routine consumes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Horizontal zoom of the timeline view.
pub const PIXELS_PER_SECOND: f64 = 10.0;

/// Number of tracks shown by the editor.
pub const TRACK_COUNT: u32 = 3;

/// The timeline always spans at least this many seconds.
pub const MIN_VISIBLE_DURATION_SECS: f64 = 60.0;

/// Result type for timeline operations.
pub type TimelineResult<T> = Result<T, TimelineError>;

/// Errors raised by timeline mutations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("Track index {0} is out of range")]
    InvalidTrack(u32),

    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),
}

/// A clip placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineClip {
    /// Placement id (distinct from the clip id; a clip can be placed twice)
    pub id: String,
    /// Library clip this placement refers to
    pub clip_id: String,
    /// Start time in seconds
    pub start_time: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Track the placement sits on
    pub track_index: u32,
}

impl TimelineClip {
    /// End of the placement in seconds.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Ordered collection of timeline placements.
///
/// Placements keep their insertion order; that order only matters as the
/// final tie-breaker in [`Timeline::sequence`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Timeline {
    clips: Vec<TimelineClip>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline from placements received from a client.
    ///
    /// Start times are floored to whole seconds and clamped to zero. Track
    /// indexes and durations are validated the same way [`Timeline::place`]
    /// validates them.
    pub fn from_clips(clips: Vec<TimelineClip>) -> TimelineResult<Self> {
        let mut timeline = Self::new();
        for mut clip in clips {
            check_track(clip.track_index)?;
            check_duration(clip.duration)?;
            clip.start_time = clip.start_time.floor().max(0.0);
            timeline.clips.push(clip);
        }
        Ok(timeline)
    }

    pub fn clips(&self) -> &[TimelineClip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TimelineClip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Drop a library clip onto a track at a pixel offset.
    ///
    /// Returns the id of the new placement.
    pub fn place(
        &mut self,
        clip_id: impl Into<String>,
        duration: f64,
        x_pixels: f64,
        track_index: u32,
    ) -> TimelineResult<String> {
        check_track(track_index)?;
        check_duration(duration)?;

        let id = format!("t{}", Uuid::new_v4().simple());
        self.clips.push(TimelineClip {
            id: id.clone(),
            clip_id: clip_id.into(),
            start_time: start_time_at(x_pixels),
            duration,
            track_index,
        });
        Ok(id)
    }

    /// Move an existing placement to a pixel offset on a (possibly different) track.
    ///
    /// Returns `false` when no placement has that id.
    pub fn move_clip(&mut self, id: &str, x_pixels: f64, track_index: u32) -> TimelineResult<bool> {
        check_track(track_index)?;

        match self.clips.iter_mut().find(|c| c.id == id) {
            Some(clip) => {
                clip.start_time = start_time_at(x_pixels);
                clip.track_index = track_index;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove a placement. Returns whether one was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.clips.len();
        self.clips.retain(|c| c.id != id);
        before != self.clips.len()
    }

    /// Visible length of the timeline in seconds.
    pub fn total_duration(&self) -> f64 {
        self.clips
            .iter()
            .map(TimelineClip::end_time)
            .fold(MIN_VISIBLE_DURATION_SECS, f64::max)
    }

    /// Flatten the timeline into the ordered clip ids used for export.
    ///
    /// Ordered by start time, then track index, then insertion order.
    pub fn sequence(&self) -> Vec<String> {
        let mut ordered: Vec<(usize, &TimelineClip)> = self.clips.iter().enumerate().collect();
        ordered.sort_by(|(ia, a), (ib, b)| {
            a.start_time
                .total_cmp(&b.start_time)
                .then(a.track_index.cmp(&b.track_index))
                .then(ia.cmp(ib))
        });
        ordered.into_iter().map(|(_, c)| c.clip_id.clone()).collect()
    }
}

/// Convert a drop position to a whole-second, non-negative start time.
pub fn start_time_at(x_pixels: f64) -> f64 {
    if !x_pixels.is_finite() {
        return 0.0;
    }
    (x_pixels / PIXELS_PER_SECOND).floor().max(0.0)
}

fn check_track(track_index: u32) -> TimelineResult<()> {
    if track_index >= TRACK_COUNT {
        return Err(TimelineError::InvalidTrack(track_index));
    }
    Ok(())
}

fn check_duration(duration: f64) -> TimelineResult<()> {
    // Zero is allowed: library clips have no duration until probed
    if !duration.is_finite() || duration < 0.0 {
        return Err(TimelineError::InvalidDuration(duration));
    }
    Ok(())
}
