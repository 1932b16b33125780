//! Shot ranges and transition hints.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A contiguous span of video between two detected visual discontinuities.
///
/// Times are seconds from the start of the video; the range is half-open
/// `[start, end)`. Shot lists for one video are ordered and non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShotRange {
    /// Start time in seconds (inclusive)
    pub start: f64,
    /// End time in seconds (exclusive)
    pub end: f64,
}

impl ShotRange {
    /// Create a new shot range.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Shot length in seconds.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Midpoint of the shot, in seconds.
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// How one segment hands over to the next.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Hard cut, no blending
    #[default]
    Cut,
    /// Gradual blend between adjacent segments
    Dissolve,
}

impl TransitionKind {
    /// Returns the kind as a string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cut => "cut",
            Self::Dissolve => "dissolve",
        }
    }
}

/// A detected transition between two consecutive shots of one video.
///
/// Hints are only ever emitted between adjacent shots of the same source;
/// they never span videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransitionHint {
    /// Indices of the two adjacent shots the transition sits between
    pub between: (usize, usize),
    /// Transition kind (detection only ever reports dissolves)
    pub kind: TransitionKind,
    /// Approximate transition duration in seconds
    pub approx_duration: f64,
}

impl TransitionHint {
    /// Create a dissolve hint between shots `index` and `index + 1`.
    pub fn dissolve(index: usize, approx_duration: f64) -> Self {
        Self {
            between: (index, index + 1),
            kind: TransitionKind::Dissolve,
            approx_duration,
        }
    }
}
