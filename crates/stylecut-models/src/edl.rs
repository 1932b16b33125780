//! Edit decision lists and render-time parts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shot::TransitionKind;
use crate::style::StyleSummary;

/// Tolerance for the model-level timing invariants, in seconds.
const TIMING_EPSILON: f64 = 1e-6;

/// Errors raised by EDL invariant checks.
#[derive(Debug, Error)]
pub enum EdlError {
    #[error("event {index}: in-point span {span:.6}s does not match duration {duration:.6}s")]
    SpanMismatch {
        index: usize,
        span: f64,
        duration: f64,
    },

    #[error("event {index}: output start {actual:.6}s, expected {expected:.6}s")]
    OutputGap {
        index: usize,
        expected: f64,
        actual: f64,
    },

    #[error("event {index}: non-positive duration {duration:.6}s")]
    EmptyEvent { index: usize, duration: f64 },
}

/// One entry of an edit decision list.
///
/// Events are laid end-to-end with no gaps at the model level; visual
/// overlap from transitions is a rendering-time illusion, not a timeline
/// gap. Order is significant and is the playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    /// Source clip the segment is taken from
    pub source_file: PathBuf,
    /// Segment start within the source, in seconds
    pub in_point_start: f64,
    /// Segment end within the source, in seconds (exclusive)
    pub in_point_end: f64,
    /// Absolute position in the output timeline, in seconds
    pub output_start: f64,
    /// Segment duration in seconds; equals `in_point_end - in_point_start`
    pub duration: f64,
    /// How this event hands over to the next
    #[serde(default)]
    pub transition: TransitionKind,
    /// Transition duration in seconds (0.0 for hard cuts)
    #[serde(default)]
    pub transition_duration: f64,
}

impl Event {
    /// True when this event requests a dissolve.
    pub fn is_dissolve(&self) -> bool {
        self.transition == TransitionKind::Dissolve
    }
}

/// An ordered list of source-to-output timing mappings describing how to
/// assemble a final cut. Written once per render request; re-running
/// synthesis produces a new EDL rather than mutating an old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Edl {
    /// The style that drove synthesis, or a minimal placeholder
    pub style: StyleSummary,
    /// Playback-ordered events
    pub events: Vec<Event>,
}

impl Edl {
    /// Total output duration, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.events.iter().map(|e| e.duration).sum()
    }

    /// Distinct source files referenced by this EDL, in first-use order.
    pub fn source_files(&self) -> Vec<&Path> {
        let mut seen = BTreeSet::new();
        self.events
            .iter()
            .map(|e| e.source_file.as_path())
            .filter(|p| seen.insert(*p))
            .collect()
    }

    /// Check the model-level timing invariants.
    pub fn validate(&self) -> Result<(), EdlError> {
        let mut expected_start = 0.0;
        for (index, event) in self.events.iter().enumerate() {
            if event.duration <= 0.0 {
                return Err(EdlError::EmptyEvent {
                    index,
                    duration: event.duration,
                });
            }
            let span = event.in_point_end - event.in_point_start;
            if (span - event.duration).abs() > TIMING_EPSILON {
                return Err(EdlError::SpanMismatch {
                    index,
                    span,
                    duration: event.duration,
                });
            }
            if (event.output_start - expected_start).abs() > TIMING_EPSILON {
                return Err(EdlError::OutputGap {
                    index,
                    expected: expected_start,
                    actual: event.output_start,
                });
            }
            expected_start += event.duration;
        }
        Ok(())
    }
}

/// A trimmed sub-clip produced for one event during rendering.
///
/// Lifetime is bounded to a single render invocation: deleted after
/// assembly succeeds, left on disk for inspection when it fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedPart {
    /// Path of the trimmed part file
    pub path: PathBuf,
    /// Part duration in seconds
    pub duration: f64,
    /// Transition the originating event requested
    pub transition: TransitionKind,
    /// Requested transition duration in seconds
    pub transition_duration: f64,
}
