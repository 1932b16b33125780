//! Per-video analysis profiles.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::shot::{ShotRange, TransitionHint};

/// Summary statistics over a video's audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct AudioSummary {
    /// Sample rate of the analyzed stream
    pub sample_rate: u32,
    /// Duration of the analyzed stream in seconds
    pub duration: f64,
    /// Mean of windowed RMS loudness
    pub loudness_mean: f64,
    /// Standard deviation of windowed RMS loudness
    pub loudness_stddev: f64,
    /// Estimated tempo in BPM. `None` means beat tracking failed;
    /// callers must treat absence as "unknown", never as zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
}

/// Everything the analyzer learned about one source video.
///
/// Produced once per analyzed video and read-only downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoProfile {
    /// Path of the analyzed video
    pub path: PathBuf,

    /// Detected shots, ordered and non-overlapping
    pub shots: Vec<ShotRange>,

    /// Length of each detected shot, in seconds
    pub cut_lengths: Vec<f64>,

    /// Arithmetic mean of `cut_lengths`. Absent when no shots were
    /// detected; absent is not zero (a zero would bias synthesis toward
    /// degenerate micro-cuts).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_cut_length: Option<f64>,

    /// Audio feature summary
    pub audio: AudioSummary,

    /// Detected dissolve transitions between adjacent shots
    pub transitions: Vec<TransitionHint>,

    /// Subtitle track produced by the transcription collaborator, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<PathBuf>,
}

impl VideoProfile {
    /// Build a profile from detected shots, deriving cut lengths and the
    /// average. The average stays absent when `shots` is empty.
    pub fn new(
        path: impl Into<PathBuf>,
        shots: Vec<ShotRange>,
        audio: AudioSummary,
        transitions: Vec<TransitionHint>,
    ) -> Self {
        let cut_lengths: Vec<f64> = shots.iter().map(ShotRange::length).collect();
        let average_cut_length = if cut_lengths.is_empty() {
            None
        } else {
            Some(cut_lengths.iter().sum::<f64>() / cut_lengths.len() as f64)
        };

        Self {
            path: path.into(),
            shots,
            cut_lengths,
            average_cut_length,
            audio,
            transitions,
            subtitles: None,
        }
    }

    /// Attach a subtitle track path.
    pub fn with_subtitles(mut self, subtitles: Option<PathBuf>) -> Self {
        self.subtitles = subtitles;
        self
    }
}
