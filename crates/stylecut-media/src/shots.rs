//! Content-change shot boundary detection.
//!
//! Boundaries come from FFmpeg's `select='gt(scene,θ)'` filter with
//! `metadata=print` writing the selected frame timestamps to a scratch
//! file. The threshold is expressed on the 0–100 content-difference scale
//! of the upstream detector and mapped to FFmpeg's 0–1 scene score.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use stylecut_models::ShotRange;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_media;

/// Default content-difference threshold (0–100 scale).
pub const DEFAULT_SHOT_THRESHOLD: f64 = 30.0;

/// Boundaries closer together than this are treated as one, in seconds.
const MIN_BOUNDARY_GAP: f64 = 0.001;

/// Detect shot boundaries in a video.
///
/// Returns ordered, non-overlapping half-open ranges covering the video
/// from its start to its probed duration. An empty list means no content
/// changes crossed the threshold ("no shots detected").
pub async fn detect_shots(video: impl AsRef<Path>, threshold: f64) -> MediaResult<Vec<ShotRange>> {
    let video = video.as_ref();
    let info = probe_media(video).await?;
    if info.duration <= 0.0 {
        return Err(MediaError::invalid_media(format!(
            "zero-duration video: {}",
            video.display()
        )));
    }

    let scratch = NamedTempFile::new()?;
    let scene_score = (threshold / 100.0).clamp(0.0, 1.0);
    let filter = format!(
        "select='gt(scene,{:.4})',metadata=print:file={}",
        scene_score,
        scratch.path().display()
    );

    let cmd = FfmpegCommand::new(video, "-")
        .video_filter(filter)
        .no_audio()
        .format("null");

    FfmpegRunner::new().run(&cmd).await?;

    let text = tokio::fs::read_to_string(scratch.path()).await?;
    let boundaries = parse_scene_times(&text);
    debug!(
        video = %video.display(),
        boundaries = boundaries.len(),
        "Shot boundary detection complete"
    );

    Ok(fold_boundaries(info.duration, boundaries))
}

/// Pull `pts_time:` values out of `metadata=print` output.
fn parse_scene_times(text: &str) -> Vec<f64> {
    let mut times = Vec::new();
    for line in text.lines() {
        if let Some(idx) = line.find("pts_time:") {
            let value = line[idx + "pts_time:".len()..]
                .split_whitespace()
                .next()
                .unwrap_or("");
            if let Ok(t) = value.parse::<f64>() {
                times.push(t);
            }
        }
    }
    times
}

/// Fold boundary timestamps into half-open shot ranges over `[0, duration)`.
///
/// No boundaries means no shots were detected; callers treat the empty
/// list as the degraded "no shots" profile.
fn fold_boundaries(duration: f64, mut boundaries: Vec<f64>) -> Vec<ShotRange> {
    boundaries.retain(|t| *t > MIN_BOUNDARY_GAP && *t < duration - MIN_BOUNDARY_GAP);
    if boundaries.is_empty() {
        return Vec::new();
    }
    boundaries.sort_by(f64::total_cmp);
    boundaries.dedup_by(|a, b| (*a - *b).abs() < MIN_BOUNDARY_GAP);

    let mut shots = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0.0;
    for boundary in boundaries {
        shots.push(ShotRange::new(start, boundary));
        start = boundary;
    }
    shots.push(ShotRange::new(start, duration));
    shots
}
