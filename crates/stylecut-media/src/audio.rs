//! Audio extraction and feature analysis.
//!
//! Audio is pulled out of the container with FFmpeg as mono f32le at a
//! fixed rate into a scratch file, loaded into memory, and summarized:
//! windowed RMS loudness plus an autocorrelation tempo estimate.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Sample rate for analysis extraction.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

/// RMS window length in samples.
const RMS_FRAME: usize = 2048;

/// Hop between RMS windows in samples.
const RMS_HOP: usize = 512;

/// Tempo search range in BPM.
const TEMPO_MIN_BPM: f64 = 60.0;
const TEMPO_MAX_BPM: f64 = 200.0;

/// Decoded mono audio.
#[derive(Debug, Clone)]
pub struct AudioSamples {
    /// PCM samples in [-1, 1]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioSamples {
    /// Duration of the decoded stream in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Extract mono audio samples from a media file.
///
/// The scratch file holding the raw stream is removed on every exit path.
/// `max_duration` limits extraction to the leading span of the file.
pub async fn extract_samples(
    input: impl AsRef<Path>,
    max_duration: Option<f64>,
) -> MediaResult<AudioSamples> {
    let input = input.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let scratch = NamedTempFile::new()?;

    let mut cmd = FfmpegCommand::new(input, scratch.path())
        .no_video()
        .audio_channels(1)
        .audio_rate(ANALYSIS_SAMPLE_RATE)
        .format("f32le");
    if let Some(limit) = max_duration {
        cmd = cmd.duration(limit);
    }

    FfmpegRunner::new().run(&cmd).await?;

    let bytes = tokio::fs::read(scratch.path()).await?;
    if bytes.is_empty() {
        return Err(MediaError::NoAudioData);
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    debug!(
        samples = samples.len(),
        input = %input.display(),
        "Extracted audio for analysis"
    );

    Ok(AudioSamples {
        samples,
        sample_rate: ANALYSIS_SAMPLE_RATE,
    })
}

/// Mean and standard deviation of windowed RMS loudness.
pub fn loudness_stats(samples: &[f32]) -> (f64, f64) {
    let frames = rms_frames(samples, RMS_FRAME, RMS_HOP);
    mean_stddev(&frames)
}

/// Estimate tempo in BPM via autocorrelation of the onset envelope.
///
/// Returns `None` when the signal is too short or too flat to carry a
/// usable beat; tempo is advisory and absence means "unknown".
pub fn estimate_tempo(audio: &AudioSamples) -> Option<f64> {
    let envelope = rms_frames(&audio.samples, RMS_HOP, RMS_HOP);
    let frames_per_second = audio.sample_rate as f64 / RMS_HOP as f64;
    tempo_from_envelope(&envelope, frames_per_second)
}

/// Tempo estimate over an energy envelope sampled at `frames_per_second`.
fn tempo_from_envelope(envelope: &[f64], frames_per_second: f64) -> Option<f64> {
    if envelope.len() < 2 {
        return None;
    }

    // Half-wave rectified energy flux
    let flux: Vec<f64> = envelope
        .windows(2)
        .map(|w| (w[1] - w[0]).max(0.0))
        .collect();

    let total: f64 = flux.iter().sum();
    if total <= f64::EPSILON {
        return None;
    }

    // Search beat periods from fast to slow; autocorrelation peak wins
    let min_lag = ((frames_per_second * 60.0 / TEMPO_MAX_BPM).round() as usize).max(1);
    let max_lag = (frames_per_second * 60.0 / TEMPO_MIN_BPM).round() as usize;
    if flux.len() < 2 * max_lag {
        return None;
    }

    let mut best: Option<(f64, usize)> = None;
    for lag in min_lag..=max_lag {
        let score: f64 = flux[lag..]
            .iter()
            .zip(flux.iter())
            .map(|(a, b)| a * b)
            .sum();
        if best.map(|(s, _)| score > s).unwrap_or(true) {
            best = Some((score, lag));
        }
    }

    best.filter(|(score, _)| *score > 0.0)
        .map(|(_, lag)| frames_per_second * 60.0 / lag as f64)
}

/// RMS of consecutive windows.
fn rms_frames(samples: &[f32], frame: usize, hop: usize) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mut frames = Vec::with_capacity(samples.len() / hop + 1);
    let mut start = 0;
    while start < samples.len() {
        let end = (start + frame).min(samples.len());
        let window = &samples[start..end];
        let energy: f64 = window.iter().map(|s| (*s as f64) * (*s as f64)).sum();
        frames.push((energy / window.len() as f64).sqrt());
        start += hop;
    }
    frames
}

fn mean_stddev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}
