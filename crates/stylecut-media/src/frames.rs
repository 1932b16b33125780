//! Grayscale frame sampling for transition analysis.
//!
//! Dissolve classification only needs coarse luminance structure, so
//! frames are decoded downscaled and in 8-bit gray via FFmpeg rawvideo
//! output into a scratch file.

use std::path::Path;

use tempfile::NamedTempFile;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Width of sampled analysis frames.
pub const SAMPLE_WIDTH: usize = 160;
/// Height of sampled analysis frames.
pub const SAMPLE_HEIGHT: usize = 90;

/// A downscaled 8-bit grayscale frame.
#[derive(Debug, Clone)]
pub struct GrayFrame {
    /// Row-major luma values
    pub pixels: Vec<u8>,
}

/// Decode one grayscale frame at `at_secs`.
///
/// Returns `Ok(None)` when no frame exists at that timestamp (seek past
/// the end of the stream); callers skip missing samples.
pub async fn sample_gray_frame(
    video: impl AsRef<Path>,
    at_secs: f64,
) -> MediaResult<Option<GrayFrame>> {
    let video = video.as_ref();

    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }

    let scratch = NamedTempFile::new()?;

    let filter = format!("scale={}:{},format=gray", SAMPLE_WIDTH, SAMPLE_HEIGHT);
    let cmd = FfmpegCommand::new(video, scratch.path())
        .seek(at_secs.max(0.0))
        .single_frame()
        .video_filter(filter)
        .no_audio()
        .format("rawvideo");

    FfmpegRunner::new().run(&cmd).await?;

    let bytes = tokio::fs::read(scratch.path()).await?;
    if bytes.len() < SAMPLE_WIDTH * SAMPLE_HEIGHT {
        return Ok(None);
    }

    Ok(Some(GrayFrame {
        pixels: bytes[..SAMPLE_WIDTH * SAMPLE_HEIGHT].to_vec(),
    }))
}

/// Normalized mean-squared difference between two frames, in [0, 1].
pub fn normalized_mse(a: &GrayFrame, b: &GrayFrame) -> f64 {
    let pairs = a.pixels.iter().zip(b.pixels.iter());
    let count = a.pixels.len().min(b.pixels.len());
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = pairs
        .map(|(x, y)| {
            let diff = *x as f64 - *y as f64;
            diff * diff
        })
        .sum();
    sum / count as f64 / (255.0 * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(value: u8) -> GrayFrame {
        GrayFrame {
            pixels: vec![value; SAMPLE_WIDTH * SAMPLE_HEIGHT],
        }
    }

    #[test]
    fn test_mse_identical_frames() {
        let a = frame(128);
        assert!(normalized_mse(&a, &a).abs() < 1e-12);
    }

    #[test]
    fn test_mse_black_vs_white() {
        let black = frame(0);
        let white = frame(255);
        assert!((normalized_mse(&black, &white) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mse_small_shift_is_small() {
        let a = frame(100);
        let b = frame(110);
        let mse = normalized_mse(&a, &b);
        assert!(mse > 0.0 && mse < 0.01);
    }
}
