//! Dissolve classification heuristic.
//!
//! A boundary between two adjacent shots is sampled as a short run of
//! grayscale frames; the normalized mean-squared differences between
//! consecutive samples form the signal this module classifies. A dissolve
//! shows up as a smooth, low-variance ramp of small differences; a hard
//! cut as a single spike; two static frames as no change at all.
//!
//! The heuristic favors false negatives: a missed dissolve renders as a
//! hard cut, which is safe, while a spurious dissolve would desync timing.

/// Minimum usable frame samples per boundary; below this no verdict is
/// produced.
pub const MIN_USABLE_SAMPLES: usize = 4;

/// Tunable thresholds for dissolve classification.
#[derive(Debug, Clone, Copy)]
pub struct DissolveThresholds {
    /// Frames sampled on each side of the boundary
    pub window: usize,
    /// Minimum peak difference; rules out two static frames
    pub sensitivity: f64,
    /// Maximum mean difference for a gradual blend
    pub mean_max: f64,
    /// Maximum difference spread; a ramp, not a spike
    pub stddev_max: f64,
    /// Floor for the reported approximate dissolve duration, in seconds
    pub min_duration: f64,
}

impl Default for DissolveThresholds {
    fn default() -> Self {
        Self {
            window: 8,
            sensitivity: 0.03,
            mean_max: 0.05,
            stddev_max: 0.02,
            min_duration: 0.2,
        }
    }
}

impl DissolveThresholds {
    /// Timestamps to sample around one boundary: `2 * window` evenly
    /// spaced points spanning from `window` frames before the first
    /// shot's end to `window` frames after the second shot's start,
    /// clamped to the video.
    pub fn sample_times(
        &self,
        prev_end: f64,
        next_start: f64,
        fps: f64,
        media_duration: f64,
    ) -> Vec<f64> {
        let span = self.window as f64 / fps;
        let start = (prev_end - span).max(0.0);
        let end = (next_start + span).min(media_duration);
        let count = 2 * self.window;
        if count < 2 || end <= start {
            return Vec::new();
        }
        (0..count)
            .map(|i| start + (end - start) * i as f64 / (count - 1) as f64)
            .collect()
    }

    /// Classify one boundary from its consecutive-sample differences.
    ///
    /// Returns the approximate dissolve duration when the boundary reads
    /// as a dissolve, `None` otherwise.
    pub fn classify(&self, diffs: &[f64], fps: f64) -> Option<f64> {
        if diffs.len() < MIN_USABLE_SAMPLES - 1 {
            return None;
        }

        let (mean, stddev) = mean_stddev(diffs);
        let max = diffs.iter().copied().fold(0.0, f64::max);

        if mean < self.mean_max && stddev < self.stddev_max && max > self.sensitivity {
            Some((diffs.len() as f64 / fps).max(self.min_duration))
        } else {
            None
        }
    }
}

fn mean_stddev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_ramp_is_dissolve() {
        let thresholds = DissolveThresholds::default();
        // Gradual, low-variance differences with a detectable peak
        let diffs: Vec<f64> = (0..15).map(|i| 0.030 + 0.001 * i as f64).collect();
        let duration = thresholds.classify(&diffs, 25.0).unwrap();
        assert!((duration - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_hard_cut_spike_is_not_dissolve() {
        let thresholds = DissolveThresholds::default();
        let mut diffs = vec![0.0; 15];
        diffs[7] = 0.5;
        assert!(thresholds.classify(&diffs, 25.0).is_none());
    }

    #[test]
    fn test_static_frames_are_not_dissolve() {
        let thresholds = DissolveThresholds::default();
        let diffs = vec![0.0; 15];
        assert!(thresholds.classify(&diffs, 25.0).is_none());
    }

    #[test]
    fn test_too_few_samples_gives_no_verdict() {
        let thresholds = DissolveThresholds::default();
        assert!(thresholds.classify(&[0.04, 0.04], 25.0).is_none());
    }

    #[test]
    fn test_duration_floor() {
        let thresholds = DissolveThresholds::default();
        let diffs = vec![0.04, 0.04, 0.04];
        let duration = thresholds.classify(&diffs, 30.0).unwrap();
        assert!((duration - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_sample_times_span_boundary() {
        let thresholds = DissolveThresholds::default();
        let times = thresholds.sample_times(10.0, 10.0, 25.0, 60.0);
        assert_eq!(times.len(), 16);
        assert!((times[0] - 9.68).abs() < 1e-9);
        assert!((times[15] - 10.32).abs() < 1e-9);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_sample_times_clamped_to_media() {
        let thresholds = DissolveThresholds::default();
        let times = thresholds.sample_times(0.1, 0.1, 25.0, 0.3);
        assert!(!times.is_empty());
        assert!(times.iter().all(|t| *t >= 0.0 && *t <= 0.3));
    }
}
