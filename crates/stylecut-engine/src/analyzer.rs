//! Per-video signal extraction.
//!
//! One analyzer pass produces a [`VideoProfile`] per source video. Every
//! sub-step degrades independently: a failed shot detection, audio
//! analysis, dissolve pass, or transcription empties its field, reports
//! through the progress sink, and analysis continues. One bad video never
//! aborts a multi-video style request.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use stylecut_media::{self as media, MediaResult};
use stylecut_models::{AudioSummary, ShotRange, TransitionHint, VideoProfile};

use crate::dissolve::{DissolveThresholds, MIN_USABLE_SAMPLES};
use crate::error::EngineResult;
use crate::progress::ProgressSink;

/// Shot boundary detection collaborator.
#[async_trait]
pub trait ShotDetector: Send + Sync {
    /// Ordered, non-overlapping shot ranges for one video.
    async fn detect_shots(&self, video: &Path) -> MediaResult<Vec<ShotRange>>;
}

/// Content-change detector backed by the media layer.
#[derive(Debug, Clone, Copy)]
pub struct SceneShotDetector {
    /// Threshold on the 0–100 content-difference scale
    pub threshold: f64,
}

impl Default for SceneShotDetector {
    fn default() -> Self {
        Self {
            threshold: media::DEFAULT_SHOT_THRESHOLD,
        }
    }
}

#[async_trait]
impl ShotDetector for SceneShotDetector {
    async fn detect_shots(&self, video: &Path) -> MediaResult<Vec<ShotRange>> {
        media::detect_shots(video, self.threshold).await
    }
}

/// Speech-to-text collaborator: given a media path, returns a subtitle
/// track file path or fails. Out of scope for this crate; only the seam
/// is defined here.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media_path: &Path) -> EngineResult<PathBuf>;
}

/// Signal extractor over one or more source videos.
pub struct Analyzer<'a> {
    detector: &'a dyn ShotDetector,
    transcriber: Option<&'a dyn Transcriber>,
    thresholds: DissolveThresholds,
}

impl<'a> Analyzer<'a> {
    /// Create an analyzer around a shot detection collaborator.
    pub fn new(detector: &'a dyn ShotDetector) -> Self {
        Self {
            detector,
            transcriber: None,
            thresholds: DissolveThresholds::default(),
        }
    }

    /// Attach an optional transcription collaborator.
    pub fn with_transcriber(mut self, transcriber: &'a dyn Transcriber) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Override the dissolve classification thresholds.
    pub fn with_thresholds(mut self, thresholds: DissolveThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Analyze every source in order, one at a time.
    pub async fn analyze_sources(
        &self,
        videos: &[PathBuf],
        sink: &dyn ProgressSink,
    ) -> Vec<VideoProfile> {
        let mut profiles = Vec::with_capacity(videos.len());
        for video in videos {
            profiles.push(self.analyze_video(video, sink).await);
        }
        profiles
    }

    /// Analyze one video into a profile, degrading failed sub-steps.
    pub async fn analyze_video(&self, video: &Path, sink: &dyn ProgressSink) -> VideoProfile {
        sink.log(&format!("Analyzing: {}", video.display()));

        let shots = match self.detector.detect_shots(video).await {
            Ok(shots) => shots,
            Err(e) => {
                sink.log(&format!(
                    "Shot detection failed for {}: {}",
                    video.display(),
                    e
                ));
                Vec::new()
            }
        };

        let audio = match analyze_audio(video).await {
            Ok(audio) => audio,
            Err(e) => {
                sink.log(&format!(
                    "Audio analysis failed for {}: {}",
                    video.display(),
                    e
                ));
                AudioSummary::default()
            }
        };

        let transitions = if shots.len() > 1 {
            match self.detect_dissolves(video, &shots).await {
                Ok(hints) => hints,
                Err(e) => {
                    sink.log(&format!(
                        "Transition detection failed for {}: {}",
                        video.display(),
                        e
                    ));
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let subtitles = match self.transcriber {
            Some(transcriber) => match transcriber.transcribe(video).await {
                Ok(path) => Some(path),
                Err(e) => {
                    sink.log(&format!("Transcription failed for {}: {}", video.display(), e));
                    None
                }
            },
            None => None,
        };

        VideoProfile::new(video, shots, audio, transitions).with_subtitles(subtitles)
    }

    /// Sample each adjacent boundary and classify it.
    ///
    /// Hints only ever connect consecutive shots of this one video, and
    /// each boundary gets at most one verdict.
    async fn detect_dissolves(
        &self,
        video: &Path,
        shots: &[ShotRange],
    ) -> MediaResult<Vec<TransitionHint>> {
        let info = media::probe_media(video).await?;

        let mut hints = Vec::new();
        for index in 0..shots.len() - 1 {
            let times = self.thresholds.sample_times(
                shots[index].end,
                shots[index + 1].start,
                info.fps,
                info.duration,
            );

            let mut frames = Vec::with_capacity(times.len());
            for t in times {
                if let Some(frame) = media::sample_gray_frame(video, t).await? {
                    frames.push(frame);
                }
            }
            if frames.len() < MIN_USABLE_SAMPLES {
                continue;
            }

            let diffs: Vec<f64> = frames
                .windows(2)
                .map(|pair| media::normalized_mse(&pair[0], &pair[1]))
                .collect();

            if let Some(duration) = self.thresholds.classify(&diffs, info.fps) {
                hints.push(TransitionHint::dissolve(index, duration));
            }
        }
        Ok(hints)
    }
}

/// Extract and summarize a video's audio track.
///
/// The scratch stream is deleted on all exit paths; a tempo estimation
/// failure is surfaced as "unknown", not an error.
async fn analyze_audio(video: &Path) -> MediaResult<AudioSummary> {
    let samples = media::extract_samples(video, None).await?;
    let (loudness_mean, loudness_stddev) = media::audio::loudness_stats(&samples.samples);
    let tempo = media::audio::estimate_tempo(&samples);

    Ok(AudioSummary {
        sample_rate: samples.sample_rate,
        duration: samples.duration(),
        loudness_mean,
        loudness_stddev,
        tempo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;
    use stylecut_media::MediaError;

    struct FixedShots(Vec<ShotRange>);

    #[async_trait]
    impl ShotDetector for FixedShots {
        async fn detect_shots(&self, _video: &Path) -> MediaResult<Vec<ShotRange>> {
            Ok(self.0.clone())
        }
    }

    struct FailingShots;

    #[async_trait]
    impl ShotDetector for FailingShots {
        async fn detect_shots(&self, _video: &Path) -> MediaResult<Vec<ShotRange>> {
            Err(MediaError::invalid_media("boom"))
        }
    }

    struct FixedTranscript(PathBuf);

    #[async_trait]
    impl Transcriber for FixedTranscript {
        async fn transcribe(&self, _media_path: &Path) -> EngineResult<PathBuf> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_profile_from_detected_shots() {
        // The video path does not exist: audio and dissolve analysis
        // degrade, shot data still flows into the profile.
        let detector = FixedShots(vec![ShotRange::new(0.0, 2.0), ShotRange::new(2.0, 6.0)]);
        let analyzer = Analyzer::new(&detector);
        let profile = analyzer
            .analyze_video(Path::new("missing.mp4"), &NullSink)
            .await;

        assert_eq!(profile.shots.len(), 2);
        assert_eq!(profile.cut_lengths, vec![2.0, 4.0]);
        assert!((profile.average_cut_length.unwrap() - 3.0).abs() < 1e-9);
        assert_eq!(profile.audio, AudioSummary::default());
        assert!(profile.transitions.is_empty());
        assert!(profile.subtitles.is_none());
    }

    #[tokio::test]
    async fn test_failed_detection_degrades_to_no_shots() {
        let analyzer = Analyzer::new(&FailingShots);
        let profile = analyzer
            .analyze_video(Path::new("missing.mp4"), &NullSink)
            .await;

        assert!(profile.shots.is_empty());
        assert!(profile.cut_lengths.is_empty());
        assert!(profile.average_cut_length.is_none());
    }

    #[tokio::test]
    async fn test_transcriber_attaches_subtitles() {
        let detector = FixedShots(vec![]);
        let transcriber = FixedTranscript(PathBuf::from("out.srt"));
        let analyzer = Analyzer::new(&detector).with_transcriber(&transcriber);
        let profile = analyzer
            .analyze_video(Path::new("missing.mp4"), &NullSink)
            .await;

        assert_eq!(profile.subtitles, Some(PathBuf::from("out.srt")));
    }

    #[tokio::test]
    async fn test_analyze_sources_keeps_order() {
        let detector = FixedShots(vec![ShotRange::new(0.0, 1.0)]);
        let analyzer = Analyzer::new(&detector);
        let videos = vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")];
        let profiles = analyzer.analyze_sources(&videos, &NullSink).await;

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].path, PathBuf::from("a.mp4"));
        assert_eq!(profiles[1].path, PathBuf::from("b.mp4"));
    }
}
