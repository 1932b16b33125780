//! End-to-end pipeline coverage over the collaborator seams.
//!
//! These tests drive analysis, aggregation, synthesis, and assembly with
//! fake collaborators so they run without FFmpeg and without real media:
//! missing tooling degrades analysis fields exactly like missing streams
//! would.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use stylecut_engine::{
    aggregate, assemble, synthesize_events, Analyzer, Assembly, Compositor, NullSink, ShotDetector,
};
use stylecut_media::{MediaError, MediaResult};
use stylecut_models::{
    Edl, RenderedPart, ShotRange, StyleSummary, TransitionKind, DEFAULT_CUT_LENGTH,
};

struct ScriptedDetector(Vec<ShotRange>);

#[async_trait]
impl ShotDetector for ScriptedDetector {
    async fn detect_shots(&self, _video: &Path) -> MediaResult<Vec<ShotRange>> {
        Ok(self.0.clone())
    }
}

struct BrokenDetector;

#[async_trait]
impl ShotDetector for BrokenDetector {
    async fn detect_shots(&self, _video: &Path) -> MediaResult<Vec<ShotRange>> {
        Err(MediaError::invalid_media("detector offline"))
    }
}

struct FlakyCompositor {
    concat_used: AtomicBool,
}

#[async_trait]
impl Compositor for FlakyCompositor {
    async fn crossfade(&self, _parts: &[RenderedPart], _output: &Path) -> MediaResult<()> {
        Err(MediaError::ffmpeg_failed("filter graph rejected", None, Some(1)))
    }

    async fn concat(
        &self,
        _parts: &[RenderedPart],
        output: &Path,
        _work_dir: &Path,
    ) -> MediaResult<()> {
        self.concat_used.store(true, Ordering::SeqCst);
        tokio::fs::write(output, b"assembled").await?;
        Ok(())
    }
}

#[tokio::test]
async fn analysis_to_style_to_timeline() {
    // Two sources: one with detected shots, one where detection fails.
    let detector = ScriptedDetector(vec![
        ShotRange::new(0.0, 2.0),
        ShotRange::new(2.0, 4.0),
        ShotRange::new(4.0, 6.0),
    ]);
    let analyzer = Analyzer::new(&detector);
    let good = analyzer
        .analyze_video(Path::new("reference.mp4"), &NullSink)
        .await;

    let broken = Analyzer::new(&BrokenDetector)
        .analyze_video(Path::new("broken.mp4"), &NullSink)
        .await;

    assert!((good.average_cut_length.unwrap() - 2.0).abs() < 1e-9);
    assert!(broken.average_cut_length.is_none());

    // The degraded profile contributes nothing; the style still lands on
    // the good profile's average.
    let style = aggregate(vec![good, broken]);
    assert_eq!(style.source_count, 2);
    assert!((style.mean_average_cut_length - 2.0).abs() < 1e-9);
    assert!((style.median_average_cut_length - 2.0).abs() < 1e-9);

    let events = synthesize_events(
        &[(PathBuf::from("clip.mp4"), 5.0)],
        style.target_cut_length(),
    );
    let total: f64 = events.iter().map(|e| e.duration).sum();
    assert!((total - 5.0).abs() < 1e-9);

    let edl = Edl {
        style: StyleSummary::from(style),
        events,
    };
    edl.validate().unwrap();
}

#[tokio::test]
async fn degraded_only_profiles_fall_back_to_default_target() {
    let broken = Analyzer::new(&BrokenDetector)
        .analyze_video(Path::new("broken.mp4"), &NullSink)
        .await;
    let style = aggregate(vec![broken]);

    assert!((style.mean_average_cut_length - DEFAULT_CUT_LENGTH).abs() < 1e-9);
    assert!((style.median_average_cut_length - DEFAULT_CUT_LENGTH).abs() < 1e-9);

    let events = synthesize_events(
        &[(PathBuf::from("clip.mp4"), 7.5)],
        style.target_cut_length(),
    );
    let durations: Vec<f64> = events.iter().map(|e| e.duration).collect();
    assert_eq!(durations, vec![3.0, 3.0, 1.5]);
}

#[tokio::test]
async fn failed_crossfade_still_produces_output() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = dir.path().join("final.mp4");
    let compositor = FlakyCompositor {
        concat_used: AtomicBool::new(false),
    };

    let parts = vec![
        RenderedPart {
            path: PathBuf::from("part_0000.mp4"),
            duration: 2.0,
            transition: TransitionKind::Cut,
            transition_duration: 0.0,
        },
        RenderedPart {
            path: PathBuf::from("part_0001.mp4"),
            duration: 3.0,
            transition: TransitionKind::Dissolve,
            transition_duration: 0.4,
        },
    ];

    let assembly = assemble(&compositor, &parts, &output, dir.path(), &NullSink)
        .await
        .unwrap();

    assert!(matches!(assembly, Assembly::FallbackUsed(_)));
    assert!(compositor.concat_used.load(Ordering::SeqCst));
    assert!(output.exists());
}
