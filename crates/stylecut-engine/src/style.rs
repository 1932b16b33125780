//! Style aggregation and package persistence.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use stylecut_media as media;
use stylecut_models::{StyleDescriptor, VideoProfile, DEFAULT_CUT_LENGTH};

use crate::error::{EngineError, EngineResult};
use crate::progress::ProgressSink;

/// Preview frames extracted per profile into the package's assets folder.
const PREVIEW_FRAMES_PER_PROFILE: usize = 4;

/// Merge per-video profiles into one style descriptor.
///
/// Pure reduction over already-validated profiles: no errors are
/// possible. Profiles without a usable average cut length or tempo are
/// skipped; if nothing contributes, the cut-length targets fall back to
/// [`DEFAULT_CUT_LENGTH`] so synthesis always has a concrete target.
pub fn aggregate(profiles: Vec<VideoProfile>) -> StyleDescriptor {
    let avg_cuts: Vec<f64> = profiles
        .iter()
        .filter_map(|p| p.average_cut_length)
        .collect();
    let tempos: Vec<f64> = profiles.iter().filter_map(|p| p.audio.tempo).collect();

    StyleDescriptor {
        source_count: profiles.len(),
        mean_average_cut_length: mean(&avg_cuts).unwrap_or(DEFAULT_CUT_LENGTH),
        median_average_cut_length: median(&avg_cuts).unwrap_or(DEFAULT_CUT_LENGTH),
        tempo_median: median(&tempos),
        profiles,
        created_at: Utc::now(),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Persist a style as a loadable package directory.
///
/// The package holds `style.json` plus an `assets/` subfolder with
/// preview frames pulled from the longest shots of each profile. Name
/// collisions get a short unique suffix rather than overwriting an
/// existing package.
pub async fn save_style(
    style: &StyleDescriptor,
    name: Option<&str>,
    styles_dir: &Path,
    sink: &dyn ProgressSink,
) -> EngineResult<PathBuf> {
    tokio::fs::create_dir_all(styles_dir).await?;

    let id = match name {
        Some(name) => name.to_string(),
        None => format!("style_{}", &Uuid::new_v4().simple().to_string()[..8]),
    };
    let mut base = styles_dir.join(&id);
    if base.exists() {
        base = styles_dir.join(format!(
            "{}_{}",
            id,
            &Uuid::new_v4().simple().to_string()[..4]
        ));
    }
    tokio::fs::create_dir_all(&base).await?;

    let json = serde_json::to_string_pretty(style)?;
    tokio::fs::write(base.join("style.json"), json).await?;

    let assets = base.join("assets");
    tokio::fs::create_dir_all(&assets).await?;
    write_preview_frames(style, &assets, sink).await;

    sink.log(&format!("Style saved: {}", base.display()));
    Ok(base)
}

/// Load a style from a package directory or a descriptor file.
pub async fn load_style(path: impl AsRef<Path>) -> EngineResult<StyleDescriptor> {
    let path = path.as_ref();
    let file = if path.is_dir() {
        path.join("style.json")
    } else {
        path.to_path_buf()
    };

    if !file.exists() {
        return Err(EngineError::StyleNotFound(path.to_path_buf()));
    }

    let text = tokio::fs::read_to_string(&file).await?;
    Ok(serde_json::from_str(&text)?)
}

/// Best-effort preview frames from each profile's longest shots.
async fn write_preview_frames(style: &StyleDescriptor, assets: &Path, sink: &dyn ProgressSink) {
    for profile in &style.profiles {
        let mut shots = profile.shots.clone();
        shots.sort_by(|a, b| b.length().total_cmp(&a.length()));

        let stem = profile
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "source".to_string());

        for (i, shot) in shots.iter().take(PREVIEW_FRAMES_PER_PROFILE).enumerate() {
            let out = assets.join(format!("{}_thumb_{}.jpg", stem, i));
            if let Err(e) = media::generate_thumbnail(&profile.path, &out, shot.midpoint()).await {
                sink.log(&format!(
                    "Preview frame failed for {}: {}",
                    profile.path.display(),
                    e
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;
    use stylecut_models::{AudioSummary, ShotRange};

    fn profile_with_average(path: &str, shots: Vec<ShotRange>, tempo: Option<f64>) -> VideoProfile {
        let audio = AudioSummary {
            tempo,
            ..Default::default()
        };
        VideoProfile::new(path, shots, audio, vec![])
    }

    #[test]
    fn test_aggregate_single_profile_roundtrip() {
        // A single profile with average X yields mean = median = X.
        let profile = profile_with_average(
            "a.mp4",
            vec![ShotRange::new(0.0, 2.0), ShotRange::new(2.0, 6.0)],
            None,
        );
        let style = aggregate(vec![profile]);
        assert_eq!(style.source_count, 1);
        assert!((style.mean_average_cut_length - 3.0).abs() < 1e-9);
        assert!((style.median_average_cut_length - 3.0).abs() < 1e-9);
        assert!(style.tempo_median.is_none());
    }

    #[test]
    fn test_aggregate_defaults_when_nothing_contributes() {
        let profiles = vec![
            profile_with_average("a.mp4", vec![], None),
            profile_with_average("b.mp4", vec![], None),
        ];
        let style = aggregate(profiles);
        assert_eq!(style.source_count, 2);
        assert!((style.mean_average_cut_length - DEFAULT_CUT_LENGTH).abs() < 1e-9);
        assert!((style.median_average_cut_length - DEFAULT_CUT_LENGTH).abs() < 1e-9);
        assert!(style.tempo_median.is_none());
    }

    #[test]
    fn test_aggregate_mean_and_median() {
        let profiles = vec![
            profile_with_average("a.mp4", vec![ShotRange::new(0.0, 2.0)], Some(90.0)),
            profile_with_average("b.mp4", vec![ShotRange::new(0.0, 4.0)], Some(120.0)),
            profile_with_average("c.mp4", vec![ShotRange::new(0.0, 9.0)], Some(140.0)),
        ];
        let style = aggregate(profiles);
        assert!((style.mean_average_cut_length - 5.0).abs() < 1e-9);
        assert!((style.median_average_cut_length - 4.0).abs() < 1e-9);
        assert!((style.tempo_median.unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_median_interpolates_even_counts() {
        assert!((median(&[2.0, 4.0]).unwrap() - 3.0).abs() < 1e-9);
        assert!((median(&[1.0, 2.0, 3.0, 10.0]).unwrap() - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let style = aggregate(vec![profile_with_average("a.mp4", vec![], Some(100.0))]);

        let base = save_style(&style, Some("test-style"), dir.path(), &NullSink)
            .await
            .unwrap();
        assert!(base.join("style.json").exists());
        assert!(base.join("assets").is_dir());

        let loaded = load_style(&base).await.unwrap();
        assert_eq!(loaded, style);
    }

    #[tokio::test]
    async fn test_save_uniquifies_name_collisions() {
        let dir = tempfile::TempDir::new().unwrap();
        let style = aggregate(vec![]);

        let first = save_style(&style, Some("dup"), dir.path(), &NullSink)
            .await
            .unwrap();
        let second = save_style(&style, Some("dup"), dir.path(), &NullSink)
            .await
            .unwrap();
        assert_ne!(first, second);
        assert!(second.join("style.json").exists());
    }

    #[tokio::test]
    async fn test_load_missing_style() {
        let err = load_style("no/such/style").await.unwrap_err();
        assert!(matches!(err, EngineError::StyleNotFound(_)));
    }
}
