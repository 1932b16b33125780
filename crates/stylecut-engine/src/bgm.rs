//! Background-music indexing and tempo-based selection.

use std::path::{Path, PathBuf};

use stylecut_media as media;
use stylecut_models::BgmEntry;

use crate::error::{EngineError, EngineResult};
use crate::progress::ProgressSink;

/// File extensions considered background music.
pub const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "m4a", "aac", "flac"];

/// Name of the per-folder index cache.
pub const INDEX_FILE: &str = "bgm_index.json";

/// Tempo is estimated over at most this leading span of each track.
const INDEX_SAMPLE_SECS: f64 = 60.0;

/// Scan a folder and build its tempo index.
///
/// Files whose tempo estimation fails are skipped and logged; the index
/// is persisted as the folder's cache artifact, empty or not.
pub async fn index_folder(folder: &Path, sink: &dyn ProgressSink) -> EngineResult<Vec<BgmEntry>> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut dir = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        let is_audio = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_audio {
            files.push(path);
        }
    }
    files.sort();

    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match index_track(&file).await {
            Ok(entry) => {
                sink.log(&format!("Indexed BGM: {} tempo={:.1}", name, entry.tempo));
                entries.push(entry);
            }
            Err(e) => {
                sink.log(&format!("Failed to index {}: {}", name, e));
            }
        }
    }

    let json = serde_json::to_string_pretty(&entries)?;
    tokio::fs::write(folder.join(INDEX_FILE), json).await?;

    Ok(entries)
}

/// Load the folder's index cache, rebuilding it when absent or corrupt.
pub async fn load_or_build_index(
    folder: &Path,
    sink: &dyn ProgressSink,
) -> EngineResult<Vec<BgmEntry>> {
    let index_path = folder.join(INDEX_FILE);
    if !index_path.exists() {
        return index_folder(folder, sink).await;
    }

    let text = tokio::fs::read_to_string(&index_path).await?;
    match serde_json::from_str(&text) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            sink.log(&format!("Rebuilding unreadable BGM index: {}", e));
            index_folder(folder, sink).await
        }
    }
}

/// Pick the track whose tempo is nearest to `target`.
///
/// Linear scan for the minimum absolute tempo distance; an unknown
/// target yields the first entry, an empty index yields nothing.
pub fn select_nearest_tempo(index: &[BgmEntry], target: Option<f64>) -> Option<&BgmEntry> {
    let target = match target {
        Some(target) => target,
        None => return index.first(),
    };
    index
        .iter()
        .min_by(|a, b| (a.tempo - target).abs().total_cmp(&(b.tempo - target).abs()))
}

/// Analyze one track into an index entry.
async fn index_track(file: &Path) -> EngineResult<BgmEntry> {
    let samples = media::extract_samples(file, Some(INDEX_SAMPLE_SECS)).await?;
    let tempo = media::audio::estimate_tempo(&samples)
        .ok_or_else(|| EngineError::TempoUnknown(file.to_path_buf()))?;

    // The analysis window may be shorter than the track; prefer the
    // probed full duration
    let duration = match media::get_duration(file).await {
        Ok(duration) if duration > 0.0 => duration,
        _ => samples.duration(),
    };

    Ok(BgmEntry {
        file: file.to_path_buf(),
        tempo,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;

    fn entry(tempo: f64) -> BgmEntry {
        BgmEntry {
            file: PathBuf::from(format!("bgm/{tempo}.mp3")),
            tempo,
            duration: 120.0,
        }
    }

    #[test]
    fn test_nearest_tempo_selection() {
        let index = vec![entry(90.0), entry(120.0), entry(140.0)];
        let best = select_nearest_tempo(&index, Some(125.0)).unwrap();
        assert!((best.tempo - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_target_takes_first_entry() {
        let index = vec![entry(90.0), entry(120.0)];
        let best = select_nearest_tempo(&index, None).unwrap();
        assert!((best.tempo - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_index_selects_nothing() {
        assert!(select_nearest_tempo(&[], Some(120.0)).is_none());
        assert!(select_nearest_tempo(&[], None).is_none());
    }

    #[tokio::test]
    async fn test_index_skips_non_audio_files() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"not audio")
            .await
            .unwrap();

        let entries = index_folder(dir.path(), &NullSink).await.unwrap();
        assert!(entries.is_empty());
        assert!(dir.path().join(INDEX_FILE).exists());
    }

    #[tokio::test]
    async fn test_load_or_build_reads_existing_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let index = vec![entry(100.0)];
        let json = serde_json::to_string_pretty(&index).unwrap();
        tokio::fs::write(dir.path().join(INDEX_FILE), json)
            .await
            .unwrap();

        let loaded = load_or_build_index(dir.path(), &NullSink).await.unwrap();
        assert_eq!(loaded, index);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_rebuilt() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio::fs::write(dir.path().join(INDEX_FILE), b"{not json")
            .await
            .unwrap();

        let loaded = load_or_build_index(dir.path(), &NullSink).await.unwrap();
        assert!(loaded.is_empty());
    }
}
