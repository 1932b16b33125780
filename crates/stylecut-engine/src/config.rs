//! Engine configuration.
//!
//! Folder locations are resolved once at process start and read-only
//! thereafter; every component receives them explicitly instead of
//! reaching for process-wide state.

use std::path::{Path, PathBuf};

use stylecut_models::EncodingConfig;

use crate::error::EngineResult;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Project root all other folders default under
    pub root: PathBuf,
    /// Saved style packages
    pub styles_dir: PathBuf,
    /// Rendered outputs, one directory per render request
    pub output_dir: PathBuf,
    /// Background-music library
    pub bgm_dir: PathBuf,
    /// Shot detection threshold (0–100 content-difference scale)
    pub shot_threshold: f64,
    /// Encoding settings for trims and assembly
    pub encoding: EncodingConfig,
}

impl EngineConfig {
    /// Resolve the standard folder layout under `root`.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            styles_dir: root.join("styles"),
            output_dir: root.join("output"),
            bgm_dir: root.join("bgm"),
            shot_threshold: stylecut_media::DEFAULT_SHOT_THRESHOLD,
            encoding: EncodingConfig::default(),
            root,
        }
    }

    /// Resolve from environment variables, defaulting to the current
    /// directory as root.
    pub fn from_env() -> Self {
        let root = std::env::var("STYLECUT_ROOT").unwrap_or_else(|_| ".".to_string());
        let mut config = Self::for_root(root);

        if let Ok(dir) = std::env::var("STYLECUT_BGM_DIR") {
            config.bgm_dir = PathBuf::from(dir);
        }
        config.shot_threshold = std::env::var("STYLECUT_SHOT_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.shot_threshold);

        config
    }

    /// Create the folders the pipeline writes into.
    pub async fn ensure_dirs(&self) -> EngineResult<()> {
        for dir in [&self.styles_dir, &self.output_dir] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}
