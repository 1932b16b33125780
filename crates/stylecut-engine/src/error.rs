//! Engine error types.

use std::path::PathBuf;

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Fatal pipeline failures surfaced to the caller.
///
/// Degradable failures (shot detection, tempo, dissolve classification,
/// transcription) and recoverable ones (crossfade assembly, BGM mixing)
/// never appear here; they are reported through the progress sink and the
/// pipeline continues.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No usable input: {0}")]
    NoUsableInput(String),

    #[error("Style not found: {0}")]
    StyleNotFound(PathBuf),

    #[error("Trim failed for event {index}: {source}")]
    TrimFailed {
        index: usize,
        #[source]
        source: stylecut_media::MediaError,
    },

    #[error("Invalid EDL: {0}")]
    InvalidEdl(#[from] stylecut_models::EdlError),

    #[error("Tempo estimation failed: {0}")]
    TempoUnknown(PathBuf),

    #[error("Media error: {0}")]
    Media(#[from] stylecut_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn no_usable_input(msg: impl Into<String>) -> Self {
        Self::NoUsableInput(msg.into())
    }
}
