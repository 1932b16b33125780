//! Render pipeline: trim parts, assemble, mix background music.
//!
//! Assembly is an explicit two-state decision made up front: a crossfade
//! chain when any part requests a dissolve, lossless concatenation
//! otherwise. A failed crossfade chain is retried as concatenation
//! rather than aborting; producing some usable output outranks
//! transition fidelity. Trim failures are fatal: no partial output is
//! usable without all parts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use stylecut_media::{self as media, MediaResult};
use stylecut_models::{Edl, EncodingConfig, Event, RenderedPart, TransitionKind};

use crate::bgm;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::progress::ProgressSink;
use crate::timeline;

/// Name of the rendered output file inside a render directory.
const RENDERED_FILE: &str = "final.mp4";

/// How the assembly step produced its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    /// The requested strategy succeeded
    Rendered(PathBuf),
    /// The crossfade chain failed and concatenation produced the output
    FallbackUsed(PathBuf),
}

impl Assembly {
    /// Path of the assembled file.
    pub fn path(&self) -> &Path {
        match self {
            Self::Rendered(path) | Self::FallbackUsed(path) => path,
        }
    }

    /// True when the concat fallback produced the output.
    pub fn used_fallback(&self) -> bool {
        matches!(self, Self::FallbackUsed(_))
    }
}

/// Assembly strategy collaborator.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Assemble parts with the sequential crossfade chain.
    async fn crossfade(&self, parts: &[RenderedPart], output: &Path) -> MediaResult<()>;

    /// Losslessly concatenate parts in order.
    async fn concat(
        &self,
        parts: &[RenderedPart],
        output: &Path,
        work_dir: &Path,
    ) -> MediaResult<()>;
}

/// Compositor backed by the media layer.
pub struct FfmpegCompositor {
    pub encoding: EncodingConfig,
}

#[async_trait]
impl Compositor for FfmpegCompositor {
    async fn crossfade(&self, parts: &[RenderedPart], output: &Path) -> MediaResult<()> {
        media::crossfade_parts(parts, output, &self.encoding).await
    }

    async fn concat(
        &self,
        parts: &[RenderedPart],
        output: &Path,
        work_dir: &Path,
    ) -> MediaResult<()> {
        media::concat_parts(parts, output, work_dir).await
    }
}

/// Produce one re-encoded sub-clip per event.
///
/// Any single trim failure aborts the render.
pub async fn trim_parts(
    events: &[Event],
    parts_dir: &Path,
    encoding: &EncodingConfig,
    sink: &dyn ProgressSink,
) -> EngineResult<Vec<RenderedPart>> {
    tokio::fs::create_dir_all(parts_dir).await?;

    let mut parts = Vec::with_capacity(events.len());
    for (index, event) in events.iter().enumerate() {
        let path = parts_dir.join(format!("part_{index:04}.mp4"));
        sink.log(&format!("Trimming part {}/{}", index + 1, events.len()));

        media::trim_clip(
            &event.source_file,
            &path,
            event.in_point_start,
            event.in_point_end,
            encoding,
        )
        .await
        .map_err(|source| EngineError::TrimFailed { index, source })?;

        parts.push(RenderedPart {
            path,
            duration: event.duration,
            transition: event.transition,
            transition_duration: event.transition_duration,
        });
    }
    Ok(parts)
}

/// Assemble trimmed parts into one file.
///
/// The strategy is decided up front from the parts: a crossfade chain
/// when any part requests a dissolve (and there is more than one part),
/// concatenation otherwise. Crossfade failure falls back to
/// concatenation; concatenation failure is fatal.
pub async fn assemble(
    compositor: &dyn Compositor,
    parts: &[RenderedPart],
    output: &Path,
    work_dir: &Path,
    sink: &dyn ProgressSink,
) -> EngineResult<Assembly> {
    if parts.is_empty() {
        return Err(EngineError::no_usable_input("no parts to assemble"));
    }

    let has_transitions = parts.len() > 1
        && parts
            .iter()
            .any(|p| p.transition == TransitionKind::Dissolve);

    if has_transitions {
        sink.log("Assembling with crossfade chain");
        match compositor.crossfade(parts, output).await {
            Ok(()) => return Ok(Assembly::Rendered(output.to_path_buf())),
            Err(e) => {
                sink.log(&format!(
                    "Crossfade assembly failed: {}. Falling back to concatenation.",
                    e
                ));
                compositor.concat(parts, output, work_dir).await?;
                return Ok(Assembly::FallbackUsed(output.to_path_buf()));
            }
        }
    }

    sink.log("Assembling with concatenation");
    compositor.concat(parts, output, work_dir).await?;
    Ok(Assembly::Rendered(output.to_path_buf()))
}

/// Mix a tempo-matched background track under the rendered file.
///
/// Strictly best-effort: every failure keeps the pre-mix audio and is
/// only narrated through the sink.
pub async fn mix_background(
    rendered: &Path,
    bgm_dir: &Path,
    target_tempo: Option<f64>,
    sink: &dyn ProgressSink,
) {
    if !bgm_dir.is_dir() {
        return;
    }

    let index = match bgm::load_or_build_index(bgm_dir, sink).await {
        Ok(index) => index,
        Err(e) => {
            sink.log(&format!("BGM index unavailable: {}", e));
            return;
        }
    };

    let Some(track) = bgm::select_nearest_tempo(&index, target_tempo) else {
        sink.log("No background music available");
        return;
    };

    let mixed = rendered.with_extension("bgm.mp4");
    match media::mix_audio_track(rendered, &track.file, &mixed).await {
        Ok(()) => match tokio::fs::rename(&mixed, rendered).await {
            Ok(()) => {
                sink.log(&format!("Mixed background track: {}", track.file.display()));
            }
            Err(e) => {
                sink.log(&format!("BGM mix failed; keeping original audio ({})", e));
                let _ = tokio::fs::remove_file(&mixed).await;
            }
        },
        Err(e) => {
            sink.log(&format!("BGM mix failed; keeping original audio ({})", e));
            let _ = tokio::fs::remove_file(&mixed).await;
        }
    }
}

/// Outcome of one render invocation.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Final rendered media file
    pub video: PathBuf,
    /// The EDL document written for this render
    pub edl_path: PathBuf,
    /// Whether the concat fallback produced the output
    pub used_fallback: bool,
}

/// Render an EDL end-to-end into `out_dir`.
///
/// Writes the EDL document, trims every event into a render-scoped parts
/// directory, assembles, then mixes background music best-effort. Parts
/// are deleted once assembly succeeds and left on disk for inspection
/// when it fails.
pub async fn render(
    edl: &Edl,
    out_dir: &Path,
    config: &EngineConfig,
    sink: &dyn ProgressSink,
) -> EngineResult<RenderOutcome> {
    edl.validate()?;
    if edl.events.is_empty() {
        return Err(EngineError::no_usable_input("EDL has no events"));
    }

    tokio::fs::create_dir_all(out_dir).await?;

    let edl_path = out_dir.join("edl.json");
    timeline::write_edl(edl, &edl_path).await?;
    sink.log(&format!("EDL written: {}", edl_path.display()));

    let parts_dir = out_dir.join("parts");
    let parts = trim_parts(&edl.events, &parts_dir, &config.encoding, sink).await?;

    let rendered = out_dir.join(RENDERED_FILE);
    let compositor = FfmpegCompositor {
        encoding: config.encoding.clone(),
    };
    let assembly = assemble(&compositor, &parts, &rendered, &parts_dir, sink).await?;

    if let Err(e) = tokio::fs::remove_dir_all(&parts_dir).await {
        warn!("Failed to remove parts directory {}: {}", parts_dir.display(), e);
    }

    mix_background(&rendered, &config.bgm_dir, edl.style.tempo_median(), sink).await;

    Ok(RenderOutcome {
        video: rendered,
        edl_path,
        used_fallback: assembly.used_fallback(),
    })
}
