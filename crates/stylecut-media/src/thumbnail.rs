//! Preview thumbnail generation.

use std::path::Path;

use stylecut_models::encoding::THUMBNAIL_SCALE_WIDTH;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Extract a scaled single-frame thumbnail at `at_secs`.
pub async fn generate_thumbnail(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    at_secs: f64,
) -> MediaResult<()> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();

    let filter = format!("scale={}:-2", THUMBNAIL_SCALE_WIDTH);

    let cmd = FfmpegCommand::new(video_path, output_path)
        .seek(at_secs.max(0.0))
        .single_frame()
        .video_filter(&filter);

    FfmpegRunner::new().run(&cmd).await
}
