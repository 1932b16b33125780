//! Event-level render operations: trim, concat, crossfade chain, BGM mix.

use std::path::Path;

use tracing::debug;

use stylecut_models::{EncodingConfig, RenderedPart};

use crate::command::{run_ffmpeg_args, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Crossfade length used when neither side of a pair specifies one.
pub const DEFAULT_CROSSFADE_SECS: f64 = 0.4;

/// Lower bound for the crossfade offset into the running composite.
const MIN_CROSSFADE_OFFSET: f64 = 0.001;

/// Linear gain applied to the music bed when mixing (-12 dB equivalent).
pub const BGM_GAIN: f64 = 0.25;

/// Produce a re-encoded sub-clip covering `[in_start, in_end)`.
pub async fn trim_clip(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    in_start: f64,
    in_end: f64,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    debug!(
        "Trimming {} [{:.3}, {:.3}) -> {}",
        input.display(),
        in_start,
        in_end,
        output.display()
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(in_start)
        .duration(in_end - in_start)
        .output_args(encoding.to_ffmpeg_args());

    FfmpegRunner::new().run(&cmd).await
}

/// Losslessly concatenate parts in order via the concat demuxer.
///
/// The list file is written into `work_dir`, which outlives the call.
pub async fn concat_parts(
    parts: &[RenderedPart],
    output: impl AsRef<Path>,
    work_dir: impl AsRef<Path>,
) -> MediaResult<()> {
    let output = output.as_ref();
    let list_path = work_dir.as_ref().join("concat.txt");

    let mut list = String::new();
    for part in parts {
        let absolute = std::fs::canonicalize(&part.path).unwrap_or_else(|_| part.path.clone());
        list.push_str(&format!("file '{}'\n", absolute.display()));
    }
    tokio::fs::write(&list_path, list).await?;

    debug!("Concatenating {} parts -> {}", parts.len(), output.display());

    let cmd = FfmpegCommand::new(&list_path, output)
        .input_args(["-f", "concat", "-safe", "0"])
        .codec_copy();

    FfmpegRunner::new().run(&cmd).await
}

/// Transition duration for the pair folding part `index` into the chain.
///
/// The incoming part's request wins, then the previous part's, then the
/// default. Zero counts as unspecified.
fn pair_transition_duration(parts: &[RenderedPart], index: usize) -> f64 {
    if parts[index].transition_duration > 0.0 {
        parts[index].transition_duration
    } else if parts[index - 1].transition_duration > 0.0 {
        parts[index - 1].transition_duration
    } else {
        DEFAULT_CROSSFADE_SECS
    }
}

/// Offset of a crossfade into the running composite.
fn crossfade_offset(prev_duration: f64, fade: f64) -> f64 {
    (prev_duration - fade).max(MIN_CROSSFADE_OFFSET)
}

/// Build the sequential crossfade filter graph for `parts`.
///
/// Returns the `filter_complex` string plus the final video and audio
/// labels to map, or `None` when there are fewer than two parts. Video
/// uses `xfade` and audio `acrossfade` with the same pair durations; the
/// offset for each pair is the duration of the part most recently folded
/// in minus that pair's transition duration.
pub fn build_crossfade_filter(parts: &[RenderedPart]) -> Option<(String, String, String)> {
    if parts.len() < 2 {
        return None;
    }

    let mut filters = Vec::new();
    let mut vchain = "[0:v]".to_string();
    let mut achain = "[0:a]".to_string();

    for (stage, index) in (1..parts.len()).enumerate() {
        let fade = pair_transition_duration(parts, index);
        let offset = crossfade_offset(parts[index - 1].duration, fade);

        let out_v = format!("[v{}]", stage + 1);
        let out_a = format!("[a{}]", stage + 1);

        filters.push(format!(
            "{}[{}:v]xfade=transition=fade:duration={:.3}:offset={:.3}{}",
            vchain, index, fade, offset, out_v
        ));
        filters.push(format!(
            "{}[{}:a]acrossfade=d={:.3}{}",
            achain, index, fade, out_a
        ));

        vchain = out_v;
        achain = out_a;
    }

    Some((filters.join(";"), vchain, achain))
}

/// Assemble parts with the sequential crossfade chain.
pub async fn crossfade_parts(
    parts: &[RenderedPart],
    output: impl AsRef<Path>,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    let output = output.as_ref();

    let (filter_complex, video_label, audio_label) = build_crossfade_filter(parts)
        .ok_or_else(|| MediaError::invalid_media("crossfade chain needs at least two parts"))?;

    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-v".to_string(),
        "error".to_string(),
    ];
    for part in parts {
        args.push("-i".to_string());
        args.push(part.path.to_string_lossy().to_string());
    }
    args.push("-filter_complex".to_string());
    args.push(filter_complex);
    args.push("-map".to_string());
    args.push(video_label);
    args.push("-map".to_string());
    args.push(audio_label);
    args.extend(encoding.to_ffmpeg_args());
    args.push(output.to_string_lossy().to_string());

    debug!(
        "Crossfading {} parts -> {}",
        parts.len(),
        output.display()
    );

    run_ffmpeg_args(&args).await
}

/// Mix a music bed under the program audio.
///
/// The bed is attenuated to [`BGM_GAIN`], the mix is truncated to the
/// program's duration, and the join is crossfaded to avoid a hard
/// dropout. The video stream is copied untouched.
pub async fn mix_audio_track(
    video: impl AsRef<Path>,
    music: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let video = video.as_ref();
    let music = music.as_ref();
    let output = output.as_ref();

    let filter = format!(
        "[1:a]volume={}[a1];[0:a][a1]amix=inputs=2:duration=first:dropout_transition=2[aout]",
        BGM_GAIN
    );

    let args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-i".to_string(),
        video.to_string_lossy().to_string(),
        "-i".to_string(),
        music.to_string_lossy().to_string(),
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        "[aout]".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        output.to_string_lossy().to_string(),
    ];

    debug!(
        "Mixing music bed {} under {} -> {}",
        music.display(),
        video.display(),
        output.display()
    );

    run_ffmpeg_args(&args).await
}
