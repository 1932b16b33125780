//! Command-line driver for the stylecut pipeline.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stylecut_engine::{
    aggregate, bgm, load_style, render, save_style, synthesize, Analyzer, EngineConfig,
    FnSink, SceneShotDetector,
};

#[derive(Parser)]
#[command(name = "stylecut", version, about = "Learn an editing style, re-cut footage to match it")]
struct Cli {
    /// Project root holding styles/, output/ and bgm/
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze reference videos into a reusable style package
    Analyze {
        /// Name for the saved style package
        #[arg(long)]
        name: Option<String>,

        /// Reference videos to learn from
        #[arg(required = true)]
        videos: Vec<PathBuf>,
    },

    /// Re-cut clips to match a style and render the result
    Render {
        /// Style package directory or style.json to drive synthesis
        #[arg(long)]
        style: Option<PathBuf>,

        /// Output directory name under the project's output folder
        #[arg(long, default_value = "cut")]
        out: String,

        /// Clips to re-cut, in playback order
        #[arg(required = true)]
        clips: Vec<PathBuf>,
    },

    /// Build the tempo index for a background-music folder
    IndexBgm {
        /// Folder to index; defaults to the project's bgm folder
        folder: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.root {
        Some(root) => EngineConfig::for_root(root),
        None => EngineConfig::from_env(),
    };
    config.ensure_dirs().await?;

    // Progress goes to the terminal; tracing carries the rest
    let sink = FnSink(|message: &str| println!("{message}"));

    match cli.command {
        Commands::Analyze { name, videos } => {
            stylecut_media::check_ffmpeg().context("ffmpeg is required for analysis")?;
            stylecut_media::check_ffprobe().context("ffprobe is required for analysis")?;

            let detector = SceneShotDetector {
                threshold: config.shot_threshold,
            };
            let analyzer = Analyzer::new(&detector);
            let profiles = analyzer.analyze_sources(&videos, &sink).await;
            let style = aggregate(profiles);

            let package = save_style(&style, name.as_deref(), &config.styles_dir, &sink).await?;
            println!("Style package: {}", package.display());
        }

        Commands::Render { style, out, clips } => {
            stylecut_media::check_ffmpeg().context("ffmpeg is required for rendering")?;
            stylecut_media::check_ffprobe().context("ffprobe is required for rendering")?;

            let style = match style {
                Some(path) => Some(load_style(&path).await?),
                None => None,
            };

            let edl = synthesize(&clips, style.as_ref(), &sink).await?;
            let out_dir = config.output_dir.join(&out);
            let outcome = render(&edl, &out_dir, &config, &sink).await?;

            if outcome.used_fallback {
                println!(
                    "Rendered (concat fallback): {}",
                    outcome.video.display()
                );
            } else {
                println!("Rendered: {}", outcome.video.display());
            }
            println!("EDL: {}", outcome.edl_path.display());
        }

        Commands::IndexBgm { folder } => {
            stylecut_media::check_ffmpeg().context("ffmpeg is required for indexing")?;

            let folder = folder.unwrap_or_else(|| config.bgm_dir.clone());
            let entries = bgm::index_folder(&folder, &sink).await?;
            println!(
                "Indexed {} tracks in {}",
                entries.len(),
                folder.display()
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("stylecut=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("stylecut starting");
}
