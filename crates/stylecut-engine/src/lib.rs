//! Style profiling and timeline assembly pipeline.
//!
//! This crate orchestrates the stylecut core:
//! - Per-video signal extraction into profiles (shots, audio, dissolves)
//! - Aggregation of profiles into a reusable style descriptor
//! - Timeline synthesis from raw clips driven by a target style
//! - Rendering via crossfade chaining with a concatenation fallback
//! - Best-effort background-music selection and mixing
//!
//! Everything runs as a sequential pipeline: one video analyzed at a
//! time, one event trimmed at a time, crossfades chained strictly left
//! to right.

pub mod analyzer;
pub mod bgm;
pub mod config;
pub mod dissolve;
pub mod error;
pub mod progress;
pub mod render;
pub mod style;
pub mod timeline;

pub use analyzer::{Analyzer, SceneShotDetector, ShotDetector, Transcriber};
pub use config::EngineConfig;
pub use dissolve::DissolveThresholds;
pub use error::{EngineError, EngineResult};
pub use progress::{FnSink, NullSink, ProgressSink, TracingSink};
pub use render::{assemble, render, Assembly, Compositor, FfmpegCompositor, RenderOutcome};
pub use style::{aggregate, load_style, save_style};
pub use timeline::{load_edl, synthesize, synthesize_events, write_edl};
