//! Shared data models for the stylecut pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Shot ranges and transition hints
//! - Per-video analysis profiles
//! - Aggregated style descriptors
//! - Edit decision lists (EDLs) and render-time parts
//! - Encoding configuration
//! - Background-music index entries

pub mod bgm;
pub mod edl;
pub mod encoding;
pub mod profile;
pub mod shot;
pub mod style;

// Re-export common types
pub use bgm::BgmEntry;
pub use edl::{Edl, EdlError, Event, RenderedPart};
pub use encoding::EncodingConfig;
pub use profile::{AudioSummary, VideoProfile};
pub use shot::{ShotRange, TransitionHint, TransitionKind};
pub use style::{StyleDescriptor, StyleSummary, DEFAULT_CUT_LENGTH};
