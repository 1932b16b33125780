//! Aggregated style descriptors.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::profile::VideoProfile;

/// Target cut length used when no analyzed profile contributes a usable
/// average. Synthesis always needs a concrete target length.
pub const DEFAULT_CUT_LENGTH: f64 = 3.0;

/// Aggregate editing-style statistics over a set of analyzed videos.
///
/// Immutable once produced; persisted as the unit of reuse ("a style").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StyleDescriptor {
    /// Number of source videos that contributed
    pub source_count: usize,

    /// Mean over the profiles' average cut lengths, in seconds.
    /// Falls back to [`DEFAULT_CUT_LENGTH`] when no profile contributes.
    pub mean_average_cut_length: f64,

    /// Median over the profiles' average cut lengths, in seconds.
    /// Falls back to [`DEFAULT_CUT_LENGTH`] when no profile contributes.
    pub median_average_cut_length: f64,

    /// Median tempo across profiles with a known tempo, in BPM
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo_median: Option<f64>,

    /// The raw per-video profiles, retained for traceability
    pub profiles: Vec<VideoProfile>,

    /// When this style was produced
    pub created_at: DateTime<Utc>,
}

impl StyleDescriptor {
    /// The cut length synthesis should target for this style.
    pub fn target_cut_length(&self) -> f64 {
        self.mean_average_cut_length
    }
}

/// The style slot of an EDL: either the originating descriptor or a
/// minimal placeholder when rendering without an analyzed style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StyleSummary {
    /// A full style descriptor
    Style(StyleDescriptor),
    /// No style was supplied; defaults drove synthesis
    Placeholder {
        /// Marker note (always "auto")
        note: String,
    },
}

impl StyleSummary {
    /// Placeholder summary for style-less renders.
    pub fn auto() -> Self {
        Self::Placeholder {
            note: "auto".to_string(),
        }
    }

    /// Median tempo carried by this summary, when known.
    pub fn tempo_median(&self) -> Option<f64> {
        match self {
            Self::Style(style) => style.tempo_median,
            Self::Placeholder { .. } => None,
        }
    }
}

impl From<StyleDescriptor> for StyleSummary {
    fn from(style: StyleDescriptor) -> Self {
        Self::Style(style)
    }
}
