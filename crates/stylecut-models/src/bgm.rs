//! Background-music index entries.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One indexed background-music track.
///
/// The per-folder index is persisted as a JSON array of these entries and
/// rebuilt whenever the cache file is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BgmEntry {
    /// Path of the audio file
    pub file: PathBuf,
    /// Estimated tempo in BPM
    pub tempo: f64,
    /// Track duration in seconds
    pub duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let entries = vec![
            BgmEntry {
                file: PathBuf::from("bgm/a.mp3"),
                tempo: 120.0,
                duration: 183.5,
            },
            BgmEntry {
                file: PathBuf::from("bgm/b.wav"),
                tempo: 90.0,
                duration: 65.0,
            },
        ];
        let json = serde_json::to_string_pretty(&entries).unwrap();
        let back: Vec<BgmEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entries);
    }
}
