//! Timeline synthesis: clips + target cut length -> EDL.

use std::path::{Path, PathBuf};

use stylecut_media as media;
use stylecut_models::{Edl, Event, StyleDescriptor, StyleSummary, TransitionKind, DEFAULT_CUT_LENGTH};

use crate::error::{EngineError, EngineResult};
use crate::progress::ProgressSink;

/// Remainders below this are dropped rather than emitted as events, in
/// seconds. Never emits a zero-length segment.
const REMAINDER_EPSILON: f64 = 0.01;

/// Partition measured clips into consecutive target-length segments.
///
/// Greedy single pass, in the given clip order: every segment takes
/// `target_len` seconds except possibly the final one per clip, which
/// takes the remainder. A clip shorter than the target yields exactly one
/// event covering the whole clip. Output timing is the running total of
/// prior durations; all events are hard cuts.
///
/// Cut points deliberately ignore the target clips' own shot boundaries;
/// the analyzed shot data describes the source style only.
pub fn synthesize_events(clips: &[(PathBuf, f64)], target_len: f64) -> Vec<Event> {
    let target_len = if target_len > 0.0 {
        target_len
    } else {
        DEFAULT_CUT_LENGTH
    };

    let mut events = Vec::new();
    let mut out_time = 0.0;
    for (path, clip_duration) in clips {
        let mut t = 0.0;
        while t < clip_duration - REMAINDER_EPSILON {
            let end = (t + target_len).min(*clip_duration);
            events.push(Event {
                source_file: path.clone(),
                in_point_start: t,
                in_point_end: end,
                output_start: out_time,
                duration: end - t,
                transition: TransitionKind::Cut,
                transition_duration: 0.0,
            });
            out_time += end - t;
            t = end;
        }
    }
    events
}

/// Synthesize an EDL for `clips` driven by `style`.
///
/// Probes each clip's duration, partitions it at the style's target cut
/// length (or the default when no style is given), and wraps the result
/// with the style summary. Probe failures are fatal; an input set that
/// yields no events is fatal too.
pub async fn synthesize(
    clips: &[PathBuf],
    style: Option<&StyleDescriptor>,
    sink: &dyn ProgressSink,
) -> EngineResult<Edl> {
    if clips.is_empty() {
        return Err(EngineError::no_usable_input("no clips supplied"));
    }

    let target_len = style
        .map(StyleDescriptor::target_cut_length)
        .unwrap_or(DEFAULT_CUT_LENGTH);

    let mut measured = Vec::with_capacity(clips.len());
    for clip in clips {
        let duration = media::get_duration(clip).await?;
        measured.push((clip.clone(), duration));
    }

    let events = synthesize_events(&measured, target_len);
    if events.is_empty() {
        return Err(EngineError::no_usable_input(
            "clips contained no usable duration",
        ));
    }

    sink.log(&format!(
        "Synthesized {} events at {:.2}s target cut length",
        events.len(),
        target_len
    ));

    let style = style
        .cloned()
        .map(StyleSummary::from)
        .unwrap_or_else(StyleSummary::auto);

    Ok(Edl { style, events })
}

/// Write an EDL document to `path`.
pub async fn write_edl(edl: &Edl, path: impl AsRef<Path>) -> EngineResult<()> {
    let json = serde_json::to_string_pretty(edl)?;
    tokio::fs::write(path.as_ref(), json).await?;
    Ok(())
}

/// Load an EDL document from `path`.
pub async fn load_edl(path: impl AsRef<Path>) -> EngineResult<Edl> {
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(name: &str, duration: f64) -> (PathBuf, f64) {
        (PathBuf::from(name), duration)
    }

    #[test]
    fn test_seven_and_a_half_seconds_at_three() {
        let events = synthesize_events(&[clip("a.mp4", 7.5)], 3.0);

        let durations: Vec<f64> = events.iter().map(|e| e.duration).collect();
        let starts: Vec<f64> = events.iter().map(|e| e.output_start).collect();
        assert_eq!(durations, vec![3.0, 3.0, 1.5]);
        assert_eq!(starts, vec![0.0, 3.0, 6.0]);
    }

    #[test]
    fn test_synthesis_conserves_duration() {
        for duration in [0.5, 2.9, 3.0, 7.5, 10.25, 31.0] {
            let events = synthesize_events(&[clip("a.mp4", duration)], 3.0);
            let total: f64 = events.iter().map(|e| e.duration).sum();
            assert!(
                (total - duration).abs() < REMAINDER_EPSILON,
                "duration {duration}: total {total}"
            );
            assert!(events.iter().all(|e| e.duration > 0.0));
        }
    }

    #[test]
    fn test_output_start_is_running_total() {
        let events = synthesize_events(&[clip("a.mp4", 7.5), clip("b.mp4", 4.0)], 3.0);
        let mut expected = 0.0;
        for event in &events {
            assert!((event.output_start - expected).abs() < 1e-9);
            expected += event.duration;
        }
        // Second clip continues the output timeline without gaps
        assert!((events.last().unwrap().output_start - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_short_clip_yields_single_whole_event() {
        let events = synthesize_events(&[clip("a.mp4", 1.2)], 3.0);
        assert_eq!(events.len(), 1);
        assert!((events[0].duration - 1.2).abs() < 1e-9);
        assert!((events[0].in_point_start).abs() < 1e-9);
        assert!((events[0].in_point_end - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_sub_epsilon_remainder_is_dropped() {
        let events = synthesize_events(&[clip("a.mp4", 3.005)], 3.0);
        assert_eq!(events.len(), 1);
        assert!((events[0].duration - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_events_default_to_cuts() {
        let events = synthesize_events(&[clip("a.mp4", 9.0)], 3.0);
        assert!(events.iter().all(|e| e.transition == TransitionKind::Cut));
        assert!(events.iter().all(|e| e.transition_duration == 0.0));
    }

    #[test]
    fn test_non_positive_target_uses_default() {
        let events = synthesize_events(&[clip("a.mp4", 6.0)], 0.0);
        assert_eq!(events.len(), 2);
        assert!((events[0].duration - DEFAULT_CUT_LENGTH).abs() < 1e-9);
    }

    #[test]
    fn test_synthesized_timeline_validates() {
        let events = synthesize_events(&[clip("a.mp4", 7.5), clip("b.mp4", 2.0)], 3.0);
        let edl = Edl {
            style: StyleSummary::auto(),
            events,
        };
        edl.validate().unwrap();
    }

    #[tokio::test]
    async fn test_edl_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("edl.json");
        let edl = Edl {
            style: StyleSummary::auto(),
            events: synthesize_events(&[clip("a.mp4", 7.5)], 3.0),
        };

        write_edl(&edl, &path).await.unwrap();
        let loaded = load_edl(&path).await.unwrap();
        assert_eq!(loaded, edl);
    }
}
