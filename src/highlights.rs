//! Highlight selection and clip-window construction.
//!
//! Pure functions: timestamped transcript segments plus a keyword set in,
//! an ordered list of bounded clip windows out. All file and process I/O
//! lives elsewhere.

use serde::{Deserialize, Serialize};

use crate::lexicon::KeywordSet;
use crate::transcription::TranscriptSegment;

/// A bounded time range of the source video selected for the output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipWindow {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl ClipWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// A window collapses to zero length when its trigger sits at or past
    /// the end of the source.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Scan transcript segments for keyword matches and return trigger
/// timestamps, ascending.
///
/// A segment matches when any keyword phrase is a literal substring of
/// its lowercased text; a matching segment contributes one trigger at its
/// start time no matter how many phrases hit. The final sort is
/// defensive, in case the segmenter emitted non-monotonic segments.
/// An empty keyword set yields an empty result.
pub fn select_triggers(segments: &[TranscriptSegment], keywords: &KeywordSet) -> Vec<f64> {
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut triggers: Vec<f64> = segments
        .iter()
        .filter(|segment| keywords.matches(&segment.text.to_lowercase()))
        .map(|segment| segment.start)
        .collect();

    triggers.sort_by(f64::total_cmp);
    triggers
}

/// Expand each trigger into a clip window of `clip_duration` seconds,
/// clamped to `[0, source_duration]`.
///
/// Windows are NOT merged here: triggers closer together than the clip
/// duration produce overlapping windows and therefore duplicated footage
/// downstream. Callers opt into merging via [`merge_windows`]. A trigger
/// at or past the source end collapses to a zero-length window, which is
/// kept and left for the assembler to tolerate.
pub fn build_windows(triggers: &[f64], source_duration: f64, clip_duration: f64) -> Vec<ClipWindow> {
    triggers
        .iter()
        .map(|&t| {
            let start = t.clamp(0.0, source_duration);
            let end = (t + clip_duration).min(source_duration).max(start);
            ClipWindow::new(start, end)
        })
        .collect()
}

/// Merge overlapping or touching windows into single spans.
///
/// Input must be ordered ascending by start, which [`build_windows`]
/// guarantees for pre-sorted triggers.
pub fn merge_windows(windows: Vec<ClipWindow>) -> Vec<ClipWindow> {
    let mut merged: Vec<ClipWindow> = Vec::with_capacity(windows.len());

    for window in windows {
        match merged.last_mut() {
            Some(last) if window.start <= last.end => {
                last.end = last.end.max(window.end);
            }
            _ => merged.push(window),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    fn keywords(phrases: &[&str]) -> KeywordSet {
        KeywordSet::new(phrases.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_select_matching_segments() {
        let segments = vec![
            segment(0.0, 3.0, "great save"),
            segment(10.0, 13.0, "nothing here"),
            segment(20.0, 23.0, "what a goal"),
        ];

        let triggers = select_triggers(&segments, &keywords(&["save", "goal"]));
        assert_eq!(triggers, vec![0.0, 20.0]);
    }

    #[test]
    fn test_select_is_case_insensitive() {
        let segments = vec![segment(5.0, 8.0, "GOAL! An unbelievable GOAL!")];

        let triggers = select_triggers(&segments, &keywords(&["goal"]));
        assert_eq!(triggers, vec![5.0]);
    }

    #[test]
    fn test_select_one_trigger_per_segment() {
        // Two phrase hits in one segment still yield a single trigger
        let segments = vec![segment(7.0, 11.0, "a goal from the penalty kick")];

        let triggers = select_triggers(&segments, &keywords(&["goal", "penalty kick"]));
        assert_eq!(triggers, vec![7.0]);
    }

    #[test]
    fn test_select_empty_keywords_yields_nothing() {
        let segments = vec![segment(0.0, 3.0, "great save")];

        let triggers = select_triggers(&segments, &KeywordSet::default());
        assert!(triggers.is_empty());
    }

    #[test]
    fn test_select_sorts_non_monotonic_segments() {
        let segments = vec![
            segment(30.0, 33.0, "late goal"),
            segment(2.0, 5.0, "early goal"),
        ];

        let triggers = select_triggers(&segments, &keywords(&["goal"]));
        assert_eq!(triggers, vec![2.0, 30.0]);
    }

    #[test]
    fn test_select_is_idempotent() {
        let segments = vec![
            segment(0.0, 3.0, "great save"),
            segment(20.0, 23.0, "what a goal"),
        ];
        let kw = keywords(&["save", "goal"]);

        assert_eq!(select_triggers(&segments, &kw), select_triggers(&segments, &kw));
    }

    #[test]
    fn test_window_clamped_to_source_end() {
        let windows = build_windows(&[5.0], 8.0, 10.0);
        assert_eq!(windows, vec![ClipWindow::new(5.0, 8.0)]);
    }

    #[test]
    fn test_window_bounds_invariant() {
        let source_duration = 90.0;
        for &t in &[-2.0, 0.0, 12.5, 85.0, 90.0, 120.0] {
            let windows = build_windows(&[t], source_duration, 10.0);
            let w = windows[0];
            assert!(0.0 <= w.start, "start below zero for t={}", t);
            assert!(w.start <= w.end, "inverted window for t={}", t);
            assert!(w.end <= source_duration, "end past source for t={}", t);
        }
    }

    #[test]
    fn test_window_collapses_past_source_end() {
        let windows = build_windows(&[120.0], 90.0, 10.0);
        assert_eq!(windows, vec![ClipWindow::new(90.0, 90.0)]);
        assert!(windows[0].is_empty());
    }

    #[test]
    fn test_close_triggers_overlap_without_merging() {
        let windows = build_windows(&[10.0, 14.0], 60.0, 10.0);

        assert_eq!(windows.len(), 2);
        assert!(windows[0].end > windows[1].start); // duplicated footage, by default
    }

    #[test]
    fn test_empty_triggers_yield_no_windows() {
        assert!(build_windows(&[], 60.0, 10.0).is_empty());
    }

    #[test]
    fn test_merge_overlapping_windows() {
        let windows = build_windows(&[10.0, 14.0, 40.0], 60.0, 10.0);
        let merged = merge_windows(windows);

        assert_eq!(
            merged,
            vec![ClipWindow::new(10.0, 24.0), ClipWindow::new(40.0, 50.0)]
        );
    }

    #[test]
    fn test_merge_keeps_disjoint_windows() {
        let windows = vec![ClipWindow::new(0.0, 10.0), ClipWindow::new(30.0, 40.0)];
        assert_eq!(merge_windows(windows.clone()), windows);
    }
}
