//! Word-boundary timing: which word is being spoken right now.

use crate::signals::SpeechSignals;
use serde::{Deserialize, Deserializer, Serialize};

/// Word boundary offsets and durations are in 100 ns ticks.
pub const TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Start and length of one synthesized word, in 100 ns ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordBoundary {
    #[serde(deserialize_with = "ticks")]
    pub offset: u64,
    #[serde(deserialize_with = "ticks")]
    pub duration: u64,
}

/// Tick counts arrive as integers or as floats (`2.5e6`); both round to the
/// nearest tick. Negative values are rejected.
fn ticks<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "tick count must be a non-negative number, got {value}"
        )));
    }
    Ok(value.round() as u64)
}

impl WordBoundary {
    #[must_use]
    pub fn new(offset: u64, duration: u64) -> Self {
        Self { offset, duration }
    }

    /// Build from seconds (rounded to the nearest tick).
    #[must_use]
    pub fn from_secs(start: f64, duration: f64) -> Self {
        Self {
            offset: (start.max(0.0) * TICKS_PER_SECOND).round() as u64,
            duration: (duration.max(0.0) * TICKS_PER_SECOND).round() as u64,
        }
    }

    #[must_use]
    pub fn start_secs(&self) -> f64 {
        self.offset as f64 / TICKS_PER_SECOND
    }

    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.duration as f64 / TICKS_PER_SECOND
    }

    #[must_use]
    pub fn end_secs(&self) -> f64 {
        self.start_secs() + self.duration_secs()
    }
}

/// Timing is usable only with more than one boundary and at least one
/// strictly increasing adjacent offset pair. Engines without real timing
/// tend to report every word at offset zero.
#[must_use]
pub fn has_valid_timing(boundaries: &[WordBoundary]) -> bool {
    boundaries.len() > 1 && boundaries.windows(2).any(|w| w[1].offset > w[0].offset)
}

/// The word whose window contains the playback position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveWord {
    /// Index into the boundary (and phoneme) sequence.
    pub index: usize,
    /// Word start in seconds.
    pub start: f64,
    /// Word length in seconds.
    pub duration: f64,
}

impl ActiveWord {
    /// Fraction of the word elapsed at `now`, in `[0, 1]`.
    ///
    /// Zero-length words report 1.0 once reached and 0.0 before.
    #[must_use]
    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return if now >= self.start { 1.0 } else { 0.0 };
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0)
    }
}

/// Find the first word whose inclusive `[start, end]` window contains `now`.
///
/// Returns `None` when timing is invalid or no window matches.
#[must_use]
pub fn resolve_active_word(now: f64, boundaries: &[WordBoundary]) -> Option<ActiveWord> {
    if !has_valid_timing(boundaries) {
        return None;
    }
    boundaries.iter().enumerate().find_map(|(index, wb)| {
        let start = wb.start_secs();
        let end = wb.end_secs();
        (now >= start && now <= end).then(|| ActiveWord {
            index,
            start,
            duration: wb.duration_secs(),
        })
    })
}

/// Elapsed playback time in seconds.
///
/// Prefers the native audio element clock; otherwise measures from the
/// word-boundary start on the audio context clock; otherwise zero.
#[must_use]
pub fn playback_time<S: SpeechSignals + ?Sized>(signals: &S) -> f64 {
    if let Some(element) = signals.audio_element()
        && element.is_active()
    {
        return element.current_time;
    }
    match (signals.audio_context_time(), signals.word_boundary_start_time()) {
        (Some(now), Some(start)) => (now - start).max(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::signals::{AudioElementState, SignalSnapshot};

    fn words() -> Vec<WordBoundary> {
        vec![
            WordBoundary::from_secs(0.0, 0.4),
            WordBoundary::from_secs(0.5, 0.3),
            WordBoundary::from_secs(1.0, 0.5),
        ]
    }

    #[test]
    fn tick_conversion() {
        let wb = WordBoundary::new(5_000_000, 2_500_000);
        assert!((wb.start_secs() - 0.5).abs() < 1e-12);
        assert!((wb.end_secs() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn boundary_ticks_parse_from_floats() {
        let wb: WordBoundary =
            serde_json::from_str(r#"{"offset": 1.5e6, "duration": 42}"#).unwrap();
        assert_eq!(wb, WordBoundary::new(1_500_000, 42));
        assert!(serde_json::from_str::<WordBoundary>(r#"{"offset": -1}"#).is_err());
    }

    #[test]
    fn validity_requires_two_increasing_offsets() {
        assert!(!has_valid_timing(&[]));
        assert!(!has_valid_timing(&[WordBoundary::new(0, 10)]));
        assert!(!has_valid_timing(&[
            WordBoundary::new(0, 10),
            WordBoundary::new(0, 10)
        ]));
        assert!(has_valid_timing(&[
            WordBoundary::new(100, 10),
            WordBoundary::new(0, 10),
            WordBoundary::new(50, 10),
        ]));
        assert!(has_valid_timing(&words()));
    }

    #[test]
    fn resolves_word_inclusive_of_both_ends() {
        let w = words();
        assert_eq!(resolve_active_word(0.0, &w).map(|a| a.index), Some(0));
        assert_eq!(resolve_active_word(0.4, &w).map(|a| a.index), Some(0));
        assert_eq!(resolve_active_word(0.5, &w).map(|a| a.index), Some(1));
        assert_eq!(resolve_active_word(1.5, &w).map(|a| a.index), Some(2));
    }

    #[test]
    fn gaps_resolve_to_none() {
        let w = words();
        assert!(resolve_active_word(0.45, &w).is_none());
        assert!(resolve_active_word(2.0, &w).is_none());
    }

    #[test]
    fn overlapping_windows_favor_earliest() {
        let w = vec![
            WordBoundary::from_secs(0.0, 1.0),
            WordBoundary::from_secs(0.5, 1.0),
        ];
        assert_eq!(resolve_active_word(0.75, &w).map(|a| a.index), Some(0));
    }

    #[test]
    fn invalid_timing_never_resolves() {
        let w = vec![WordBoundary::new(0, 10_000_000), WordBoundary::new(0, 10_000_000)];
        assert!(resolve_active_word(0.5, &w).is_none());
    }

    #[test]
    fn progress_is_clamped_and_guarded() {
        let word = ActiveWord {
            index: 0,
            start: 1.0,
            duration: 0.5,
        };
        assert_eq!(word.progress(1.25), 0.5);
        assert_eq!(word.progress(0.0), 0.0);
        assert_eq!(word.progress(3.0), 1.0);

        let instant = ActiveWord {
            duration: 0.0,
            ..word
        };
        assert_eq!(instant.progress(1.0), 1.0);
        assert_eq!(instant.progress(0.5), 0.0);
        assert!(!instant.progress(1.0).is_nan());
    }

    #[test]
    fn playback_time_prefers_active_element() {
        let snapshot = SignalSnapshot {
            audio_element: Some(AudioElementState {
                paused: false,
                ended: false,
                current_time: 1.25,
            }),
            audio_context_time: Some(10.0),
            word_boundary_start_time: Some(9.0),
            ..SignalSnapshot::default()
        };
        assert_eq!(playback_time(&snapshot), 1.25);
    }

    #[test]
    fn playback_time_falls_back_to_audio_context() {
        let mut snapshot = SignalSnapshot {
            audio_element: Some(AudioElementState {
                paused: true,
                ended: false,
                current_time: 1.25,
            }),
            audio_context_time: Some(10.0),
            word_boundary_start_time: Some(9.5),
            ..SignalSnapshot::default()
        };
        assert_eq!(playback_time(&snapshot), 0.5);

        snapshot.word_boundary_start_time = Some(11.0);
        assert_eq!(playback_time(&snapshot), 0.0);

        snapshot.word_boundary_start_time = None;
        assert_eq!(playback_time(&snapshot), 0.0);
    }
}
