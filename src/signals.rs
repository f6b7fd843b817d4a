//! Read-only signals supplied by the TTS/audio side every tick.

use crate::error::{LipSyncError, Result};
use crate::timing::WordBoundary;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Playback state of a native audio element, when one is in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioElementState {
    pub paused: bool,
    pub ended: bool,
    /// Playback position in seconds.
    #[serde(alias = "currentTime")]
    pub current_time: f64,
}

impl AudioElementState {
    /// Playing means neither paused nor ended.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.paused && !self.ended
    }
}

/// Normalized spectral energy for the current audio frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBands {
    pub low: f32,
    #[serde(alias = "midLow")]
    pub mid_low: f32,
    #[serde(alias = "midHigh")]
    pub mid_high: f32,
    pub high: f32,
}

impl FrequencyBands {
    #[must_use]
    pub fn new(low: f32, mid_low: f32, mid_high: f32, high: f32) -> Self {
        Self {
            low,
            mid_low,
            mid_high,
            high,
        }
    }

    #[must_use]
    pub fn total(&self) -> f32 {
        self.low + self.mid_low + self.mid_high + self.high
    }
}

/// Signal contract of the speech playback collaborator.
///
/// Every accessor is cheap and side-effect free; the driver may call them
/// in any order, at most once per tick.
pub trait SpeechSignals {
    /// Explicit "speech is playing" flag (streamed audio without an element).
    fn is_playing(&self) -> bool;

    /// Native audio element, when playback goes through one.
    fn audio_element(&self) -> Option<AudioElementState> {
        None
    }

    /// Audio clock in seconds, used when no audio element is active.
    fn audio_context_time(&self) -> Option<f64> {
        None
    }

    /// Audio clock value (seconds) at which the first word boundary starts.
    fn word_boundary_start_time(&self) -> Option<f64> {
        None
    }

    /// Current output amplitude, roughly in `[0, 1]`.
    fn amplitude(&self) -> f32;

    /// Four-band energy split, if the audio path exposes one.
    fn frequency_bands(&self) -> Option<FrequencyBands> {
        None
    }

    /// Word timing for the utterance being played.
    fn word_boundaries(&self) -> &[WordBoundary] {
        &[]
    }

    /// One phoneme string per word index.
    fn phonemes(&self) -> Option<&[String]> {
        None
    }

    /// Whether any playback path reports active speech.
    fn is_playback_active(&self) -> bool {
        self.audio_element().is_some_and(|a| a.is_active()) || self.is_playing()
    }
}

/// Owned snapshot of every signal, for tests, replays and simple hosts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSnapshot {
    #[serde(alias = "isPlaying")]
    pub is_playing: bool,
    #[serde(alias = "audioElement")]
    pub audio_element: Option<AudioElementState>,
    #[serde(alias = "audioContextTime")]
    pub audio_context_time: Option<f64>,
    #[serde(alias = "wordBoundaryStartTime")]
    pub word_boundary_start_time: Option<f64>,
    pub amplitude: f32,
    #[serde(alias = "frequencyBands")]
    pub frequency_bands: Option<FrequencyBands>,
    #[serde(alias = "wordBoundaries")]
    pub word_boundaries: Vec<WordBoundary>,
    #[serde(alias = "currentPhonemes")]
    pub phonemes: Option<Vec<String>>,
}

impl SignalSnapshot {
    /// Load a snapshot (typically word boundaries and phonemes) from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            LipSyncError::Signal(format!("cannot parse signals {}: {e}", path.display()))
        })
    }
}

impl SpeechSignals for SignalSnapshot {
    fn is_playing(&self) -> bool {
        self.is_playing
    }

    fn audio_element(&self) -> Option<AudioElementState> {
        self.audio_element
    }

    fn audio_context_time(&self) -> Option<f64> {
        self.audio_context_time
    }

    fn word_boundary_start_time(&self) -> Option<f64> {
        self.word_boundary_start_time
    }

    fn amplitude(&self) -> f32 {
        self.amplitude
    }

    fn frequency_bands(&self) -> Option<FrequencyBands> {
        self.frequency_bands
    }

    fn word_boundaries(&self) -> &[WordBoundary] {
        &self.word_boundaries
    }

    fn phonemes(&self) -> Option<&[String]> {
        self.phonemes.as_deref()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn element_activity() {
        let playing = AudioElementState {
            paused: false,
            ended: false,
            current_time: 0.5,
        };
        assert!(playing.is_active());
        assert!(!AudioElementState { paused: true, ..playing }.is_active());
        assert!(!AudioElementState { ended: true, ..playing }.is_active());
    }

    #[test]
    fn playback_active_from_flag_or_element() {
        let mut snapshot = SignalSnapshot::default();
        assert!(!snapshot.is_playback_active());

        snapshot.is_playing = true;
        assert!(snapshot.is_playback_active());

        snapshot.is_playing = false;
        snapshot.audio_element = Some(AudioElementState::default());
        assert!(snapshot.is_playback_active());

        snapshot.audio_element = Some(AudioElementState {
            paused: true,
            ..AudioElementState::default()
        });
        assert!(!snapshot.is_playback_active());
    }

    #[test]
    fn band_total() {
        let bands = FrequencyBands::new(0.1, 0.2, 0.3, 0.4);
        assert!((bands.total() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn snapshot_parses_partial_json() {
        let json = r#"{
            "word_boundaries": [{"offset": 0, "duration": 5000000}],
            "phonemes": ["həlˈoʊ"]
        }"#;
        let snapshot: SignalSnapshot = serde_json::from_str(json).unwrap();
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.word_boundaries.len(), 1);
        assert_eq!(snapshot.phonemes().map(<[String]>::len), Some(1));
        assert!(snapshot.frequency_bands().is_none());
    }

    #[test]
    fn snapshot_accepts_producer_field_names() {
        let json = r#"{
            "isPlaying": true,
            "audioElement": {"paused": false, "ended": false, "currentTime": 0.25},
            "wordBoundaryStartTime": 1.0,
            "frequencyBands": {"low": 0.4, "midLow": 0.3, "midHigh": 0.2, "high": 0.1},
            "wordBoundaries": [
                {"offset": 0, "duration": 2500000},
                {"offset": 2.5e6, "duration": 3000000.0}
            ],
            "currentPhonemes": ["hɛ", "loʊ"]
        }"#;
        let snapshot: SignalSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.word_boundary_start_time, Some(1.0));
        assert_eq!(
            snapshot.audio_element.map(|e| e.current_time),
            Some(0.25)
        );
        assert_eq!(
            snapshot.frequency_bands,
            Some(FrequencyBands::new(0.4, 0.3, 0.2, 0.1))
        );
        assert_eq!(
            snapshot.word_boundaries,
            vec![
                WordBoundary::new(0, 2_500_000),
                WordBoundary::new(2_500_000, 3_000_000)
            ]
        );
        assert_eq!(snapshot.phonemes().map(<[String]>::len), Some(2));
    }

    #[test]
    fn from_json_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SignalSnapshot::from_json_file(&path),
            Err(LipSyncError::Signal(_))
        ));
    }
}
