//! Viseme target estimation.
//!
//! Signals arrive with uneven fidelity, so estimation is a ladder of
//! strategies tried in order. Each one either produces target weights or
//! declines, and the next rung gets a chance:
//!
//! 1. [`PhonemeEstimator`]: word timing plus per-word phonemes.
//! 2. [`FrequencyBandEstimator`]: four-band spectral energy split.
//! 3. [`AmplitudeEstimator`]: amplitude alone, always answers.

mod bands;
mod phoneme;

pub use bands::{AmplitudeEstimator, FrequencyBandEstimator};
pub use phoneme::PhonemeEstimator;

use crate::signals::FrequencyBands;
use crate::timing::WordBoundary;
use crate::viseme::ChannelWeights;
use serde::{Deserialize, Serialize};

/// Which rung of the ladder produced a tick's targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorMode {
    Phoneme,
    FrequencyBands,
    Amplitude,
}

impl EstimatorMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EstimatorMode::Phoneme => "phoneme",
            EstimatorMode::FrequencyBands => "frequency_bands",
            EstimatorMode::Amplitude => "amplitude",
        }
    }
}

impl std::fmt::Display for EstimatorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an estimator may look at for one tick.
#[derive(Debug, Clone, Copy)]
pub struct EstimatorInput<'a> {
    /// Playback position in seconds.
    pub now: f64,
    /// Raw output amplitude.
    pub amplitude: f32,
    pub bands: Option<FrequencyBands>,
    pub boundaries: &'a [WordBoundary],
    /// One phoneme string per word index.
    pub phonemes: Option<&'a [String]>,
}

impl<'a> EstimatorInput<'a> {
    /// Input carrying only an amplitude.
    #[must_use]
    pub fn from_amplitude(amplitude: f32) -> Self {
        Self {
            now: 0.0,
            amplitude,
            bands: None,
            boundaries: &[],
            phonemes: None,
        }
    }
}

/// Unclamped target weights and the strategy that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub targets: ChannelWeights,
    pub mode: EstimatorMode,
}

impl Estimate {
    #[must_use]
    pub fn used_phoneme_mode(&self) -> bool {
        self.mode == EstimatorMode::Phoneme
    }
}

/// One rung of the estimation ladder.
pub trait VisemeEstimator: Send {
    /// Mode reported when this estimator answers.
    fn mode(&self) -> EstimatorMode;

    /// Target weights, or `None` to defer to the next estimator.
    fn estimate(&mut self, input: &EstimatorInput<'_>) -> Option<ChannelWeights>;
}

/// Ordered list of estimators; the first to answer wins.
pub struct EstimatorLadder {
    rungs: Vec<Box<dyn VisemeEstimator>>,
}

impl EstimatorLadder {
    /// Phoneme, then frequency bands, then amplitude.
    #[must_use]
    pub fn new(symbol_cache_capacity: usize) -> Self {
        let rungs: Vec<Box<dyn VisemeEstimator>> = vec![
            Box::new(PhonemeEstimator::new(symbol_cache_capacity)),
            Box::new(FrequencyBandEstimator),
            Box::new(AmplitudeEstimator),
        ];
        Self::from_rungs(rungs)
    }

    /// Custom ladder. An empty ladder answers with silence.
    #[must_use]
    pub fn from_rungs(rungs: Vec<Box<dyn VisemeEstimator>>) -> Self {
        Self { rungs }
    }

    /// Run estimators in order until one answers.
    ///
    /// Falls back to closed-mouth amplitude mode if every rung declines.
    pub fn run(&mut self, input: &EstimatorInput<'_>) -> Estimate {
        for rung in &mut self.rungs {
            if let Some(targets) = rung.estimate(input) {
                return Estimate {
                    targets,
                    mode: rung.mode(),
                };
            }
        }
        Estimate {
            targets: ChannelWeights::ZERO,
            mode: EstimatorMode::Amplitude,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }
}

impl Default for EstimatorLadder {
    fn default() -> Self {
        Self::new(500)
    }
}

impl std::fmt::Debug for EstimatorLadder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let modes: Vec<EstimatorMode> = self.rungs.iter().map(|r| r.mode()).collect();
        f.debug_struct("EstimatorLadder")
            .field("rungs", &modes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Decline;

    impl VisemeEstimator for Decline {
        fn mode(&self) -> EstimatorMode {
            EstimatorMode::Phoneme
        }

        fn estimate(&mut self, _input: &EstimatorInput<'_>) -> Option<ChannelWeights> {
            None
        }
    }

    #[test]
    fn default_ladder_order() {
        let ladder = EstimatorLadder::default();
        assert_eq!(ladder.len(), 3);
        assert_eq!(
            format!("{ladder:?}"),
            "EstimatorLadder { rungs: [Phoneme, FrequencyBands, Amplitude] }"
        );
    }

    #[test]
    fn declined_rungs_fall_through() {
        let rungs: Vec<Box<dyn VisemeEstimator>> =
            vec![Box::new(Decline), Box::new(AmplitudeEstimator)];
        let mut ladder = EstimatorLadder::from_rungs(rungs);
        let estimate = ladder.run(&EstimatorInput::from_amplitude(0.5));
        assert_eq!(estimate.mode, EstimatorMode::Amplitude);
        assert!(!estimate.used_phoneme_mode());
        assert!((estimate.targets.aa - 0.4).abs() < 1e-6);
    }

    #[test]
    fn empty_ladder_is_silent() {
        let mut ladder = EstimatorLadder::from_rungs(Vec::new());
        assert!(ladder.is_empty());
        let estimate = ladder.run(&EstimatorInput::from_amplitude(0.9));
        assert!(estimate.targets.is_zero());
    }

    #[test]
    fn no_bands_uses_amplitude_only() {
        let mut ladder = EstimatorLadder::default();
        let estimate = ladder.run(&EstimatorInput::from_amplitude(0.5));
        assert_eq!(estimate.mode, EstimatorMode::Amplitude);
        assert!((estimate.targets.aa - 0.4).abs() < 1e-6);
        assert!((estimate.targets.ih - 0.075).abs() < 1e-6);
    }
}
