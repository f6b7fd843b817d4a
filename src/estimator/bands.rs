//! Spectral and amplitude-only fallbacks.
//!
//! Band-to-shape mapping follows vowel formants:
//!   low (0-860 Hz)         jaw open (aa/oh), fundamental + F1
//!   mid-low (860-2150 Hz)  mid shapes (ih), F1-F2 transition
//!   mid-high (2150-3440 Hz) spread/round (ee/ou), F2 region
//!   high (3440-6020 Hz)    fricatives (slight ih), sibilance

use super::{EstimatorInput, EstimatorMode, VisemeEstimator};
use crate::signals::FrequencyBands;
use crate::viseme::ChannelWeights;
use tracing::trace;

/// Total band energy at or below this counts as near silence.
const QUIET_TOTAL_ENERGY: f32 = 0.05;
const MIN_MOTION_SUM: f32 = 0.15;
const MIN_MOTION_FLOOR: f32 = 0.15;

/// Targets from the four-band energy split. Declines without band data or
/// when the split holds a non-finite value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyBandEstimator;

/// Formant-inspired targets for one frame.
#[must_use]
pub fn bands_to_visemes(bands: &FrequencyBands, amplitude: f32) -> ChannelWeights {
    let total = bands.total();
    if total <= QUIET_TOTAL_ENERGY {
        // Barely open.
        return ChannelWeights {
            aa: amplitude * 0.3,
            ..ChannelWeights::ZERO
        };
    }

    let n_low = bands.low / total;
    let n_mid_low = bands.mid_low / total;
    let n_mid_high = bands.mid_high / total;
    let n_high = bands.high / total;

    let mut targets = ChannelWeights {
        aa: (n_low * 1.4 * amplitude * 2.0).min(1.0),
        oh: ((n_low * 0.5 + n_mid_low * 0.5) * amplitude * 1.6).min(0.8),
        ih: ((n_mid_low * 0.8 + n_high * 0.4) * amplitude * 1.6).min(0.7),
        ee: (n_mid_high * 1.2 * amplitude * 1.8).min(0.7),
        ou: ((n_mid_high * 0.6 + n_low * 0.3) * amplitude * 1.4).min(0.6),
    };

    if targets.sum() < MIN_MOTION_SUM {
        targets.aa = (amplitude * 0.5).max(MIN_MOTION_FLOOR);
    }
    targets
}

impl VisemeEstimator for FrequencyBandEstimator {
    fn mode(&self) -> EstimatorMode {
        EstimatorMode::FrequencyBands
    }

    fn estimate(&mut self, input: &EstimatorInput<'_>) -> Option<ChannelWeights> {
        let bands = input.bands?;
        if !bands.total().is_finite() {
            trace!(?bands, "non-finite band energy, declining");
            return None;
        }
        Some(bands_to_visemes(&bands, input.amplitude))
    }
}

/// Amplitude-only targets; the last rung, always answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmplitudeEstimator;

impl VisemeEstimator for AmplitudeEstimator {
    fn mode(&self) -> EstimatorMode {
        EstimatorMode::Amplitude
    }

    fn estimate(&mut self, input: &EstimatorInput<'_>) -> Option<ChannelWeights> {
        Some(ChannelWeights {
            aa: input.amplitude * 0.8,
            ih: input.amplitude * 0.15,
            ..ChannelWeights::ZERO
        })
    }
}
