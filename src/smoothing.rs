//! Exponential smoothing of viseme targets across ticks.

use crate::config::SmoothingConfig;
use crate::estimator::EstimatorMode;
use crate::viseme::ChannelWeights;

impl SmoothingConfig {
    /// Smoothing constant for targets produced in `mode`.
    ///
    /// Phoneme targets change fast and need tighter tracking; spectral and
    /// amplitude targets are noisier and get heavier damping.
    #[must_use]
    pub fn factor_for(&self, mode: EstimatorMode) -> f32 {
        match mode {
            EstimatorMode::Phoneme => self.phoneme,
            EstimatorMode::FrequencyBands | EstimatorMode::Amplitude => self.frequency,
        }
    }
}

/// Last emitted weight per channel, always in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelState {
    previous: ChannelWeights,
}

impl ChannelState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Weights emitted on the last tick.
    #[must_use]
    pub fn weights(&self) -> ChannelWeights {
        self.previous
    }

    /// Move every channel toward `targets`, store and return the result.
    ///
    /// `smoothed = previous + (target - previous) * (1 - smoothing)`, clamped
    /// to `[0, 1]`.
    pub fn apply(&mut self, targets: ChannelWeights, smoothing: f32) -> ChannelWeights {
        let previous = self.previous;
        let gain = 1.0 - smoothing;
        let smoothed = targets
            .map(|channel, target| {
                let prev = previous.get(channel);
                prev + (target - prev) * gain
            })
            .clamped();
        self.previous = smoothed;
        smoothed
    }

    /// Snap every channel to zero.
    pub fn reset(&mut self) {
        self.previous = ChannelWeights::ZERO;
    }
}
