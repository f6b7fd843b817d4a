//! Per-avatar lip-sync driver.
//!
//! Call [`LipSync::tick`] once per rendered frame with the current speech
//! signals and the avatar's expression sink. Each tick either snaps the
//! mouth shut (no playback, or amplitude at the noise floor) or runs the
//! estimator ladder, smooths the targets, and writes all five channels.

use crate::config::{GateConfig, LipSyncConfig, SmoothingConfig};
use crate::estimator::{EstimatorInput, EstimatorLadder, EstimatorMode};
use crate::signals::SpeechSignals;
use crate::smoothing::ChannelState;
use crate::timing::playback_time;
use crate::viseme::{Channel, ChannelWeights};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Receiver of expression weights (the avatar rig).
pub trait ExpressionSink {
    fn set_value(&mut self, channel: Channel, weight: f32);
}

impl ExpressionSink for ChannelWeights {
    fn set_value(&mut self, channel: Channel, weight: f32) {
        self.set(channel, weight);
    }
}

/// Whether the mouth is currently following speech.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Silent,
    Articulating,
}

/// Why a tick closed the mouth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceReason {
    /// Neither the audio element nor the playing flag report playback.
    PlaybackInactive,
    /// Amplitude at or below the gate threshold.
    BelowThreshold,
}

/// Weights written on one articulating tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisemeFrame {
    /// Playback position the frame was computed for, in seconds.
    pub time: f64,
    pub mode: EstimatorMode,
    pub weights: ChannelWeights,
}

/// Result of [`LipSync::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No sink; nothing written, state untouched.
    NoAvatar,
    /// All channels written as zero and state reset.
    Silenced(SilenceReason),
    /// All channels written with smoothed weights.
    Articulated(VisemeFrame),
}

impl TickOutcome {
    /// Weights the sink holds after this tick, if one was written.
    #[must_use]
    pub fn weights(&self) -> Option<ChannelWeights> {
        match self {
            TickOutcome::NoAvatar => None,
            TickOutcome::Silenced(_) => Some(ChannelWeights::ZERO),
            TickOutcome::Articulated(frame) => Some(frame.weights),
        }
    }
}

/// Lip-sync state for one avatar.
#[derive(Debug)]
pub struct LipSync {
    gate_config: GateConfig,
    smoothing: SmoothingConfig,
    ladder: EstimatorLadder,
    state: ChannelState,
    gate: GateState,
}

impl LipSync {
    /// Driver with the standard phoneme → bands → amplitude ladder.
    #[must_use]
    pub fn new(config: &LipSyncConfig) -> Self {
        Self::with_ladder(config, EstimatorLadder::new(config.symbols.cache_capacity))
    }

    /// Driver with a custom estimator ladder.
    #[must_use]
    pub fn with_ladder(config: &LipSyncConfig, ladder: EstimatorLadder) -> Self {
        Self {
            gate_config: config.gate.clone(),
            smoothing: config.smoothing.clone(),
            ladder,
            state: ChannelState::new(),
            gate: GateState::Silent,
        }
    }

    /// Advance one frame.
    pub fn tick<K, S>(&mut self, sink: Option<&mut K>, signals: &S) -> TickOutcome
    where
        K: ExpressionSink + ?Sized,
        S: SpeechSignals + ?Sized,
    {
        let Some(sink) = sink else {
            return TickOutcome::NoAvatar;
        };

        if !signals.is_playback_active() {
            return self.silence(sink, SilenceReason::PlaybackInactive);
        }

        let amplitude = signals.amplitude();
        if amplitude.is_nan() || amplitude <= self.gate_config.amplitude_threshold {
            return self.silence(sink, SilenceReason::BelowThreshold);
        }

        if self.gate == GateState::Silent {
            debug!(amplitude, "lip-sync articulating");
            self.gate = GateState::Articulating;
        }

        let now = playback_time(signals);
        let input = EstimatorInput {
            now,
            amplitude,
            bands: signals.frequency_bands(),
            boundaries: signals.word_boundaries(),
            phonemes: signals.phonemes(),
        };
        let estimate = self.ladder.run(&input);
        let smoothing = self.smoothing.factor_for(estimate.mode);
        let weights = self.state.apply(estimate.targets, smoothing);
        write_all(sink, weights);

        trace!(time = now, mode = %estimate.mode, aa = weights.aa, "lip-sync tick");
        TickOutcome::Articulated(VisemeFrame {
            time: now,
            mode: estimate.mode,
            weights,
        })
    }

    /// Close the mouth immediately and forget smoothing history.
    ///
    /// Internal state is cleared even without a sink; the sink, when
    /// present, receives zero on every channel.
    pub fn reset<K>(&mut self, sink: Option<&mut K>)
    where
        K: ExpressionSink + ?Sized,
    {
        self.state.reset();
        self.gate = GateState::Silent;
        if let Some(sink) = sink {
            write_all(sink, ChannelWeights::ZERO);
        }
    }

    /// Weights emitted on the last articulating tick (zero after silence).
    #[must_use]
    pub fn state(&self) -> ChannelWeights {
        self.state.weights()
    }

    #[must_use]
    pub fn gate_state(&self) -> GateState {
        self.gate
    }

    fn silence<K>(&mut self, sink: &mut K, reason: SilenceReason) -> TickOutcome
    where
        K: ExpressionSink + ?Sized,
    {
        if self.gate == GateState::Articulating {
            debug!(?reason, "lip-sync silent");
        }
        self.reset(Some(sink));
        TickOutcome::Silenced(reason)
    }
}

impl Default for LipSync {
    fn default() -> Self {
        Self::new(&LipSyncConfig::default())
    }
}

fn write_all<K: ExpressionSink + ?Sized>(sink: &mut K, weights: ChannelWeights) {
    for (channel, weight) in weights.iter() {
        sink.set_value(channel, weight);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::signals::SignalSnapshot;

    /// Records every write, in order.
    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<(Channel, f32)>,
    }

    impl ExpressionSink for RecordingSink {
        fn set_value(&mut self, channel: Channel, weight: f32) {
            self.writes.push((channel, weight));
        }
    }

    fn speaking(amplitude: f32) -> SignalSnapshot {
        SignalSnapshot {
            is_playing: true,
            amplitude,
            ..SignalSnapshot::default()
        }
    }

    #[test]
    fn no_sink_is_a_no_op() {
        let mut lipsync = LipSync::default();
        let outcome = lipsync.tick::<RecordingSink, _>(None, &speaking(0.5));
        assert_eq!(outcome, TickOutcome::NoAvatar);
        assert_eq!(lipsync.state(), ChannelWeights::ZERO);
        assert_eq!(lipsync.gate_state(), GateState::Silent);
    }

    #[test]
    fn every_channel_written_each_tick() {
        let mut lipsync = LipSync::default();
        let mut sink = RecordingSink::default();
        lipsync.tick(Some(&mut sink), &speaking(0.5));
        let channels: Vec<Channel> = sink.writes.iter().map(|(c, _)| *c).collect();
        assert_eq!(channels, Channel::ALL);
    }

    #[test]
    fn gate_tracks_transitions() {
        let mut lipsync = LipSync::default();
        let mut sink = ChannelWeights::ZERO;
        lipsync.tick(Some(&mut sink), &speaking(0.5));
        assert_eq!(lipsync.gate_state(), GateState::Articulating);
        assert!(sink.aa > 0.0);

        let outcome = lipsync.tick(Some(&mut sink), &speaking(0.02));
        assert_eq!(outcome, TickOutcome::Silenced(SilenceReason::BelowThreshold));
        assert_eq!(lipsync.gate_state(), GateState::Silent);
        assert_eq!(sink, ChannelWeights::ZERO);
        assert_eq!(lipsync.state(), ChannelWeights::ZERO);
    }

    #[test]
    fn nan_amplitude_is_silent() {
        let mut lipsync = LipSync::default();
        let mut sink = ChannelWeights::ZERO;
        let outcome = lipsync.tick(Some(&mut sink), &speaking(f32::NAN));
        assert_eq!(outcome, TickOutcome::Silenced(SilenceReason::BelowThreshold));
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let mut config = LipSyncConfig::default();
        config.gate.amplitude_threshold = 0.2;
        let mut lipsync = LipSync::new(&config);
        let mut sink = ChannelWeights::ZERO;
        assert!(matches!(
            lipsync.tick(Some(&mut sink), &speaking(0.1)),
            TickOutcome::Silenced(SilenceReason::BelowThreshold)
        ));
        assert!(matches!(
            lipsync.tick(Some(&mut sink), &speaking(0.3)),
            TickOutcome::Articulated(_)
        ));
    }

    #[test]
    fn reset_without_sink_still_clears_state() {
        let mut lipsync = LipSync::default();
        let mut sink = ChannelWeights::ZERO;
        lipsync.tick(Some(&mut sink), &speaking(0.8));
        assert!(!lipsync.state().is_zero());
        lipsync.reset::<ChannelWeights>(None);
        assert!(lipsync.state().is_zero());
        assert_eq!(lipsync.gate_state(), GateState::Silent);
    }

    #[test]
    fn outcome_weights() {
        assert_eq!(TickOutcome::NoAvatar.weights(), None);
        assert_eq!(
            TickOutcome::Silenced(SilenceReason::PlaybackInactive).weights(),
            Some(ChannelWeights::ZERO)
        );
    }
}
