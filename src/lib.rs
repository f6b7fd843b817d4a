//! Fae lip-sync: real-time viseme weights from a text-to-speech stream.
//!
//! Every rendered frame the avatar's mouth gets five blend-shape weights
//! (`aa`, `ih`, `ou`, `ee`, `oh`) derived from whatever the speech side can
//! offer:
//!
//! - **Phonemes**: word-boundary timing plus per-word IPA strings (Kokoro)
//! - **Frequency bands**: a four-band spectral split of the output audio
//! - **Amplitude**: output level alone
//!
//! # Architecture
//!
//! - [`viseme`]: channels, the phoneme table, and the cleaned-symbol cache
//! - [`timing`]: active word resolution from word boundaries
//! - [`estimator`]: the phoneme → bands → amplitude fallback ladder
//! - [`smoothing`]: per-channel exponential smoothing
//! - [`lipsync`]: the per-avatar driver with tick/reset entry points
//! - [`analysis`]: amplitude and band extraction from PCM via `rustfft`
//! - [`replay`]: offline replay of a recorded utterance through both

pub mod analysis;
pub mod config;
pub mod error;
pub mod estimator;
pub mod lipsync;
pub mod replay;
pub mod signals;
pub mod smoothing;
pub mod timing;
pub mod viseme;

pub use config::LipSyncConfig;
pub use error::{LipSyncError, Result};
pub use estimator::{EstimatorLadder, EstimatorMode, VisemeEstimator};
pub use lipsync::{ExpressionSink, GateState, LipSync, TickOutcome, VisemeFrame};
pub use signals::{AudioElementState, FrequencyBands, SignalSnapshot, SpeechSignals};
pub use timing::WordBoundary;
pub use viseme::{Channel, ChannelWeights};
