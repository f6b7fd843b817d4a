//! Phoneme-driven targets from word timing and per-word IPA strings.

use super::{EstimatorInput, EstimatorMode, VisemeEstimator};
use crate::timing::resolve_active_word;
use crate::viseme::symbols::SymbolCache;
use crate::viseme::{Channel, ChannelWeights, table};
use tracing::trace;

/// Speech energy front-loads within a word and synthesis pads words with
/// trailing silence, so symbol selection runs ahead of linear time.
const PROGRESS_ACCELERATION: f64 = 1.5;
/// Quiet-but-detected speech still articulates at this amplitude.
const AMPLITUDE_FLOOR: f32 = 0.3;
const MIN_MOTION_SUM: f32 = 0.2;

/// Maps elapsed time inside the active word to its dominant symbol.
#[derive(Debug, Clone, Default)]
pub struct PhonemeEstimator {
    cache: SymbolCache,
}

impl PhonemeEstimator {
    #[must_use]
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: SymbolCache::new(cache_capacity),
        }
    }

    /// Cleaned phoneme cache (read-only).
    #[must_use]
    pub fn cache(&self) -> &SymbolCache {
        &self.cache
    }
}

/// Table key for position `progress` within `symbols`.
///
/// Prefers the two-symbol digraph starting at the selected index when the
/// table defines it.
fn select_symbol(symbols: &[char], progress: f64) -> Option<String> {
    let last = symbols.len().checked_sub(1)?;
    let accelerated = (progress * PROGRESS_ACCELERATION).min(1.0);
    let index = ((accelerated * symbols.len() as f64).floor() as usize).min(last);

    let mut key = String::with_capacity(8);
    key.push(symbols[index]);
    if index < last {
        key.push(symbols[index + 1]);
        if table::contains(&key) {
            return Some(key);
        }
        key.pop();
    }
    Some(key)
}

/// Scale table weights by amplitude and add an amplitude-driven base opening.
fn shape(weights: ChannelWeights, amplitude: f32) -> ChannelWeights {
    let amp = amplitude.max(AMPLITUDE_FLOOR);
    let mult = (amp * 2.0).min(1.0);
    let mut shaped = weights.map(|channel, w| {
        let base = if channel == Channel::Aa {
            amp * 0.5
        } else {
            amp * 0.3
        };
        (w * mult + base).min(1.0)
    });
    if shaped.sum() < MIN_MOTION_SUM {
        shaped.aa = shaped.aa.max(amp * 0.5);
    }
    shaped
}

impl VisemeEstimator for PhonemeEstimator {
    fn mode(&self) -> EstimatorMode {
        EstimatorMode::Phoneme
    }

    fn estimate(&mut self, input: &EstimatorInput<'_>) -> Option<ChannelWeights> {
        let word = resolve_active_word(input.now, input.boundaries)?;
        let raw = input
            .phonemes?
            .get(word.index)
            .filter(|p| !p.is_empty())?;

        let progress = word.progress(input.now);
        let symbols = self.cache.get_or_insert(raw);
        let key = select_symbol(symbols, progress)?;

        let weights = table::lookup(&key);
        if weights.is_zero() {
            trace!(word = word.index, symbol = %key, "no viseme mapping, deferring");
            return None;
        }
        trace!(word = word.index, symbol = %key, progress, "phoneme viseme");
        Some(shape(weights, input.amplitude))
    }
}
