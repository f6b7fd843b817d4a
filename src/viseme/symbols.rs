//! Phoneme string cleaning with a bounded cache.
//!
//! Synthesis engines report one IPA string per word, decorated with stress,
//! length and tone marks plus trailing punctuation. The estimator needs the
//! bare symbol sequence every frame, so cleaned sequences are memoized.

use std::collections::{HashMap, VecDeque};

/// Stress, length and combining tone/diacritic marks removed before lookup.
const DIACRITICS: [char; 12] = [
    '\u{02c8}', // ˈ primary stress
    '\u{02cc}', // ˌ secondary stress
    '\u{02d0}', // ː long
    '\u{02d1}', // ˑ half-long
    '\u{032f}', // non-syllabic
    '\u{0329}', // syllabic
    '\u{0306}', // breve
    '\u{0303}', // tilde
    '\u{0300}', // grave
    '\u{0301}', // acute
    '\u{0302}', // circumflex
    '\u{0304}', // macron
];

const PUNCTUATION: [char; 4] = [',', '.', '!', '?'];

/// Strip marks and punctuation and split into single symbols.
#[must_use]
pub fn clean_phonemes(raw: &str) -> Vec<char> {
    raw.chars()
        .filter(|c| !DIACRITICS.contains(c) && !PUNCTUATION.contains(c))
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Cleaned symbol sequences keyed by the raw phoneme string.
///
/// Eviction is by insertion order: once the cache holds more than
/// `capacity` entries the oldest-inserted key is dropped. Hits do not
/// refresh a key's position.
#[derive(Debug, Clone)]
pub struct SymbolCache {
    entries: HashMap<String, Vec<char>>,
    order: VecDeque<String>,
    capacity: usize,
}

impl SymbolCache {
    /// Create an empty cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity + 1),
            order: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Cleaned symbols for `raw`, computing and caching them on a miss.
    pub fn get_or_insert(&mut self, raw: &str) -> &[char] {
        if !self.entries.contains_key(raw) {
            self.entries.insert(raw.to_owned(), clean_phonemes(raw));
            self.order.push_back(raw.to_owned());
            if self.entries.len() > self.capacity
                && let Some(oldest) = self.order.pop_front()
            {
                self.entries.remove(&oldest);
            }
        }
        self.entries.get(raw).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn contains(&self, raw: &str) -> bool {
        self.entries.contains_key(raw)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SymbolCache {
    fn default() -> Self {
        Self::new(500)
    }
}
