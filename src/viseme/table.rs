//! IPA phoneme to blend-shape weights.
//!
//! Each entry is a distribution over channels rather than a single
//! category: diphthongs and coarticulated consonants blend several mouth
//! shapes. Channels an entry does not mention are zero.

use super::ChannelWeights;

const fn w(aa: f32, ih: f32, ou: f32, ee: f32, oh: f32) -> ChannelWeights {
    ChannelWeights::new(aa, ih, ou, ee, oh)
}

/// Every symbol the table defines, single symbols first, then digraphs.
pub const SYMBOLS: [&str; 41] = [
    // Vowels
    "\u{0259}", // ə
    "\u{00e6}", // æ
    "a",
    "\u{0251}", // ɑ
    "\u{0252}", // ɒ
    "\u{0254}", // ɔ
    "o",
    "\u{028a}", // ʊ
    "u",
    "\u{028c}", // ʌ
    "\u{026a}", // ɪ
    "i",
    "e",
    "\u{025b}", // ɛ
    "\u{025c}", // ɜ
    "\u{0250}", // ɐ
    // Consonants
    "f",
    "v",
    "\u{03b8}", // θ
    "\u{00f0}", // ð
    "s",
    "z",
    "\u{0283}", // ʃ
    "\u{0292}", // ʒ
    "t",
    "d",
    "n",
    "l",
    "\u{0279}", // ɹ
    "w",
    "j",
    "p",
    "b",
    "m",
    "k",
    "\u{0261}", // ɡ
    "\u{014b}", // ŋ
    "h",
    "\u{027e}", // ɾ
    // Affricates
    "t\u{0283}", // tʃ
    "d\u{0292}", // dʒ
];

/// Weights for `symbol`, or `None` if the table has no entry.
#[must_use]
pub fn entry(symbol: &str) -> Option<ChannelWeights> {
    let weights = match symbol {
        // Vowels
        "\u{0259}" => w(0.5, 0.2, 0.0, 0.0, 0.0), // ə
        "\u{00e6}" => w(0.7, 0.0, 0.0, 0.0, 0.0), // æ
        "a" => w(0.8, 0.0, 0.0, 0.0, 0.0),
        "\u{0251}" => w(1.0, 0.0, 0.0, 0.0, 0.0), // ɑ
        "\u{0252}" => w(0.0, 0.0, 0.0, 0.0, 0.8), // ɒ
        "\u{0254}" => w(0.0, 0.0, 0.0, 0.0, 1.0), // ɔ
        "o" => w(0.0, 0.0, 0.0, 0.0, 0.9),
        "\u{028a}" => w(0.0, 0.0, 0.7, 0.0, 0.0), // ʊ
        "u" => w(0.0, 0.0, 1.0, 0.0, 0.0),
        "\u{028c}" => w(0.5, 0.0, 0.0, 0.0, 0.3), // ʌ
        "\u{026a}" => w(0.0, 0.6, 0.0, 0.0, 0.0), // ɪ
        "i" => w(0.0, 0.3, 0.0, 0.8, 0.0),
        "e" => w(0.0, 0.2, 0.0, 0.7, 0.0),
        "\u{025b}" => w(0.0, 0.3, 0.0, 0.6, 0.0), // ɛ
        "\u{025c}" => w(0.5, 0.0, 0.0, 0.0, 0.3), // ɜ
        "\u{0250}" => w(0.6, 0.0, 0.0, 0.0, 0.0), // ɐ

        // Labiodental, dental, alveolar
        "f" | "v" => w(0.0, 0.3, 0.0, 0.0, 0.0),
        "\u{03b8}" | "\u{00f0}" => w(0.0, 0.4, 0.0, 0.0, 0.0), // θ ð
        "s" => w(0.0, 0.4, 0.0, 0.0, 0.0),
        "z" => w(0.0, 0.0, 0.0, 0.4, 0.0),
        "t" | "d" | "n" | "l" | "\u{027e}" => w(0.0, 0.3, 0.0, 0.0, 0.0), // ɾ

        // Postalveolar and rounded approximants
        "\u{0283}" | "\u{0292}" | "\u{0279}" => w(0.0, 0.0, 0.4, 0.0, 0.0), // ʃ ʒ ɹ
        "w" => w(0.0, 0.0, 0.6, 0.0, 0.0),
        "j" => w(0.0, 0.0, 0.0, 0.4, 0.0),

        // Bilabial, velar, glottal
        "p" | "b" | "m" | "\u{014b}" => w(0.3, 0.0, 0.0, 0.0, 0.0), // ŋ
        "k" | "\u{0261}" => w(0.4, 0.0, 0.0, 0.0, 0.0),              // ɡ
        "h" => w(0.2, 0.0, 0.0, 0.0, 0.0),

        // Affricates, looked up as a unit when both symbols are adjacent
        "t\u{0283}" | "d\u{0292}" => w(0.0, 0.0, 0.4, 0.0, 0.0),

        _ => return None,
    };
    Some(weights)
}

/// Weights for `symbol`, all-zero if the table has no entry.
#[must_use]
pub fn lookup(symbol: &str) -> ChannelWeights {
    entry(symbol).unwrap_or(ChannelWeights::ZERO)
}

/// Whether the table defines `symbol`.
#[must_use]
pub fn contains(symbol: &str) -> bool {
    entry(symbol).is_some()
}
