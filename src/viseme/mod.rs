//! Viseme channels for lip-sync animation.
//!
//! A viseme is a visual mouth shape that corresponds to a phoneme (sound).
//! The avatar exposes five blend-shape channels (`aa`, `ih`, `ou`, `ee`,
//! `oh`); every mouth pose is a weight in `[0, 1]` on each of them.

pub mod symbols;
pub mod table;

use serde::{Deserialize, Serialize};

/// Expression channels driven by lip-sync, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Jaw open ("ah").
    Aa,
    /// Slight open ("ih", "eh").
    Ih,
    /// Rounded, pursed ("oo").
    Ou,
    /// Wide spread ("ee").
    Ee,
    /// Rounded, open ("oh").
    Oh,
}

impl Channel {
    /// All channels in the order they are written to the sink.
    pub const ALL: [Channel; 5] = [
        Channel::Aa,
        Channel::Ih,
        Channel::Ou,
        Channel::Ee,
        Channel::Oh,
    ];

    /// Expression name understood by the avatar rig.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Aa => "aa",
            Channel::Ih => "ih",
            Channel::Ou => "ou",
            Channel::Ee => "ee",
            Channel::Oh => "oh",
        }
    }

    /// Parse an expression name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weight per [`Channel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelWeights {
    pub aa: f32,
    pub ih: f32,
    pub ou: f32,
    pub ee: f32,
    pub oh: f32,
}

impl ChannelWeights {
    /// Closed mouth.
    pub const ZERO: ChannelWeights = ChannelWeights::new(0.0, 0.0, 0.0, 0.0, 0.0);

    /// Build weights in channel order (`aa`, `ih`, `ou`, `ee`, `oh`).
    #[must_use]
    pub const fn new(aa: f32, ih: f32, ou: f32, ee: f32, oh: f32) -> Self {
        Self { aa, ih, ou, ee, oh }
    }

    #[must_use]
    pub fn get(&self, channel: Channel) -> f32 {
        self.to_array()[channel.index()]
    }

    pub fn set(&mut self, channel: Channel, weight: f32) {
        match channel {
            Channel::Aa => self.aa = weight,
            Channel::Ih => self.ih = weight,
            Channel::Ou => self.ou = weight,
            Channel::Ee => self.ee = weight,
            Channel::Oh => self.oh = weight,
        }
    }

    #[must_use]
    pub fn to_array(&self) -> [f32; 5] {
        [self.aa, self.ih, self.ou, self.ee, self.oh]
    }

    /// Sum of all five weights.
    #[must_use]
    pub fn sum(&self) -> f32 {
        self.to_array().iter().sum()
    }

    /// True when every channel is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.to_array().iter().all(|w| *w == 0.0)
    }

    /// Apply `f` to every channel.
    #[must_use]
    pub fn map(self, mut f: impl FnMut(Channel, f32) -> f32) -> Self {
        let mut out = Self::ZERO;
        for channel in Channel::ALL {
            out.set(channel, f(channel, self.get(channel)));
        }
        out
    }

    /// Every channel clamped to `[0, 1]`. NaN collapses to zero.
    #[must_use]
    pub fn clamped(self) -> Self {
        self.map(|_, w| if w.is_nan() { 0.0 } else { w.clamp(0.0, 1.0) })
    }

    /// `(channel, weight)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f32)> + '_ {
        Channel::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}
