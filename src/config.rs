//! Configuration types for the lip-sync driver and the spectrum analyzer.

use crate::error::{LipSyncError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Playback/amplitude gate settings.
    pub gate: GateConfig,
    /// Exponential smoothing constants.
    pub smoothing: SmoothingConfig,
    /// Cleaned phoneme cache settings.
    pub symbols: SymbolConfig,
    /// PCM spectrum analyzer settings (offline harness and native hosts).
    pub analysis: AnalysisConfig,
}

/// Gate that decides whether the mouth articulates at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Amplitude at or below which the mouth snaps shut.
    pub amplitude_threshold: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            amplitude_threshold: 0.02,
        }
    }
}

/// Smoothing constants: higher value = slower mouth movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Used when the phoneme estimator produced this tick's targets.
    pub phoneme: f32,
    /// Used for frequency-band and amplitude-only targets.
    pub frequency: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            phoneme: 0.25,
            frequency: 0.35,
        }
    }
}

/// Cleaned phoneme cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    /// Maximum number of raw phoneme strings kept.
    pub cache_capacity: usize,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 500,
        }
    }
}

/// Spectrum analyzer settings.
///
/// Defaults mirror a browser `AnalyserNode` (`minDecibels = -100`,
/// `maxDecibels = -30`, `smoothingTimeConstant = 0.8`) so that band values
/// land in the same `[0, 1]` range the estimators are tuned for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Sample rate of the PCM fed to the analyzer, in Hz.
    pub sample_rate: u32,
    /// FFT size in samples (must be a power of two).
    pub fft_size: usize,
    /// Magnitude (dB) mapped to 0.0.
    pub min_decibels: f32,
    /// Magnitude (dB) mapped to 1.0.
    pub max_decibels: f32,
    /// Temporal smoothing of bin magnitudes between frames, in `[0, 1)`.
    pub smoothing_time_constant: f32,
    /// Scale applied to frame RMS to produce the `[0, 1]` amplitude.
    pub amplitude_gain: f32,
    /// Five ascending edges (Hz) delimiting the low, mid-low, mid-high and
    /// high bands.
    pub band_edges_hz: [f32; 5],
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            fft_size: 2048,
            min_decibels: -100.0,
            max_decibels: -30.0,
            smoothing_time_constant: 0.8,
            amplitude_gain: 4.0,
            // Low: fundamental + F1, mid-low: F1-F2 transition,
            // mid-high: F2 region, high: sibilance.
            band_edges_hz: [0.0, 860.0, 2150.0, 3440.0, 6020.0],
        }
    }
}

impl LipSyncConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| LipSyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LipSyncError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    ///
    /// `FAE_LIPSYNC_CONFIG_DIR` overrides the platform config directory.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        let dir = if let Some(override_dir) = std::env::var_os("FAE_LIPSYNC_CONFIG_DIR") {
            PathBuf::from(override_dir)
        } else {
            dirs::config_dir()
                .map(|d| d.join("fae-lipsync"))
                .unwrap_or_else(|| PathBuf::from("/tmp/fae-lipsync-config"))
        };
        dir.join("lipsync.toml")
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`LipSyncError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gate.amplitude_threshold) {
            return Err(LipSyncError::Config(format!(
                "gate.amplitude_threshold must be in [0, 1], got {}",
                self.gate.amplitude_threshold
            )));
        }
        for (name, value) in [
            ("smoothing.phoneme", self.smoothing.phoneme),
            ("smoothing.frequency", self.smoothing.frequency),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(LipSyncError::Config(format!(
                    "{name} must be in [0, 1), got {value}"
                )));
            }
        }
        if self.symbols.cache_capacity == 0 {
            return Err(LipSyncError::Config(
                "symbols.cache_capacity must be at least 1".into(),
            ));
        }
        self.analysis.validate()
    }
}

impl AnalysisConfig {
    /// Check analyzer settings.
    ///
    /// # Errors
    ///
    /// Returns [`LipSyncError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(LipSyncError::Config(
                "analysis.sample_rate must be non-zero".into(),
            ));
        }
        if self.fft_size < 32 || !self.fft_size.is_power_of_two() {
            return Err(LipSyncError::Config(format!(
                "analysis.fft_size must be a power of two >= 32, got {}",
                self.fft_size
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(LipSyncError::Config(format!(
                "analysis.min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(LipSyncError::Config(format!(
                "analysis.smoothing_time_constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if self.amplitude_gain <= 0.0 {
            return Err(LipSyncError::Config(
                "analysis.amplitude_gain must be positive".into(),
            ));
        }
        if self.band_edges_hz[0] < 0.0 || self.band_edges_hz.windows(2).any(|w| w[1] <= w[0]) {
            return Err(LipSyncError::Config(format!(
                "analysis.band_edges_hz must be non-negative and strictly increasing, got {:?}",
                self.band_edges_hz
            )));
        }
        Ok(())
    }
}
