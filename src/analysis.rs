//! Amplitude and four-band energy from PCM frames.
//!
//! Produces the same signals a browser `AnalyserNode` would hand the
//! estimators: a Blackman-windowed FFT with temporal smoothing, magnitudes
//! mapped from decibels onto `[0, 1]`, averaged over each band.

use crate::config::AnalysisConfig;
use crate::error::{LipSyncError, Result};
use crate::signals::FrequencyBands;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Analyzer output for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalysisFrame {
    /// Scaled RMS in `[0, 1]`.
    pub amplitude: f32,
    pub bands: FrequencyBands,
}

/// Streaming spectrum analyzer.
pub struct SpectrumAnalyzer {
    config: AnalysisConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    /// Temporally smoothed linear magnitude per bin (DC..Nyquist).
    smoothed: Vec<f32>,
    /// Bin index ranges `[start, end)` per band.
    band_bins: [(usize, usize); 4],
}

impl SpectrumAnalyzer {
    /// Create an analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let n = config.fft_size;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);

        let hz_per_bin = config.sample_rate as f32 / n as f32;
        let nyquist_bins = n / 2;
        let mut band_bins = [(0usize, 0usize); 4];
        for (i, range) in band_bins.iter_mut().enumerate() {
            let lo = (config.band_edges_hz[i] / hz_per_bin).ceil() as usize;
            let hi = (config.band_edges_hz[i + 1] / hz_per_bin).ceil() as usize;
            *range = (lo.min(nyquist_bins), hi.min(nyquist_bins));
        }

        debug!(
            fft_size = n,
            sample_rate = config.sample_rate,
            ?band_bins,
            "spectrum analyzer ready"
        );

        Ok(Self {
            config: config.clone(),
            fft,
            window: blackman_window(n),
            buffer: vec![Complex::new(0.0, 0.0); n],
            smoothed: vec![0.0; nyquist_bins],
            band_bins,
        })
    }

    /// Samples consumed per analysis (the FFT size).
    #[must_use]
    pub fn frame_len(&self) -> usize {
        self.config.fft_size
    }

    /// Analyze the most recent `fft_size` samples of `frame`.
    ///
    /// Shorter frames are zero-padded at the front.
    pub fn analyze(&mut self, frame: &[f32]) -> AnalysisFrame {
        let n = self.config.fft_size;
        let tail = &frame[frame.len().saturating_sub(n)..];
        let pad = n - tail.len();

        for c in self.buffer.iter_mut().take(pad) {
            *c = Complex::new(0.0, 0.0);
        }
        for (i, s) in tail.iter().enumerate() {
            let idx = pad + i;
            let sample = if s.is_finite() { *s } else { 0.0 };
            self.buffer[idx] = Complex::new(sample * self.window[idx], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.config.smoothing_time_constant;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let c = self.buffer[k];
            let magnitude = (c.re * c.re + c.im * c.im).sqrt() / n as f32;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
        }

        let mut values = [0.0f32; 4];
        for (value, &(start, end)) in values.iter_mut().zip(self.band_bins.iter()) {
            if end <= start {
                continue;
            }
            let sum: f32 = self.smoothed[start..end]
                .iter()
                .map(|m| self.normalize_db(*m))
                .sum();
            *value = sum / (end - start) as f32;
        }

        AnalysisFrame {
            amplitude: (rms(tail) * self.config.amplitude_gain).min(1.0),
            bands: FrequencyBands::new(values[0], values[1], values[2], values[3]),
        }
    }

    /// Forget temporal smoothing (e.g. between utterances).
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|m| *m = 0.0);
    }

    fn normalize_db(&self, magnitude: f32) -> f32 {
        if magnitude <= 0.0 {
            return 0.0;
        }
        let db = 20.0 * magnitude.log10();
        let range = self.config.max_decibels - self.config.min_decibels;
        ((db - self.config.min_decibels) / range).clamp(0.0, 1.0)
    }
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("config", &self.config)
            .field("band_bins", &self.band_bins)
            .finish_non_exhaustive()
    }
}

fn blackman_window(n: usize) -> Vec<f32> {
    let denom = n.saturating_sub(1).max(1) as f32;
    (0..n)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / denom;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}

/// Root-mean-square of `samples` (zero when empty).
#[must_use]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples
        .iter()
        .filter(|s| s.is_finite())
        .map(|s| s * s)
        .sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Decoded PCM, downmixed to one channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source before downmixing.
    pub source_channels: u16,
}

impl MonoAudio {
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Everything played back by `time` seconds.
    #[must_use]
    pub fn played_until(&self, time: f64) -> &[f32] {
        let end = (time.max(0.0) * f64::from(self.sample_rate)) as usize;
        &self.samples[..end.min(self.samples.len())]
    }
}

/// Load a WAV file and average its channels into [`MonoAudio`].
///
/// Integer samples are scaled by their bit depth onto `[-1, 1]`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded.
pub fn load_wav_mono(path: &Path) -> Result<MonoAudio> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| LipSyncError::Audio(format!("cannot open WAV {}: {e}", path.display())))?;
    let spec = reader.spec();

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << spec.bits_per_sample.saturating_sub(1)) as f32;
            decode(reader.into_samples::<i32>(), |v| v as f32 / full_scale)?
        }
        hound::SampleFormat::Float => decode(reader.into_samples::<f32>(), |v| v)?,
    };

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };
    debug!(
        "loaded {} ({} Hz, {} ch, {} mono samples)",
        path.display(),
        spec.sample_rate,
        spec.channels,
        samples.len()
    );

    Ok(MonoAudio {
        samples,
        sample_rate: spec.sample_rate,
        source_channels: spec.channels,
    })
}

fn decode<S>(
    samples: impl Iterator<Item = hound::Result<S>>,
    convert: impl Fn(S) -> f32,
) -> Result<Vec<f32>> {
    samples
        .map(|s| {
            s.map(&convert)
                .map_err(|e| LipSyncError::Audio(format!("WAV read error: {e}")))
        })
        .collect()
}
