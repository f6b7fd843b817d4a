//! Offline replay: drives the analyzer and the lip-sync driver over a decoded
//! utterance at a fixed frame rate, as a render loop would.

use crate::analysis::{MonoAudio, SpectrumAnalyzer};
use crate::config::LipSyncConfig;
use crate::error::{LipSyncError, Result};
use crate::lipsync::{LipSync, TickOutcome};
use crate::signals::SignalSnapshot;
use crate::viseme::ChannelWeights;
use serde::Serialize;
use tracing::{info, warn};

/// Frame label for ticks that wrote zeros.
pub const SILENT: &str = "silent";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayOptions {
    /// Ticks per second of audio.
    pub fps: f64,
    /// Withhold band energy so only amplitude reaches the estimators.
    pub amplitude_only: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            fps: 60.0,
            amplitude_only: false,
        }
    }
}

/// Weights written to the avatar on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplayFrame {
    pub time: f64,
    /// Estimator that produced the frame, or [`SILENT`].
    pub mode: &'static str,
    pub weights: ChannelWeights,
}

/// Replay `audio` through a fresh driver and return every emitted frame.
///
/// `signals` supplies word boundaries and phonemes; playback flags, the
/// audio-context clock and audio levels are filled in per tick. The last
/// frame is the stop tick at the end of the audio, followed by a reset.
///
/// # Errors
///
/// Returns an error if `options.fps` is not positive or the analyzer
/// settings are invalid.
pub fn replay(
    audio: &MonoAudio,
    signals: &SignalSnapshot,
    config: &LipSyncConfig,
    options: ReplayOptions,
) -> Result<Vec<ReplayFrame>> {
    if !options.fps.is_finite() || options.fps <= 0.0 {
        return Err(LipSyncError::Config(format!(
            "replay fps must be positive, got {}",
            options.fps
        )));
    }

    let mut analysis = config.analysis.clone();
    if audio.sample_rate != analysis.sample_rate {
        info!(
            "audio is {} Hz, overriding analysis.sample_rate ({})",
            audio.sample_rate, analysis.sample_rate
        );
        analysis.sample_rate = audio.sample_rate;
    }
    let mut analyzer = SpectrumAnalyzer::new(&analysis)?;
    let mut lipsync = LipSync::new(config);
    let mut sink = ChannelWeights::ZERO;

    let mut snapshot = signals.clone();
    if snapshot.phonemes.is_some() && snapshot.word_boundaries.len() < 2 {
        warn!("phonemes without at least two word boundaries; phoneme mode unavailable");
    }
    snapshot.is_playing = true;
    snapshot.audio_element = None;
    snapshot.word_boundary_start_time = Some(0.0);

    let duration = audio.duration_secs();
    let ticks = (duration * options.fps).ceil() as usize;
    let mut frames = Vec::with_capacity(ticks + 1);
    for i in 0..ticks {
        let time = i as f64 / options.fps;
        let levels = analyzer.analyze(audio.played_until(time));

        snapshot.audio_context_time = Some(time);
        snapshot.amplitude = levels.amplitude;
        snapshot.frequency_bands = (!options.amplitude_only).then_some(levels.bands);

        let mode = match lipsync.tick(Some(&mut sink), &snapshot) {
            TickOutcome::Articulated(frame) => frame.mode.as_str(),
            TickOutcome::Silenced(_) | TickOutcome::NoAvatar => SILENT,
        };
        frames.push(ReplayFrame {
            time,
            mode,
            weights: sink,
        });
    }

    snapshot.is_playing = false;
    snapshot.audio_context_time = Some(duration);
    lipsync.tick(Some(&mut sink), &snapshot);
    lipsync.reset(Some(&mut sink));
    frames.push(ReplayFrame {
        time: duration,
        mode: SILENT,
        weights: sink,
    });

    info!("replayed {duration:.2}s as {} frames", frames.len());
    Ok(frames)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::analysis::load_wav_mono;
    use crate::estimator::EstimatorMode;

    /// Half a second of a 300 Hz tone followed by a quarter second of silence.
    fn write_tone(path: &std::path::Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..8_000 {
            let t = i as f32 / 16_000.0;
            let v = 0.5 * (2.0 * std::f32::consts::PI * 300.0 * t).sin();
            writer.write_sample((v * f32::from(i16::MAX)) as i16).unwrap();
        }
        for _ in 0..4_000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn tone() -> MonoAudio {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_tone(&path);
        load_wav_mono(&path).unwrap()
    }

    #[test]
    fn tone_replay_stays_in_range_and_ends_closed() {
        let audio = tone();
        let frames = replay(
            &audio,
            &SignalSnapshot::default(),
            &LipSyncConfig::default(),
            ReplayOptions::default(),
        )
        .unwrap();

        // 0.75 s at 60 fps, plus the stop frame.
        assert_eq!(frames.len(), 46);
        for frame in &frames {
            for (channel, weight) in frame.weights.iter() {
                assert!(
                    (0.0..=1.0).contains(&weight),
                    "{channel} = {weight} at {}",
                    frame.time
                );
            }
        }
        assert!(
            frames
                .iter()
                .any(|f| f.mode == EstimatorMode::FrequencyBands.as_str() && f.weights.aa > 0.0)
        );

        let last = frames.last().unwrap();
        assert_eq!(last.mode, SILENT);
        assert_eq!(last.weights, ChannelWeights::ZERO);
    }

    #[test]
    fn first_tick_hears_nothing() {
        let frames = replay(
            &tone(),
            &SignalSnapshot::default(),
            &LipSyncConfig::default(),
            ReplayOptions::default(),
        )
        .unwrap();
        assert_eq!(frames[0].mode, SILENT);
        assert!(frames[0].weights.is_zero());
    }

    #[test]
    fn trailing_silence_closes_the_mouth() {
        let frames = replay(
            &tone(),
            &SignalSnapshot::default(),
            &LipSyncConfig::default(),
            ReplayOptions::default(),
        )
        .unwrap();
        // Last tick before the stop frame analyzes a window that is all silence.
        let tail = &frames[frames.len() - 2];
        assert_eq!(tail.mode, SILENT);
        assert!(tail.weights.is_zero());
    }

    #[test]
    fn amplitude_only_never_uses_bands() {
        let frames = replay(
            &tone(),
            &SignalSnapshot::default(),
            &LipSyncConfig::default(),
            ReplayOptions {
                amplitude_only: true,
                ..ReplayOptions::default()
            },
        )
        .unwrap();
        assert!(
            frames
                .iter()
                .all(|f| f.mode != EstimatorMode::FrequencyBands.as_str())
        );
        assert!(frames.iter().any(|f| f.mode == EstimatorMode::Amplitude.as_str()));
    }

    #[test]
    fn rejects_non_positive_fps() {
        let audio = MonoAudio::default();
        for fps in [0.0, -30.0, f64::NAN] {
            let options = ReplayOptions {
                fps,
                ..ReplayOptions::default()
            };
            assert!(matches!(
                replay(&audio, &SignalSnapshot::default(), &LipSyncConfig::default(), options),
                Err(LipSyncError::Config(_))
            ));
        }
    }
}
