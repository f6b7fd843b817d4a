//! Offline lip-sync harness: replays a WAV file through the analyzer and the
//! lip-sync driver at a fixed frame rate and prints one JSON line per tick.
//!
//! ```text
//! fae-lipsync-harness <speech.wav> [signals.json] [--fps N] [--config PATH] [--amplitude-only]
//! ```
//!
//! `signals.json` holds the utterance metadata. Keys may be snake_case or the
//! camelCase names the speech side emits:
//!
//! ```json
//! {
//!   "wordBoundaries": [
//!     { "offset": 0, "duration": 2500000 },
//!     { "offset": 2.6e6, "duration": 3e6 }
//!   ],
//!   "currentPhonemes": ["həlˈoʊ", "wˈɜːld"]
//! }
//! ```
//!
//! Offsets and durations are 100 ns ticks. Playback flags, the clock and
//! audio levels are filled in per tick.

use anyhow::{Context, bail};
use fae_lipsync::analysis::load_wav_mono;
use fae_lipsync::replay::{ReplayOptions, replay};
use fae_lipsync::{LipSyncConfig, SignalSnapshot};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = concat!(
    "usage: fae-lipsync-harness <speech.wav> [signals.json] ",
    "[--fps N] [--config PATH] [--amplitude-only]"
);

struct Args {
    wav: PathBuf,
    signals: Option<PathBuf>,
    config: Option<PathBuf>,
    options: ReplayOptions,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut wav = None;
    let mut signals = None;
    let mut config = None;
    let mut options = ReplayOptions::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fps" => {
                let value = args.next().context("--fps needs a value")?;
                options.fps = value
                    .parse::<f64>()
                    .with_context(|| format!("invalid --fps value: {value}"))?;
            }
            "--config" => {
                config = Some(PathBuf::from(args.next().context("--config needs a path")?));
            }
            "--amplitude-only" => options.amplitude_only = true,
            other if other.starts_with("--") => bail!("unknown flag: {other}\n{USAGE}"),
            other if wav.is_none() => wav = Some(PathBuf::from(other)),
            other if signals.is_none() => signals = Some(PathBuf::from(other)),
            other => bail!("unexpected argument: {other}\n{USAGE}"),
        }
    }

    Ok(Args {
        wav: wav.context(USAGE)?,
        signals,
        config,
        options,
    })
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<LipSyncConfig> {
    if let Some(path) = path {
        return LipSyncConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    let default_path = LipSyncConfig::default_config_path();
    if default_path.exists() {
        info!("using config {}", default_path.display());
        return Ok(LipSyncConfig::from_file(&default_path)?);
    }
    Ok(LipSyncConfig::default())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fae_lipsync=info")),
        )
        .init();

    let args = parse_args()?;
    let config = load_config(args.config.as_ref())?;
    let audio = load_wav_mono(&args.wav)?;
    let signals = match &args.signals {
        Some(path) => SignalSnapshot::from_json_file(path)?,
        None => SignalSnapshot::default(),
    };

    info!(
        "replaying {} ({:.2}s at {} fps)",
        args.wav.display(),
        audio.duration_secs(),
        args.options.fps
    );
    let frames = replay(&audio, &signals, &config, args.options)?;

    let mut modes: BTreeMap<&str, usize> = BTreeMap::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for frame in &frames {
        *modes.entry(frame.mode).or_default() += 1;
        let line = serde_json::to_string(frame).context("encoding frame")?;
        writeln!(out, "{line}").context("writing frame")?;
    }

    info!(?modes, "replay finished");
    Ok(())
}
