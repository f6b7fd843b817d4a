//! Error types for the lip-sync crate.
//!
//! The per-tick path never fails; these errors only come from the edges
//! (configuration, audio decoding, signal files, analyzer setup).

/// Top-level error type for lip-sync setup and offline tooling.
#[derive(Debug, thiserror::Error)]
pub enum LipSyncError {
    /// Configuration could not be parsed, serialized, or validated.
    #[error("config error: {0}")]
    Config(String),

    /// Audio decoding or spectrum analysis error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Signal snapshot or word-boundary file could not be read.
    #[error("signal error: {0}")]
    Signal(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LipSyncError>;
