use std::time::Duration;

use thiserror::Error;

/// All possible errors that can occur during audio processing
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to open or read the audio file from disk
    #[error("Failed to open audio file '{path}': {source}")]
    FileOpen {
        path: String,
        source: std::io::Error,
    },

    /// The bytes behind a locator could not be retrieved
    #[error("Failed to retrieve '{locator}': {reason}")]
    Fetch { locator: String, reason: String },

    /// The byte source is empty, corrupt, or not a supported audio container
    #[error("Could not decode '{source_id}': {reason}")]
    Decode { source_id: String, reason: String },

    /// The sample buffer breaks its structural invariants (no channels,
    /// no frames, zero sample rate, ragged channels)
    #[error("Invalid sample buffer: {0}")]
    InvalidBuffer(String),

    /// Trim range violates ordering or lies outside the audio
    #[error("Invalid trim range ({start}s to {end}s) for audio of {duration}s")]
    InvalidRange { start: f64, end: f64, duration: f64 },

    /// Range looked valid but collapsed to zero frames at this sample rate
    #[error("Selection {start}s to {end}s contains no samples at {sample_rate} Hz")]
    EmptyRange {
        start: f64,
        end: f64,
        sample_rate: u32,
    },

    /// Error occurred while encoding to WAV
    #[error("WAV encoding failed: {0}")]
    Encode(String),

    /// The encode worker itself failed, independent of the data it was given
    #[error("Encode worker failed: {0}")]
    Worker(#[from] WorkerError),

    /// Configuration values that cannot be used
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Failures of the off-thread execution context
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("could not start worker thread: {0}")]
    Spawn(std::io::Error),

    #[error("worker terminated without a reply")]
    Terminated,

    #[error("no reply within {0:?}")]
    TimedOut(Duration),
}

/// Coarse grouping of errors for user-facing feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The user's selection cannot be trimmed
    InvalidSelection,
    /// The input could not be read or decoded
    UnreadableSource,
    /// Something broke inside the pipeline
    Internal,
}

impl AudioError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRange { .. } | Self::EmptyRange { .. } => ErrorCategory::InvalidSelection,
            Self::FileOpen { .. } | Self::Fetch { .. } | Self::Decode { .. } => {
                ErrorCategory::UnreadableSource
            }
            Self::InvalidBuffer(_) | Self::Encode(_) | Self::Worker(_) | Self::Config(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

/// Convenient Result type that uses our AudioError
pub type Result<T> = std::result::Result<T, AudioError>;
