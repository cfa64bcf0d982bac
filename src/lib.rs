//! Sample-accurate audio trimming.
//!
//! Decode any container symphonia understands, cut an exact frame range out
//! of it, and export the selection as a canonical 16-bit PCM WAV file. The
//! encode runs on a dedicated worker thread so callers driving an
//! interactive UI stay responsive.

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;

// Re-export for convenience
pub use audio::*;
pub use config::TrimConfig;
pub use error::{AudioError, ErrorCategory, Result, WorkerError};
pub use pipeline::{trim_to_wav, ByteSource, TrimOutput};
