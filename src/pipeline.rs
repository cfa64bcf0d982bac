//! Decode → trim → encode for one user-initiated trim.
//!
//! Stages run strictly one after another. Decode and trim run on the
//! caller's task; only the encode is moved to a worker thread. Callers that
//! can trigger trims repeatedly are expected to hold off starting a new one
//! while an earlier call is still pending.

use bytes::Bytes;

use crate::audio::{
    decode_bytes, decode_locator, encode_wav_off_thread, trim_audio, trimmed_file_name,
    EncodedAudio, TrimParams,
};
use crate::config::TrimConfig;
use crate::error::Result;

/// Where the input audio comes from
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// Already-loaded file contents and the name they were loaded under
    Bytes { bytes: Bytes, name: String },
    /// A URL or path, retrieved before decoding
    Locator(String),
}

impl ByteSource {
    pub fn bytes(bytes: impl Into<Bytes>, name: impl Into<String>) -> Self {
        Self::Bytes {
            bytes: bytes.into(),
            name: name.into(),
        }
    }

    pub fn locator(locator: impl Into<String>) -> Self {
        Self::Locator(locator.into())
    }

    /// Identifier used for errors, logs and the output file name
    pub fn name(&self) -> &str {
        match self {
            Self::Bytes { name, .. } => name,
            Self::Locator(locator) => locator,
        }
    }
}

/// Result of a successful trim
#[derive(Debug, Clone)]
pub struct TrimOutput {
    /// The WAV bytes, ready to save or serve
    pub audio: EncodedAudio,

    /// Suggested file name, see [`trimmed_file_name`]
    pub file_name: String,

    pub sample_rate: u32,
    pub channel_count: usize,
    pub frame_count: usize,
}

impl TrimOutput {
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count as f64 / self.sample_rate as f64
    }
}

/// Decode a source, cut out `params`, and encode the selection as WAV
///
/// # Example
/// ```no_run
/// use wavetrim_lib::config::TrimConfig;
/// use wavetrim_lib::pipeline::{trim_to_wav, ByteSource};
/// use wavetrim_lib::TrimParams;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = ByteSource::locator("https://example.com/podcast/episode-12.mp3");
/// let output = trim_to_wav(source, &TrimParams::new(60.0, 90.0), &TrimConfig::default()).await?;
/// std::fs::write(&output.file_name, &output.audio.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn trim_to_wav(
    source: ByteSource,
    params: &TrimParams,
    config: &TrimConfig,
) -> Result<TrimOutput> {
    config.validate()?;

    let file_name = trimmed_file_name(source.name(), params.start_seconds, params.end_seconds);

    let decoded = match source {
        ByteSource::Bytes { bytes, name } => decode_bytes(bytes, &name)?,
        ByteSource::Locator(locator) => decode_locator(&locator, config).await?,
    };
    tracing::info!(
        duration = decoded.duration_seconds(),
        sample_rate = decoded.sample_rate,
        channels = decoded.channel_count(),
        "Decoded source"
    );

    let trimmed = trim_audio(&decoded, params)?;
    drop(decoded);

    let sample_rate = trimmed.sample_rate;
    let channel_count = trimmed.channel_count();
    let frame_count = trimmed.frame_count();
    tracing::info!(
        start = params.start_seconds,
        end = params.end_seconds,
        frame_count,
        "Trimmed selection"
    );

    let peak_db = trimmed.peak_level_db();
    if peak_db <= -100.0 {
        tracing::warn!(file_name = %file_name, "Selection contains only silence");
    } else {
        tracing::debug!(peak_db, rms_db = trimmed.rms_level_db(), "Selection levels");
    }

    let audio = encode_wav_off_thread(trimmed, config).await?;
    tracing::info!(bytes = audio.len(), file_name = %file_name, "Encoded WAV");

    Ok(TrimOutput {
        audio,
        file_name,
        sample_rate,
        channel_count,
        frame_count,
    })
}
