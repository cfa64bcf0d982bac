use serde::{Deserialize, Serialize};

use crate::error::{AudioError, Result};

/// MIME type of everything the encoder produces
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Extensions accepted for upload and the MIME type each is served as
const AUDIO_MIME_TYPES: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("wav", WAV_MIME_TYPE),
    ("ogg", "audio/ogg"),
    ("webm", "audio/webm"),
    ("aac", "audio/aac"),
    ("flac", "audio/flac"),
    ("m4a", "audio/m4a"),
];

/// MIME types a browser may report for a supported audio upload
const ACCEPTED_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/wave",
    "audio/x-wav",
    "audio/webm",
    "audio/ogg",
    "audio/aac",
    "audio/flac",
    "audio/x-flac",
    "audio/m4a",
];

/// MIME type for a file extension (case-insensitive, no leading dot)
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    AUDIO_MIME_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|&(_, mime)| mime)
}

/// Whether a reported MIME type names a supported audio format. Parameters
/// such as `; codecs=opus` are ignored.
pub fn is_supported_mime_type(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    ACCEPTED_MIME_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(essence))
}

/// Level reported for digital silence, in dB
const SILENCE_DB: f64 = -100.0;

/// Decoded audio held in memory as planar PCM samples
///
/// One `Vec<f32>` per channel, every channel the same length. Samples are
/// nominally in [-1.0, 1.0] but are not clamped until encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,

    /// Per-channel sample data: `channels[c][i]` is frame `i` of channel `c`
    pub channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Buffer of `frame_count` zero samples on every channel
    pub fn silent(sample_rate: u32, channel_count: usize, frame_count: usize) -> Self {
        Self::new(sample_rate, vec![vec![0.0; frame_count]; channel_count])
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (one sample per channel), taken from the first channel
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration = frame_count / sample_rate
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Check the structural invariants every stage relies on
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(AudioError::InvalidBuffer("buffer has no channels".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidBuffer("sample rate is zero".to_string()));
        }

        let frames = self.frame_count();
        if frames == 0 {
            return Err(AudioError::InvalidBuffer("buffer has no frames".to_string()));
        }
        if let Some((index, channel)) = self
            .channels
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != frames)
        {
            return Err(AudioError::InvalidBuffer(format!(
                "channel {} has {} samples, expected {}",
                index,
                channel.len(),
                frames
            )));
        }

        Ok(())
    }

    /// Peak level across all channels in dBFS, -100 for silence
    pub fn peak_level_db(&self) -> f64 {
        let peak = self
            .channels
            .iter()
            .flatten()
            .fold(0.0f32, |max, &s| max.max(s.abs()));

        to_db(peak as f64)
    }

    /// RMS level across all channels in dBFS, -100 for silence
    pub fn rms_level_db(&self) -> f64 {
        let count = self.channels.iter().map(Vec::len).sum::<usize>();
        if count == 0 {
            return SILENCE_DB;
        }

        let sum: f64 = self
            .channels
            .iter()
            .flatten()
            .map(|&s| s as f64 * s as f64)
            .sum();

        to_db((sum / count as f64).sqrt())
    }
}

fn to_db(amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        20.0 * amplitude.log10()
    } else {
        SILENCE_DB
    }
}

/// Metadata about an audio source without loading all samples
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Total duration in seconds (0 when the container does not say)
    pub duration_seconds: f64,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (0 when the container does not say)
    pub channels: u16,

    /// Audio format/codec name (e.g., "mp3", "flac", "pcm_s16le")
    pub format: String,

    /// Bit depth if available (e.g., 16, 24)
    pub bit_depth: Option<u16>,
}

/// Selection to keep, in seconds of the source audio
///
/// Constructing one never fails; the range is checked against the actual
/// buffer by [`trim_audio`](crate::audio::trim_audio).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimParams {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl TrimParams {
    pub fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }

    /// Get the duration of the trimmed audio
    pub fn trim_duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Encoded container bytes plus their MIME type
///
/// Opaque to this crate once produced; handed to whatever saves or serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl EncodedAudio {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_and_frames() {
        let buffer = SampleBuffer::silent(44100, 2, 88200);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 88200);
        assert_eq!(buffer.duration_seconds(), 2.0);
    }

    #[test]
    fn test_validate_catches_structural_problems() {
        assert!(matches!(
            SampleBuffer::new(44100, vec![]).validate(),
            Err(AudioError::InvalidBuffer(_))
        ));
        assert!(matches!(
            SampleBuffer::new(0, vec![vec![0.0; 4]]).validate(),
            Err(AudioError::InvalidBuffer(_))
        ));
        assert!(matches!(
            SampleBuffer::new(44100, vec![vec![], vec![]]).validate(),
            Err(AudioError::InvalidBuffer(_))
        ));
        assert!(matches!(
            SampleBuffer::new(44100, vec![vec![0.0; 4], vec![0.0; 3]]).validate(),
            Err(AudioError::InvalidBuffer(_))
        ));
        assert!(SampleBuffer::silent(8000, 1, 1).validate().is_ok());
    }

    #[test]
    fn test_levels() {
        let silent = SampleBuffer::silent(8000, 2, 16);
        assert_eq!(silent.peak_level_db(), -100.0);
        assert_eq!(silent.rms_level_db(), -100.0);

        let full = SampleBuffer::new(8000, vec![vec![1.0, -1.0, 1.0, -1.0]]);
        assert!(full.peak_level_db().abs() < 1e-9);
        assert!(full.rms_level_db().abs() < 1e-9);

        let half = SampleBuffer::new(8000, vec![vec![0.5, -0.25]]);
        assert!((half.peak_level_db() - (-6.0206)).abs() < 1e-3);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for_extension("mp3"), Some("audio/mpeg"));
        assert_eq!(mime_type_for_extension("FLAC"), Some("audio/flac"));
        assert_eq!(mime_type_for_extension("wav"), Some(WAV_MIME_TYPE));
        assert_eq!(mime_type_for_extension("txt"), None);

        assert!(is_supported_mime_type("audio/x-wav"));
        assert!(is_supported_mime_type("audio/webm; codecs=opus"));
        assert!(is_supported_mime_type("Audio/MPEG"));
        assert!(!is_supported_mime_type("text/html"));
        assert!(!is_supported_mime_type(""));
    }

    #[test]
    fn test_trim_duration() {
        let params = TrimParams::new(2.5, 7.5);
        assert_eq!(params.trim_duration(), 5.0);
    }
}
