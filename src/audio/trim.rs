// src/audio/trim.rs

use crate::audio::types::{SampleBuffer, TrimParams};
use crate::error::{AudioError, Result};

/// Trim audio data to a specific time range
///
/// Checks run in a fixed order and the first failure wins:
/// 1. the buffer must be structurally valid ([`AudioError::InvalidBuffer`])
/// 2. `0 <= start < end <= duration` ([`AudioError::InvalidRange`])
/// 3. the range must cover at least one frame ([`AudioError::EmptyRange`])
///
/// Times become frame offsets by `floor(time * sample_rate)`, except that an
/// end exactly equal to the buffer's duration always maps to the last frame,
/// so a full-range selection returns the whole buffer even when
/// `duration * sample_rate` rounds just below the frame count. The source is
/// never modified; the result owns fresh channel vectors.
///
/// # Example
/// ```
/// use wavetrim_lib::audio::{SampleBuffer, TrimParams, trim_audio};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // 10 seconds of stereo at 44.1kHz
/// let original_audio = SampleBuffer::silent(44100, 2, 441000);
///
/// // Trim from 5 seconds to 10 seconds
/// let trimmed = trim_audio(&original_audio, &TrimParams::new(5.0, 10.0))?;
///
/// assert_eq!(trimmed.duration_seconds(), 5.0);
/// assert_eq!(trimmed.sample_rate, 44100);
/// assert_eq!(trimmed.channel_count(), 2);
/// # Ok(())
/// # }
/// ```
pub fn trim_audio(audio: &SampleBuffer, params: &TrimParams) -> Result<SampleBuffer> {
    audio.validate()?;

    let start = params.start_seconds;
    let end = params.end_seconds;
    let duration = audio.duration_seconds();

    // Negated comparisons so NaN fails too
    if !(start >= 0.0 && end <= duration && start < end) {
        return Err(AudioError::InvalidRange {
            start,
            end,
            duration,
        });
    }

    let source_frames = audio.frame_count();
    let start_offset = frame_offset(start, audio.sample_rate);
    // A selection ending exactly at the duration keeps the last frame even if
    // duration * rate lands a hair under the frame count
    let end_offset = if end == duration {
        source_frames
    } else {
        frame_offset(end, audio.sample_rate)
    };

    if end_offset <= start_offset {
        return Err(AudioError::EmptyRange {
            start,
            end,
            sample_rate: audio.sample_rate,
        });
    }
    let frame_count = end_offset - start_offset;

    tracing::debug!(
        start_offset,
        end_offset,
        frame_count,
        channels = audio.channel_count(),
        "Trimming sample buffer"
    );

    let channels = audio
        .channels
        .iter()
        .enumerate()
        .map(|(index, source)| copy_range(index, source, start_offset, end_offset))
        .collect();

    Ok(SampleBuffer {
        sample_rate: audio.sample_rate,
        channels,
    })
}

/// Frame index for a time in seconds: `floor(seconds * sample_rate)`
pub fn frame_offset(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).floor() as usize
}

/// Copy `[start, end)` out of one channel. Frames past the end of the
/// source come out as silence.
fn copy_range(index: usize, source: &[f32], start: usize, end: usize) -> Vec<f32> {
    if let Some(segment) = source.get(start..end) {
        return segment.to_vec();
    }

    tracing::warn!(
        channel = index,
        start,
        end,
        available = source.len(),
        "Trim range exceeds channel data, padding with silence"
    );

    (start..end)
        .map(|i| source.get(i).copied().unwrap_or(0.0))
        .collect()
}
