// src/audio/encoder.rs

use crate::audio::types::{EncodedAudio, SampleBuffer, WAV_MIME_TYPE};
use crate::error::{AudioError, Result};

/// Size of the canonical RIFF/WAVE header written by [`encode_wav`]
pub const WAV_HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;
const FORMAT_PCM: u16 = 1;

/// Encode a sample buffer as a 16-bit PCM WAV file in memory
///
/// Output is always `44 + frames * channels * 2` bytes: a canonical 44 byte
/// header followed by little-endian samples, interleaved frame by frame.
/// Samples are quantized by [`quantize_sample`].
///
/// # Example
/// ```
/// use wavetrim_lib::audio::{SampleBuffer, encode_wav};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let audio = SampleBuffer::new(44100, vec![vec![0.0, 0.5, -0.5, 1.0, -1.0]]);
///
/// let wav = encode_wav(&audio)?;
/// assert_eq!(wav.len(), 44 + 5 * 2);
/// assert_eq!(&wav.bytes[0..4], b"RIFF");
/// assert_eq!(wav.mime_type, "audio/wav");
/// # Ok(())
/// # }
/// ```
pub fn encode_wav(audio: &SampleBuffer) -> Result<EncodedAudio> {
    let layout = WavLayout::for_buffer(audio)?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + layout.data_len as usize);
    layout.write_header(&mut bytes);

    for frame in 0..layout.frames {
        for channel in &audio.channels {
            bytes.extend_from_slice(&quantize_sample(channel[frame]).to_le_bytes());
        }
    }

    debug_assert_eq!(bytes.len(), WAV_HEADER_LEN + layout.data_len as usize);

    Ok(EncodedAudio {
        bytes,
        mime_type: WAV_MIME_TYPE,
    })
}

/// Map a float sample to signed 16-bit PCM
///
/// Clamps to [-1, 1], then scales negatives by 32768 and everything else by
/// 32767, truncating toward zero. NaN and infinities become silence.
pub fn quantize_sample(sample: f32) -> i16 {
    if !sample.is_finite() {
        return 0;
    }

    let clamped = f64::from(sample.clamp(-1.0, 1.0));
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };

    scaled.trunc() as i16
}

/// Header fields derived from a validated buffer
#[derive(Debug, Clone, Copy)]
struct WavLayout {
    channels: u16,
    sample_rate: u32,
    frames: usize,
    data_len: u32,
}

impl WavLayout {
    fn for_buffer(audio: &SampleBuffer) -> Result<Self> {
        if audio.channels.is_empty() {
            return Err(AudioError::Encode("buffer has no channels".to_string()));
        }

        let frames = audio.frame_count();
        if let Some((index, channel)) = audio
            .channels
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != frames)
        {
            return Err(AudioError::Encode(format!(
                "channel {} has {} samples, expected {}",
                index,
                channel.len(),
                frames
            )));
        }

        // block align (channels * 2) is a 16-bit field too
        let channels = u16::try_from(audio.channel_count())
            .ok()
            .filter(|&c| c <= u16::MAX / BYTES_PER_SAMPLE as u16)
            .ok_or_else(|| {
                AudioError::Encode(format!(
                    "{} channels do not fit a WAV header",
                    audio.channel_count()
                ))
            })?;

        let data_len = frames
            .checked_mul(audio.channel_count())
            .and_then(|n| n.checked_mul(BYTES_PER_SAMPLE))
            // RIFF size field holds 36 + data length
            .filter(|&n| n <= (u32::MAX - 36) as usize)
            .ok_or_else(|| {
                AudioError::Encode(format!(
                    "{} frames x {} channels exceeds the 4 GiB WAV limit",
                    frames, channels
                ))
            })? as u32;

        let block_align = u32::from(channels) * BYTES_PER_SAMPLE as u32;
        if audio.sample_rate.checked_mul(block_align).is_none() {
            return Err(AudioError::Encode(format!(
                "byte rate for {} Hz x {} channels overflows",
                audio.sample_rate, channels
            )));
        }

        Ok(Self {
            channels,
            sample_rate: audio.sample_rate,
            frames,
            data_len,
        })
    }

    fn block_align(&self) -> u16 {
        self.channels * BYTES_PER_SAMPLE as u16
    }

    fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }

    fn write_header(&self, buf: &mut Vec<u8>) {
        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + self.data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt sub-chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&FORMAT_PCM.to_le_bytes());
        buf.extend_from_slice(&self.channels.to_le_bytes());
        buf.extend_from_slice(&self.sample_rate.to_le_bytes());
        buf.extend_from_slice(&self.byte_rate().to_le_bytes());
        buf.extend_from_slice(&self.block_align().to_le_bytes());
        buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

        // data sub-chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&self.data_len.to_le_bytes());
    }
}
