// src/audio/decoder.rs

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{CodecType, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use crate::audio::fetch::fetch_bytes;
use crate::audio::types::{AudioInfo, SampleBuffer};
use crate::config::TrimConfig;
use crate::error::{AudioError, Result};

/// Decodes an in-memory audio container to planar PCM samples
///
/// Supports: MP3, FLAC, WAV, OGG Vorbis, AAC, and more via symphonia.
/// `source_id` names the input in errors and logs; its extension, if any,
/// is passed to the prober as a hint.
///
/// Decoding is all-or-nothing: a corrupt packet fails the whole call, and so
/// does a PCM or FLAC stream that ends before the frame count its header
/// declares.
///
/// # Example
/// ```no_run
/// use wavetrim_lib::audio::decode_bytes;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("sermon.mp3")?;
/// let audio = decode_bytes(bytes, "sermon.mp3")?;
/// println!("Loaded {} seconds of audio", audio.duration_seconds());
/// println!("Sample rate: {} Hz", audio.sample_rate);
/// println!("Channels: {}", audio.channel_count());
/// # Ok(())
/// # }
/// ```
pub fn decode_bytes<B>(bytes: B, source_id: &str) -> Result<SampleBuffer>
where
    B: AsRef<[u8]> + Send + Sync + 'static,
{
    let fail = |reason: String| AudioError::Decode {
        source_id: source_id.to_string(),
        reason,
    };

    let byte_len = bytes.as_ref().len();
    let mut format = open_format(bytes, source_id)?;

    // Find the default audio track (skip video/subtitle tracks)
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| fail("no audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|&rate| rate > 0)
        .ok_or_else(|| fail("sample rate not found".to_string()))?;

    let declared_frames = track
        .codec_params
        .n_frames
        .filter(|_| declares_exact_length(track.codec_params.codec));

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| fail(format!("failed to create decoder: {}", e)))?;

    // Channel layout comes from the first decoded packet; some MP3s do not
    // declare it in the track metadata
    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(fail(format!("failed to read packet: {}", e))),
        };

        // Skip packets from other tracks (e.g., video, album art)
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| fail(format!("decode error: {}", e)))?;

        let packet_channels = decoded.spec().channels.count();
        if channels.is_empty() {
            if packet_channels == 0 {
                return Err(fail("stream has no channels".to_string()));
            }
            channels = vec![Vec::new(); packet_channels];
        } else if packet_channels != channels.len() {
            return Err(fail(format!(
                "channel count changed mid-stream from {} to {}",
                channels.len(),
                packet_channels
            )));
        }

        append_planar(&decoded, &mut channels);
    }

    let audio = SampleBuffer::new(sample_rate, channels);
    if audio.frame_count() == 0 {
        return Err(fail("no audio samples decoded".to_string()));
    }
    if let Some(expected) = declared_frames {
        if (audio.frame_count() as u64) < expected {
            return Err(fail(format!(
                "stream ended after {} of {} frames",
                audio.frame_count(),
                expected
            )));
        }
    }

    tracing::debug!(
        source = source_id,
        bytes = byte_len,
        sample_rate,
        channels = audio.channel_count(),
        frames = audio.frame_count(),
        "Decoded audio"
    );

    Ok(audio)
}

/// Decodes an audio file from disk
///
/// Reads the whole file and hands it to [`decode_bytes`], so the result is
/// identical to decoding the same bytes from memory.
pub fn decode_audio_file<P: AsRef<Path>>(path: P) -> Result<SampleBuffer> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().to_string();

    let bytes = std::fs::read(path).map_err(|e| AudioError::FileOpen {
        path: path_str.clone(),
        source: e,
    })?;

    decode_bytes(bytes, &path_str)
}

/// Retrieves the bytes behind a URL or path, then decodes them like
/// [`decode_bytes`]
pub async fn decode_locator(locator: &str, config: &TrimConfig) -> Result<SampleBuffer> {
    let bytes = fetch_bytes(locator, config).await?;
    decode_bytes(bytes, locator)
}

/// Get audio metadata without decoding all samples
///
/// Much faster than [`decode_bytes`] for just getting duration/info.
/// Duration and channel count are 0 when the container does not declare them.
///
/// Takes anything that derefs to bytes, so a cheaply cloned
/// [`bytes::Bytes`] can be probed without copying the source.
pub fn get_audio_info<B>(bytes: B, source_id: &str) -> Result<AudioInfo>
where
    B: AsRef<[u8]> + Send + Sync + 'static,
{
    let format = open_format(bytes, source_id)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode {
            source_id: source_id.to_string(),
            reason: "no audio track found".to_string(),
        })?;

    let params = &track.codec_params;
    let sample_rate = params.sample_rate.unwrap_or(0);
    let channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);

    // Calculate duration from frame count
    let duration_seconds = match (params.n_frames, params.sample_rate) {
        (Some(n_frames), Some(sr)) if sr > 0 => n_frames as f64 / sr as f64,
        _ => 0.0,
    };

    let format_name = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|descriptor| descriptor.short_name.to_string())
        .unwrap_or_else(|| format!("{:?}", params.codec));

    Ok(AudioInfo {
        duration_seconds,
        sample_rate,
        channels,
        format: format_name,
        bit_depth: params.bits_per_sample.map(|b| b as u16),
    })
}

/// Probe an in-memory container and return its format reader
fn open_format<B>(bytes: B, source_id: &str) -> Result<Box<dyn FormatReader>>
where
    B: AsRef<[u8]> + Send + Sync + 'static,
{
    if bytes.as_ref().is_empty() {
        return Err(AudioError::Decode {
            source_id: source_id.to_string(),
            reason: "input is empty".to_string(),
        });
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension_hint(source_id) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::Decode {
            source_id: source_id.to_string(),
            reason: format!("unrecognised container: {}", e),
        })?;

    Ok(probed.format)
}

/// Whether the codec's declared frame count is exact. Lossy codecs count
/// encoder delay and padding, so their totals are only estimates.
fn declares_exact_length(codec: CodecType) -> bool {
    symphonia::default::get_codecs()
        .get_codec(codec)
        .is_some_and(|descriptor| {
            descriptor.short_name.starts_with("pcm_") || descriptor.short_name == "flac"
        })
}

/// File extension of a path or URL, ignoring any query or fragment
fn extension_hint(source_id: &str) -> Option<&str> {
    let without_query = source_id.split(['?', '#']).next().unwrap_or(source_id);
    let file_name = without_query.rsplit(['/', '\\']).next()?;
    let (stem, extension) = file_name.rsplit_once('.')?;

    if stem.is_empty() || extension.is_empty() {
        None
    } else {
        Some(extension)
    }
}

/// Append one decoded packet to the per-channel vectors as f32
///
/// Integer formats are scaled into [-1.0, 1.0)
fn append_planar(buffer: &AudioBufferRef<'_>, output: &mut [Vec<f32>]) {
    match buffer {
        AudioBufferRef::F32(buf) => append_planes(buf, output, |s| s),
        AudioBufferRef::F64(buf) => append_planes(buf, output, |s| s as f32),

        // Signed integers
        AudioBufferRef::S8(buf) => append_planes(buf, output, |s| s as f32 / 128.0),
        AudioBufferRef::S16(buf) => append_planes(buf, output, |s| s as f32 / 32768.0),
        AudioBufferRef::S24(buf) => append_planes(buf, output, |s| s.inner() as f32 / 8388608.0),
        AudioBufferRef::S32(buf) => append_planes(buf, output, |s| s as f32 / 2147483648.0),

        // Unsigned integers are offset by half their range
        AudioBufferRef::U8(buf) => append_planes(buf, output, |s| (s as f32 - 128.0) / 128.0),
        AudioBufferRef::U16(buf) => {
            append_planes(buf, output, |s| (s as f32 - 32768.0) / 32768.0)
        }
        AudioBufferRef::U24(buf) => append_planes(buf, output, |s| {
            (s.inner() as f32 - 8388608.0) / 8388608.0
        }),
        AudioBufferRef::U32(buf) => append_planes(buf, output, |s| {
            ((s as f64 - 2147483648.0) / 2147483648.0) as f32
        }),
    }
}

fn append_planes<S, F>(buf: &AudioBuffer<S>, output: &mut [Vec<f32>], to_f32: F)
where
    S: Sample,
    F: Fn(S) -> f32,
{
    let frames = buf.frames();
    for (channel, dst) in output.iter_mut().enumerate() {
        dst.extend(buf.chan(channel)[..frames].iter().map(|&s| to_f32(s)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encoder::encode_wav;
    use hound::{SampleFormat, WavSpec, WavWriter};

    /// Write a 16-bit WAV with hound so the decoder is checked against an
    /// independent writer
    fn hound_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_deinterleaves_channels() {
        let bytes = hound_wav(8000, 2, &[16384, -16384, 0, 8192, -32768, 32767]);

        let audio = decode_bytes(bytes, "stereo.wav").unwrap();

        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.channel_count(), 2);
        assert_eq!(audio.frame_count(), 3);
        assert_eq!(audio.channels[0], vec![0.5, 0.0, -1.0]);
        assert_eq!(audio.channels[1], vec![-0.5, 0.25, 32767.0 / 32768.0]);
    }

    #[test]
    fn test_decode_without_hint() {
        let bytes = hound_wav(44100, 1, &[0; 441]);

        let audio = decode_bytes(bytes, "upload").unwrap();

        assert_eq!(audio.frame_count(), 441);
        assert_eq!(audio.duration_seconds(), 0.01);
    }

    #[test]
    fn test_decode_own_encoder_output() {
        let source = SampleBuffer::new(22050, vec![vec![0.5, -0.5, 0.0, 1.0]]);
        let wav = encode_wav(&source).unwrap();

        let audio = decode_bytes(wav.into_bytes(), "roundtrip.wav").unwrap();

        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels[0].len(), 4);
        assert_eq!(audio.channels[0][1], -0.5);
    }

    #[test]
    fn test_empty_input_is_decode_error() {
        match decode_bytes(Vec::new(), "empty.wav") {
            Err(AudioError::Decode { source_id, .. }) => assert_eq!(source_id, "empty.wav"),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let bytes = b"definitely not an audio container".repeat(64);

        let result = decode_bytes(bytes, "notes.txt");
        assert!(matches!(result, Err(AudioError::Decode { .. })));
    }

    #[test]
    fn test_header_without_samples_is_decode_error() {
        let bytes = hound_wav(8000, 1, &[]);

        let result = decode_bytes(bytes, "silent.wav");
        assert!(matches!(result, Err(AudioError::Decode { .. })));
    }

    #[test]
    fn test_truncated_stream_is_decode_error() {
        let source = SampleBuffer::silent(8000, 1, 8000);
        let mut bytes = encode_wav(&source).unwrap().into_bytes();
        bytes.truncate(44 + 1000);

        match decode_bytes(bytes, "cut.wav") {
            Err(AudioError::Decode { reason, .. }) => {
                assert!(reason.contains("500 of 8000"), "reason: {}", reason)
            }
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_info_from_shared_bytes() {
        let bytes = bytes::Bytes::from(hound_wav(8000, 1, &[0; 800]));

        let info = get_audio_info(bytes.clone(), "shared.wav").unwrap();
        let audio = decode_bytes(bytes, "shared.wav").unwrap();

        assert_eq!(info.sample_rate, 8000);
        assert_eq!(audio.frame_count(), 800);
    }

    #[test]
    fn test_file_and_memory_paths_agree() {
        let bytes = hound_wav(16000, 2, &[1000, -1000, 2000, -2000]);
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        std::io::Write::write_all(&mut file, &bytes).unwrap();

        let from_file = decode_audio_file(file.path()).unwrap();
        let from_memory = decode_bytes(bytes, "memory.wav").unwrap();

        assert_eq!(from_file, from_memory);
    }

    #[test]
    fn test_missing_file() {
        let result = decode_audio_file("/definitely/not/here.mp3");
        assert!(matches!(result, Err(AudioError::FileOpen { .. })));
    }

    #[test]
    fn test_audio_info() {
        let bytes = hound_wav(48000, 2, &[0; 9600]);

        let info = get_audio_info(bytes, "info.wav").unwrap();

        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.channels, 2);
        assert!((info.duration_seconds - 0.1).abs() < 1e-9);
        assert_eq!(info.bit_depth, Some(16));
    }

    #[test]
    fn test_extension_hint() {
        assert_eq!(extension_hint("song.mp3"), Some("mp3"));
        assert_eq!(extension_hint("/tmp/a.b/take.flac"), Some("flac"));
        assert_eq!(extension_hint("https://cdn.example/x/clip.ogg?sig=abc"), Some("ogg"));
        assert_eq!(extension_hint("upload"), None);
        assert_eq!(extension_hint(".hidden"), None);
    }
}
