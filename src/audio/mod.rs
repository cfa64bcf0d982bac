// src/audio/mod.rs

pub mod decoder;
pub mod encoder;
pub mod fetch;
pub mod naming;
pub mod trim;
pub mod types;
pub mod worker;

// Re-export commonly used items
pub use decoder::{decode_audio_file, decode_bytes, decode_locator, get_audio_info};
pub use encoder::{encode_wav, quantize_sample, WAV_HEADER_LEN};
pub use fetch::fetch_bytes;
pub use naming::{format_time, trimmed_file_name, trimmed_stem};
pub use trim::{frame_offset, trim_audio};
pub use types::{
    is_supported_mime_type, mime_type_for_extension, AudioInfo, EncodedAudio, SampleBuffer,
    TrimParams, WAV_MIME_TYPE,
};
pub use worker::{encode_wav_off_thread, EncodeWorker};
