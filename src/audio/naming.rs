// src/audio/naming.rs

/// Extension of every file this crate writes
pub const OUTPUT_EXTENSION: &str = "wav";

/// Format seconds as `MM:SS`
///
/// Negative and non-finite inputs format as `00:00`. Minutes keep growing
/// past 59 rather than rolling into hours.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }

    let whole = seconds.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Default file name for a trimmed export
///
/// `{stem}_{MM-SS}_{MM-SS}.wav`, where the stem is everything before the
/// first `.` of the source's file name.
///
/// ```
/// use wavetrim_lib::audio::trimmed_file_name;
///
/// assert_eq!(trimmed_file_name("interview.mp3", 65.0, 130.5), "interview_01-05_02-10.wav");
/// ```
pub fn trimmed_file_name(source_name: &str, start_seconds: f64, end_seconds: f64) -> String {
    format!(
        "{}.{}",
        trimmed_stem(source_name, start_seconds, end_seconds),
        OUTPUT_EXTENSION
    )
}

/// [`trimmed_file_name`] without the extension
pub fn trimmed_stem(source_name: &str, start_seconds: f64, end_seconds: f64) -> String {
    format!(
        "{}_{}_{}",
        source_stem(source_name),
        format_time(start_seconds).replace(':', "-"),
        format_time(end_seconds).replace(':', "-")
    )
}

/// Text before the first `.` of the last path or URL segment
fn source_stem(source_name: &str) -> &str {
    let without_query = source_name.split(['?', '#']).next().unwrap_or(source_name);
    let file_name = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_query);

    match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem,
        _ => "audio",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(7.9), "00:07");
        assert_eq!(format_time(61.0), "01:01");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(-3.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
    }

    #[test]
    fn test_trimmed_file_name() {
        assert_eq!(trimmed_file_name("song.mp3", 2.5, 7.5), "song_00-02_00-07.wav");
        assert_eq!(trimmed_file_name("live.set.flac", 0.0, 90.0), "live_00-00_01-30.wav");
        assert_eq!(
            trimmed_file_name("/music/takes/voice.ogg", 10.0, 20.0),
            "voice_00-10_00-20.wav"
        );
        assert_eq!(
            trimmed_file_name("https://cdn.example/a/b/clip.wav?sig=1", 1.0, 2.0),
            "clip_00-01_00-02.wav"
        );
    }

    #[test]
    fn test_unnamed_source_gets_fallback_stem() {
        assert_eq!(trimmed_file_name(".wav", 0.0, 1.0), "audio_00-00_00-01.wav");
        assert_eq!(trimmed_file_name("", 0.0, 1.0), "audio_00-00_00-01.wav");
        assert_eq!(trimmed_stem("dir/", 0.0, 1.0), "audio_00-00_00-01");
    }
}
