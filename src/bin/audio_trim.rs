// src/bin/audio_trim.rs

use std::path::PathBuf;

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wavetrim_lib::audio::{fetch_bytes, get_audio_info};
use wavetrim_lib::pipeline::{trim_to_wav, ByteSource};
use wavetrim_lib::{TrimConfig, TrimParams};

/// Command-line tool for trimming audio files
#[derive(Parser, Debug)]
#[command(name = "audio-trim")]
#[command(about = "Trim audio to a time range and export it as 16-bit WAV", long_about = None)]
struct Args {
    /// Input audio file or http(s) URL (MP3, FLAC, WAV, OGG, etc.)
    #[arg(short, long)]
    input: String,

    /// Output WAV file [default: <name>_<MM-SS>_<MM-SS>.wav]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Start time in seconds
    #[arg(short, long)]
    start: f64,

    /// End time in seconds
    #[arg(short, long)]
    end: f64,

    /// JSON config file (fetch limits, worker timeout)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show detailed information
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "wavetrim_lib=debug,audio_trim=debug"
    } else {
        "wavetrim_lib=info,audio_trim=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => TrimConfig::from_json_file(path)?,
        None => TrimConfig::default(),
    };

    println!("Audio Trimmer");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Step 1: Load the source once; info and trimming share the bytes
    let started = std::time::Instant::now();
    let bytes = Bytes::from(
        fetch_bytes(&args.input, &config)
            .await
            .with_context(|| format!("could not load {}", args.input))?,
    );

    // Bytes clones share one allocation
    let info = get_audio_info(bytes.clone(), &args.input)?;
    println!("\nInput: {}", args.input);
    println!(
        "   Duration: {:.2} seconds ({:.2} minutes)",
        info.duration_seconds,
        info.duration_seconds / 60.0
    );
    println!("   Sample Rate: {} Hz", info.sample_rate);
    println!("   Channels: {}", info.channels);
    println!("   Format: {}", info.format);
    if let Some(bits) = info.bit_depth {
        println!("   Bit Depth: {}", bits);
    }

    // Step 2: Trim range, checked against the decoded audio by the pipeline
    let params = TrimParams::new(args.start, args.end);
    println!("\nTrim Range:");
    println!("   Start: {:.2}s", params.start_seconds);
    println!("   End: {:.2}s", params.end_seconds);
    println!("   Duration: {:.2}s", params.trim_duration());

    // Step 3: Decode, trim and encode
    println!("\nTrimming...");
    let source = ByteSource::bytes(bytes, args.input.clone());
    let output = match trim_to_wav(source, &params, &config).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(category = ?e.category(), "Trim failed");
            return Err(e.into());
        }
    };

    // Step 4: Write the file
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&output.file_name));
    std::fs::write(&output_path, &output.audio.bytes)
        .with_context(|| format!("could not write {}", output_path.display()))?;

    if args.verbose {
        println!(
            "   Frames: {} x {} channels at {} Hz",
            output.frame_count, output.channel_count, output.sample_rate
        );
        println!("   Size: {} bytes", output.audio.len());
    }

    println!("\nDone! Output saved to: {}", output_path.display());
    println!("   Length: {:.2}s", output.duration_seconds());
    println!("   Total time: {:.2}s", started.elapsed().as_secs_f64());

    Ok(())
}
