#![deny(warnings)]

use anyhow::Context;
use audio_emotion_core::audio::{AudioLoader, FfmpegAudioLoader};
use audio_emotion_core::classify::{Emotion, ProsodyFrameClassifier};
use audio_emotion_core::config::{
    ChunkingConfig, DEFAULT_CHUNK_DURATION_SECS, DEFAULT_OVERLAP, DEFAULT_TARGET_SAMPLE_RATE,
    DEFAULT_TOP_DB,
};
use audio_emotion_core::pipeline::EmotionPipeline;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Whole-file single-shot classification.
    Single,
    /// Chunked pipeline: verdict, timeline and objective metrics.
    Long,
    /// Chunked pipeline plus audio metrics and interpretation.
    Complete,
}

#[derive(Parser, Debug)]
#[command(name = "audio-emotion")]
#[command(about = "Long-audio emotion analysis (segment -> classify -> aggregate)")]
struct Args {
    /// Audio file to analyze (any ffmpeg-readable format).
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "complete")]
    mode: Mode,

    /// Trim silent intervals before windowing.
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    remove_silence: bool,

    #[arg(long, default_value_t = DEFAULT_CHUNK_DURATION_SECS)]
    chunk_duration_secs: f32,

    #[arg(long, default_value_t = DEFAULT_OVERLAP)]
    overlap: f32,

    /// Silence threshold in dB below the signal peak.
    #[arg(long, default_value_t = DEFAULT_TOP_DB)]
    top_db: f32,

    #[arg(long, default_value_t = DEFAULT_TARGET_SAMPLE_RATE)]
    sample_rate: u32,

    /// Print the emotion vocabulary and exit.
    #[arg(long)]
    list_emotions: bool,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    if args.list_emotions {
        let emotions: Vec<&str> = Emotion::ALL.iter().map(|e| e.as_str()).collect();
        print_json(
            &serde_json::json!({ "emotions": emotions, "count": emotions.len() }),
            args.pretty,
        )?;
        return Ok(());
    }

    let input = args
        .input
        .clone()
        .context("an input audio file is required unless --list-emotions is given")?;

    let config = ChunkingConfig::new(args.chunk_duration_secs, args.overlap, args.top_db)?;

    tracing::info!(
        input = %input.display(),
        mode = ?args.mode,
        chunk_duration_secs = args.chunk_duration_secs,
        overlap = args.overlap,
        "starting analysis"
    );

    let loader = FfmpegAudioLoader::new();
    let waveform = loader
        .load(input.clone(), args.sample_rate)
        .await
        .with_context(|| format!("failed to load {}", input.display()))?;

    let pipeline = EmotionPipeline::new(ProsodyFrameClassifier::new(), config);

    match args.mode {
        Mode::Single => {
            let result = pipeline.analyze_single(&waveform).await?;
            print_json(&result, args.pretty)?;
        }
        Mode::Long => {
            let report = pipeline.analyze_long(&waveform, args.remove_silence).await?;
            print_json(&report, args.pretty)?;
        }
        Mode::Complete => {
            let report = pipeline
                .analyze_complete(&waveform, args.remove_silence)
                .await?;
            print_json(&report, args.pretty)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
