//! mediaconv - convert and inspect media files without the bot.
//!
//! Reads the same environment as the bot (FFMPEG_PATH, VIDEO_QUALITY,
//! PROCESS_TIMEOUT_SECS, ...). Logs go to stderr, results to stdout.

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use mediaconv_core::telemetry::{init_tracing, LogFormat};
use mediaconv_core::{Config, FileKind, TargetFormat, TempPaths, VideoQuality};
use mediaconv_processing::{
    ConversionGate, ConversionOutcome, ConversionRequest, Dispatcher, MetadataProbe, Operation,
    ProgressSink,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediaconv", about = "Convert videos, images and documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the kind a file is classified as by its extension
    Classify {
        /// Path to the file
        file: PathBuf,
    },
    /// Inspect a file's content and print its metadata as JSON
    Probe {
        /// Path to the file
        file: PathBuf,
    },
    /// Convert a file to another format
    Convert {
        /// Path to the file to convert
        file: PathBuf,
        /// Target format extension, e.g. mp4, mp3, pdf, docx, txt, png, webp
        #[arg(long, value_parser = TargetFormat::parse)]
        to: TargetFormat,
        /// Video quality: high, medium or low (overrides VIDEO_QUALITY)
        #[arg(long, value_parser = VideoQuality::parse)]
        quality: Option<VideoQuality>,
        /// Directory for the converted file
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Serialize)]
struct ConvertReport {
    input: PathBuf,
    output: PathBuf,
    route: String,
    outcome: ConversionOutcome,
    size_bytes: u64,
}

/// Logs each progress milestone.
struct LogProgress;

#[async_trait]
impl ProgressSink for LogProgress {
    async fn report(&self, percent: u8, status: &str) {
        tracing::info!(percent, "{}", status);
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env())?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { file } => {
            println!("{}", FileKind::from_path(&file));
        }
        Commands::Probe { file } => {
            let config = Config::from_env().context("Failed to load configuration")?;
            let info = MetadataProbe::new(config.ffprobe_path)
                .probe(&file)
                .await
                .with_context(|| format!("Failed to probe {}", file.display()))?;
            print_json(&info)?;
        }
        Commands::Convert {
            file,
            to,
            quality,
            out_dir,
        } => {
            let mut config = Config::from_env().context("Failed to load configuration")?;
            if let Some(quality) = quality {
                config.video_quality = quality;
            }

            let paths = TempPaths::new(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            let dispatcher = Dispatcher::from_config(&config, paths);
            let gate = ConversionGate::from_config(&config);

            let request = ConversionRequest {
                source: FileKind::from_path(&file),
                input: file.clone(),
                operation: Operation::Convert(to),
            };
            let output = gate
                .run(dispatcher.convert(request, &LogProgress))
                .await
                .with_context(|| format!("Failed to convert {} to {}", file.display(), to))?;

            let size_bytes = tokio::fs::metadata(&output.path).await?.len();
            print_json(&ConvertReport {
                input: file,
                route: format!("{:?}", output.route),
                outcome: output.outcome,
                output: output.path,
                size_bytes,
            })?;
        }
    }

    Ok(())
}
