//! Video converter - transcoding, audio extraction and compression via ffmpeg

use async_trait::async_trait;
use mediaconv_core::{ConvertError, TargetFormat, VideoQuality};
use std::ffi::OsString;
use std::path::Path;

use crate::route::Route;
use crate::tool;
use crate::traits::{ConversionJob, ConversionOutcome, MediaConverter, ProgressSink};
use crate::video::probe::VideoProbe;

pub struct VideoConverter {
    ffmpeg_path: String,
    quality: VideoQuality,
    probe: VideoProbe,
}

impl VideoConverter {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        ffprobe_path: impl Into<String>,
        quality: VideoQuality,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            quality,
            probe: VideoProbe::new(ffprobe_path),
        }
    }
}

#[async_trait]
impl MediaConverter for VideoConverter {
    async fn convert(
        &self,
        job: &ConversionJob,
        progress: &dyn ProgressSink,
    ) -> Result<ConversionOutcome, ConvertError> {
        tool::validate_path(&job.input)?;
        tool::validate_path(&job.output)?;

        match job.route {
            Route::VideoTranscode(format) => {
                progress.report(10, "Starting conversion...").await;
                self.transcode(&job.input, &job.output, format).await?;
                progress.report(100, "Conversion completed!").await;
            }
            Route::ExtractAudio(format) => {
                progress.report(20, "Extracting audio...").await;
                let args = extract_audio_args(&job.input, &job.output, format)?;
                progress.report(60, "Saving audio file...").await;
                tool::run(&self.ffmpeg_path, args).await?;
                progress.report(100, "Audio extraction completed!").await;
            }
            Route::CompressVideo { target_mb } => {
                progress.report(10, "Analyzing video...").await;
                let metadata = self.probe.probe(&job.input).await?;
                let bitrate_kbps = target_bitrate_kbps(target_mb, metadata.duration)?;
                progress
                    .report(50, &format!("Compressing to {}MB...", target_mb))
                    .await;
                tool::run(
                    &self.ffmpeg_path,
                    compress_args(&job.input, &job.output, bitrate_kbps),
                )
                .await?;
                progress.report(100, "Compression completed!").await;
            }
            other => {
                return Err(ConvertError::unsupported(
                    job.input.display().to_string(),
                    format!("{:?}", other),
                ))
            }
        }

        Ok(ConversionOutcome::Converted)
    }

    fn supports(&self, route: &Route) -> bool {
        matches!(
            route,
            Route::VideoTranscode(_) | Route::ExtractAudio(_) | Route::CompressVideo { .. }
        )
    }
}

impl VideoConverter {
    /// Transcode with the quality preset; if ffmpeg rejects that invocation,
    /// retry once with a plain re-encode at a fixed bitrate.
    #[tracing::instrument(skip(self), fields(ffmpeg.operation = "transcode"))]
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        format: TargetFormat,
    ) -> Result<(), ConvertError> {
        let start = std::time::Instant::now();

        let primary = transcode_args(input, output, format, self.quality);
        if let Err(e) = tool::run(&self.ffmpeg_path, primary).await {
            tracing::warn!(error = %e, "Preset transcode failed, retrying with plain re-encode");
            let fallback = fallback_args(input, output, self.quality);
            tool::run(&self.ffmpeg_path, fallback).await?;
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            "Video transcode completed"
        );
        Ok(())
    }
}

fn transcode_args(
    input: &Path,
    output: &Path,
    format: TargetFormat,
    quality: VideoQuality,
) -> Vec<OsString> {
    let vcodec = match format {
        TargetFormat::Mp4 | TargetFormat::Mkv => "libx264",
        _ => "copy",
    };
    vec![
        "-y".into(),
        "-i".into(),
        input.into(),
        "-crf".into(),
        quality.crf().into(),
        "-preset".into(),
        quality.preset().into(),
        "-c:v".into(),
        vcodec.into(),
        "-c:a".into(),
        "aac".into(),
        output.into(),
    ]
}

/// Let ffmpeg pick codecs for the container; only the bitrate is fixed.
fn fallback_args(input: &Path, output: &Path, quality: VideoQuality) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        input.into(),
        "-b:v".into(),
        quality.fallback_bitrate().into(),
        output.into(),
    ]
}

fn extract_audio_args(
    input: &Path,
    output: &Path,
    format: TargetFormat,
) -> Result<Vec<OsString>, ConvertError> {
    let (codec, muxer) = match format {
        TargetFormat::Mp3 => ("libmp3lame", "mp3"),
        TargetFormat::Aac => ("aac", "adts"),
        TargetFormat::Wav => ("pcm_s16le", "wav"),
        TargetFormat::Ogg => ("libvorbis", "ogg"),
        TargetFormat::Flac => ("flac", "flac"),
        other => return Err(ConvertError::unsupported("video", other.to_string())),
    };
    Ok(vec![
        "-y".into(),
        "-i".into(),
        input.into(),
        "-vn".into(),
        "-acodec".into(),
        codec.into(),
        "-f".into(),
        muxer.into(),
        output.into(),
    ])
}

fn compress_args(input: &Path, output: &Path, bitrate_kbps: u64) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        input.into(),
        "-b:v".into(),
        format!("{}k", bitrate_kbps).into(),
        "-c:a".into(),
        "aac".into(),
        output.into(),
    ]
}

/// Bitrate that fits `target_mb` megabytes into `duration_secs` seconds.
fn target_bitrate_kbps(target_mb: u32, duration_secs: f64) -> Result<u64, ConvertError> {
    if duration_secs.is_nan() || duration_secs <= 0.0 {
        return Err(ConvertError::tool(
            "ffprobe",
            "Video has no usable duration",
        ));
    }
    let kbps = (f64::from(target_mb) * 8192.0 / duration_secs).floor() as u64;
    Ok(kbps.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_transcode_args_mp4_uses_x264() {
        let args = transcode_args(
            Path::new("/t/in.mov"),
            Path::new("/t/out.mp4"),
            TargetFormat::Mp4,
            VideoQuality::High,
        );
        let args = strings(&args);
        assert_eq!(
            args,
            vec![
                "-y", "-i", "/t/in.mov", "-crf", "23", "-preset", "medium", "-c:v", "libx264",
                "-c:a", "aac", "/t/out.mp4"
            ]
        );
    }

    #[test]
    fn test_transcode_args_other_containers_copy_video() {
        let args = strings(&transcode_args(
            Path::new("in.mp4"),
            Path::new("out.avi"),
            TargetFormat::Avi,
            VideoQuality::Low,
        ));
        let pos = args.iter().position(|a| a == "-c:v").unwrap();
        assert_eq!(args[pos + 1], "copy");
        assert!(args.contains(&"veryfast".to_string()));
    }

    #[test]
    fn test_fallback_args() {
        let args = strings(&fallback_args(
            Path::new("in.mp4"),
            Path::new("out.webm"),
            VideoQuality::Medium,
        ));
        assert_eq!(args, vec!["-y", "-i", "in.mp4", "-b:v", "500k", "out.webm"]);
    }

    #[test]
    fn test_extract_audio_args() {
        let args = strings(
            &extract_audio_args(Path::new("in.mp4"), Path::new("out.aac"), TargetFormat::Aac)
                .unwrap(),
        );
        assert!(args.windows(2).any(|w| w[0] == "-acodec" && w[1] == "aac"));
        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "adts"));
        assert!(args.contains(&"-vn".to_string()));

        assert!(
            extract_audio_args(Path::new("in.mp4"), Path::new("out.pdf"), TargetFormat::Pdf)
                .is_err()
        );
    }

    #[test]
    fn test_compress_args() {
        let args = strings(&compress_args(
            Path::new("in.mp4"),
            Path::new("out.mp4"),
            1024,
        ));
        assert_eq!(
            args,
            vec!["-y", "-i", "in.mp4", "-b:v", "1024k", "-c:a", "aac", "out.mp4"]
        );
    }

    #[test]
    fn test_target_bitrate() {
        // 10 MB over 80 s -> 1024 kbps
        assert_eq!(target_bitrate_kbps(10, 80.0).unwrap(), 1024);
        assert!(target_bitrate_kbps(10, 0.0).is_err());
        assert!(target_bitrate_kbps(10, f64::NAN).is_err());
        assert_eq!(target_bitrate_kbps(1, 1_000_000.0).unwrap(), 1);
    }

    #[test]
    fn test_supports() {
        let converter = VideoConverter::new("ffmpeg", "ffprobe", VideoQuality::High);
        let transcode = Route::VideoTranscode(TargetFormat::Mkv);
        assert!(converter.supports(&transcode));
        assert!(converter.supports(&Route::CompressVideo { target_mb: 5 }));
        assert!(!converter.supports(&Route::ImageToPdf));
    }

    #[tokio::test]
    async fn test_rejects_foreign_route() {
        let converter = VideoConverter::new("ffmpeg", "ffprobe", VideoQuality::High);
        let job = ConversionJob::new("/tmp/in.pdf", "/tmp/out.docx", Route::PdfToDocx);
        let err = converter
            .convert(&job, &crate::traits::NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Unsupported { .. }));
    }
}
