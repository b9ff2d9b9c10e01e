//! Video probe - metadata extraction through ffprobe

use mediaconv_core::ConvertError;
use std::ffi::OsString;
use std::path::Path;

use crate::metadata::VideoMetadata;
use crate::tool;

#[derive(Debug, Clone)]
pub struct VideoProbe {
    ffprobe_path: String,
}

impl VideoProbe {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Extract metadata of the first video stream.
    #[tracing::instrument(skip(self), fields(
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe(&self, video_path: &Path) -> Result<VideoMetadata, ConvertError> {
        let start = std::time::Instant::now();
        tool::validate_path(video_path)?;

        let args: Vec<OsString> = vec![
            "-v".into(),
            "quiet".into(),
            "-print_format".into(),
            "json".into(),
            "-show_format".into(),
            "-show_streams".into(),
            "-select_streams".into(),
            "v:0".into(),
            video_path.into(),
        ];
        let stdout = tool::run(&self.ffprobe_path, args).await?;

        let probe_data: serde_json::Value = serde_json::from_slice(&stdout).map_err(|e| {
            ConvertError::tool("ffprobe", format!("Failed to parse output: {}", e))
        })?;
        let metadata = parse_probe_output(&probe_data)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            video_duration = metadata.duration,
            width = metadata.width,
            height = metadata.height,
            codec = %metadata.codec,
            "Video probe completed"
        );
        Ok(metadata)
    }
}

pub(crate) fn parse_probe_output(
    probe_data: &serde_json::Value,
) -> Result<VideoMetadata, ConvertError> {
    let stream = probe_data["streams"]
        .get(0)
        .ok_or_else(|| ConvertError::tool("ffprobe", "No video stream found"))?;
    let format = &probe_data["format"];

    let duration = format["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| ConvertError::tool("ffprobe", "Could not parse duration"))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| ConvertError::tool("ffprobe", "Could not parse width"))? as u32;

    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| ConvertError::tool("ffprobe", "Could not parse height"))? as u32;

    let codec = stream["codec_name"]
        .as_str()
        .unwrap_or("unknown")
        .to_string();

    let bitrate = format["bit_rate"]
        .as_str()
        .and_then(|b| b.parse::<u64>().ok());

    let framerate = stream["r_frame_rate"].as_str().and_then(parse_frame_rate);

    Ok(VideoMetadata {
        duration,
        width,
        height,
        codec,
        bitrate,
        framerate,
    })
}

/// ffprobe reports rates as a fraction, e.g. `30000/1001`.
fn parse_frame_rate(r: &str) -> Option<f32> {
    let (num, den) = r.split_once('/')?;
    let num: f32 = num.parse().ok()?;
    let den: f32 = den.parse().ok()?;
    if den != 0.0 {
        Some(num / den)
    } else {
        None
    }
}
