//! File metadata probe
//!
//! The coarse category comes from the file content (magic bytes), not from
//! the extension, so it can disagree with [`mediaconv_core::FileKind`]. Each
//! per-type probe swallows its own failure and leaves its fields empty.

use image::GenericImageView;
use mediaconv_core::kind::dotted_extension;
use mediaconv_core::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::document::pdf;
use crate::traits::blocking;
use crate::video::VideoProbe;

/// Video metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub bitrate: Option<u64>,
    pub framerate: Option<f32>,
}

/// Category detected from content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbedKind {
    Video,
    Audio,
    Image,
    Pdf,
    Document,
    Unknown,
}

impl ProbedKind {
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("video/") {
            ProbedKind::Video
        } else if mime.starts_with("audio/") {
            ProbedKind::Audio
        } else if mime.starts_with("image/") {
            ProbedKind::Image
        } else if mime == "application/pdf" {
            ProbedKind::Pdf
        } else if mime == "application/msword"
            || mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        {
            ProbedKind::Document
        } else {
            ProbedKind::Unknown
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub size_bytes: u64,
    /// Lowercase extension with its dot, empty if none
    pub extension: String,
    pub kind: ProbedKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// `WIDTHxHEIGHT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
}

impl FileInfo {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }
}

pub struct MetadataProbe {
    video: VideoProbe,
}

impl MetadataProbe {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            video: VideoProbe::new(ffprobe_path),
        }
    }

    /// Probe `path`. Only failing to stat the file is an error.
    #[tracing::instrument(skip(self))]
    pub async fn probe(&self, path: &Path) -> Result<FileInfo, ConvertError> {
        let size_bytes = tokio::fs::metadata(path).await?.len();

        let mime_type = {
            let path = path.to_path_buf();
            blocking(move || Ok(infer::get_from_path(&path)?))
                .await
                .ok()
                .flatten()
                .map(|t| t.mime_type().to_string())
        };
        let kind = mime_type
            .as_deref()
            .map(ProbedKind::from_mime)
            .unwrap_or(ProbedKind::Unknown);

        let mut info = FileInfo {
            size_bytes,
            extension: dotted_extension(path),
            kind,
            mime_type,
            duration_secs: None,
            resolution: None,
            fps: None,
            color_mode: None,
            pages: None,
        };

        match kind {
            ProbedKind::Video => match self.video.probe(path).await {
                Ok(meta) => {
                    info.duration_secs = Some(meta.duration);
                    info.resolution = Some(format!("{}x{}", meta.width, meta.height));
                    info.fps = meta.framerate;
                }
                Err(e) => tracing::debug!(error = %e, "Video probe failed"),
            },
            ProbedKind::Image => match image_details(path.to_path_buf()).await {
                Ok((resolution, mode)) => {
                    info.resolution = Some(resolution);
                    info.color_mode = Some(mode);
                }
                Err(e) => tracing::debug!(error = %e, "Image probe failed"),
            },
            ProbedKind::Pdf => match pdf_page_count(path.to_path_buf()).await {
                Ok(pages) => info.pages = Some(pages),
                Err(e) => tracing::debug!(error = %e, "PDF probe failed"),
            },
            ProbedKind::Audio | ProbedKind::Document | ProbedKind::Unknown => {}
        }

        Ok(info)
    }
}

async fn image_details(path: PathBuf) -> Result<(String, String), ConvertError> {
    blocking(move || {
        let img = image::ImageReader::open(&path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| ConvertError::Image(e.to_string()))?;
        let (width, height) = img.dimensions();
        Ok((format!("{}x{}", width, height), color_mode(img.color())))
    })
    .await
}

async fn pdf_page_count(path: PathBuf) -> Result<usize, ConvertError> {
    blocking(move || pdf::page_count(&path)).await
}

/// Short colour mode label (`RGB`, `RGBA`, `L`, ...).
fn color_mode(color: image::ColorType) -> String {
    use image::ColorType;
    match color {
        ColorType::L8 | ColorType::L16 => "L",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "unknown",
    }
    .to_string()
}
