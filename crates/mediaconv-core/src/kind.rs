//! Extension-based file classification.
//!
//! Classification only looks at the file name. Content sniffing lives in the
//! metadata probe and may disagree with what is returned here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".avi", ".mov", ".mkv", ".wmv", ".flv", ".webm", ".m4v",
];
pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".aac", ".m4a", ".ogg", ".flac"];
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".bmp", ".gif", ".tiff", ".webp"];
pub const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx", ".txt", ".rtf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Video,
    Audio,
    Image,
    Document,
    Unknown,
}

impl FileKind {
    /// Classify a file name by its extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Self {
        let ext = dotted_extension(Path::new(filename));
        Self::from_extension(&ext)
    }

    pub fn from_path(path: &Path) -> Self {
        Self::from_extension(&dotted_extension(path))
    }

    /// `ext` must include the leading dot and be lowercase, e.g. `".mp4"`.
    pub fn from_extension(ext: &str) -> Self {
        if VIDEO_EXTENSIONS.contains(&ext) {
            FileKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            FileKind::Audio
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            FileKind::Image
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            FileKind::Document
        } else {
            FileKind::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Image => "image",
            FileKind::Document => "document",
            FileKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase extension with its leading dot, or an empty string when the
/// path has none.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}
